use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cli_validator::{CommandSetItem, CommandSetReport, ValidateOptions, Validator};
use cli_validator_core::{ScriptValidationItem, ValidationResult};
use cli_validator_db::{MetadataStore, ValidatorConfig};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "cli-validate")]
#[command(about = "Validate Azure CLI commands, parameter keys and scripts against command metadata")]
#[command(version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Metadata directory (overrides the configuration).
    #[arg(long, global = true)]
    metadata_dir: Option<PathBuf>,
    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    format: CliOutputFormat,
    /// Log more (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate one full command line.
    Command(CommandArgs),
    /// Validate a command signature and the option names used with it.
    Keys(KeysArgs),
    /// Validate every `az` invocation in one or more shell scripts.
    Script(ScriptArgs),
    /// Validate a JSON command set of signatures, option names and examples.
    CommandSet(CommandSetArgs),
}

#[derive(Debug, Args)]
struct PolicyArgs {
    /// Require `--yes` on commands that ask for confirmation.
    #[arg(long)]
    non_interactive: bool,
    /// Accept help requests instead of reporting them as invalid.
    #[arg(long)]
    allow_help: bool,
}

#[derive(Debug, Args)]
struct CommandArgs {
    /// The command line, e.g. "az vm list -g rg".
    text: String,
    /// Treat `$var` and `<NAME>` values literally.
    #[arg(long)]
    no_placeholder: bool,
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Debug, Args)]
struct KeysArgs {
    /// Command signature, e.g. "az vm create".
    #[arg(long)]
    signature: String,
    /// Option names used with the signature.
    #[arg(allow_hyphen_values = true)]
    keys: Vec<String>,
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Debug, Args)]
struct ScriptArgs {
    /// Script files; `-` reads stdin.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Debug, Args)]
struct CommandSetArgs {
    /// JSON file holding a list of command-set entries.
    input: PathBuf,
    #[command(flatten)]
    policy: PolicyArgs,
}

/// Validation results for one script file.
#[derive(Debug, Serialize)]
struct ScriptReport {
    file: String,
    items: Vec<ScriptValidationItem>,
}

/// Everything a subcommand needs once configuration is resolved.
struct Context {
    validator: Validator<MetadataStore>,
    defaults: ValidateOptions,
    pool: rayon::ThreadPool,
    format: CliOutputFormat,
}

impl Context {
    fn options(&self, policy: &PolicyArgs) -> ValidateOptions {
        ValidateOptions {
            non_interactive: self.defaults.non_interactive || policy.non_interactive,
            reject_help: self.defaults.reject_help && !policy.allow_help,
            ..self.defaults
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = build_context(&cli).and_then(|ctx| match cli.command {
        Command::Command(args) => run_command(&ctx, args),
        Command::Keys(args) => run_keys(&ctx, args),
        Command::Script(args) => run_script(&ctx, args),
        Command::CommandSet(args) => run_command_set(&ctx, args),
    });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_context(cli: &Cli) -> Result<Context, String> {
    let mut config = match &cli.config {
        Some(path) => ValidatorConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    if let Some(dir) = &cli.metadata_dir {
        config.metadata_dir = dir.clone();
    }
    debug!(?config, "Resolved configuration");

    let store = MetadataStore::from_config(&config).map_err(|err| {
        format!(
            "Failed to open metadata directory '{}': {err}",
            config.metadata_dir.display()
        )
    })?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = config.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    Ok(Context {
        validator: Validator::new(store),
        defaults: config.defaults,
        pool,
        format: cli.format,
    })
}

fn run_command(ctx: &Context, args: CommandArgs) -> Result<bool, String> {
    let options = ValidateOptions {
        placeholder: ctx.defaults.placeholder && !args.no_placeholder,
        ..ctx.options(&args.policy)
    };
    let result = ctx.validator.validate_command(&args.text, options);
    print_result(ctx.format, &result)?;
    Ok(result.is_valid)
}

fn run_keys(ctx: &Context, args: KeysArgs) -> Result<bool, String> {
    let result =
        ctx.validator
            .validate_signature_and_keys(&args.signature, &args.keys, ctx.options(&args.policy));
    print_result(ctx.format, &result)?;
    Ok(result.is_valid)
}

fn run_script(ctx: &Context, args: ScriptArgs) -> Result<bool, String> {
    let scripts = args
        .inputs
        .iter()
        .map(|path| Ok((path.display().to_string(), read_input(path)?)))
        .collect::<Result<Vec<_>, String>>()?;

    let options = ctx.options(&args.policy);
    let reports: Vec<ScriptReport> = ctx.pool.install(|| {
        scripts
            .par_iter()
            .map(|(file, script)| ScriptReport {
                file: file.clone(),
                items: ctx.validator.validate_script(script, options),
            })
            .collect()
    });

    match ctx.format {
        CliOutputFormat::Json => print_json(&reports)?,
        CliOutputFormat::Text => {
            for report in &reports {
                for item in &report.items {
                    println!(
                        "{}:{}:{}: {}",
                        report.file,
                        item.line + 1,
                        item.col + 1,
                        describe(&item.result)
                    );
                }
            }
        }
    }

    let total: usize = reports.iter().map(|r| r.items.len()).sum();
    let invalid = reports
        .iter()
        .flat_map(|r| &r.items)
        .filter(|item| !item.result.is_valid)
        .count();
    if ctx.format == CliOutputFormat::Text {
        eprintln!("Checked {total} command(s) in {} script(s), {invalid} invalid.", reports.len());
    }
    Ok(invalid == 0)
}

fn run_command_set(ctx: &Context, args: CommandSetArgs) -> Result<bool, String> {
    let raw = read_input(&args.input)?;
    let items: Vec<CommandSetItem> = serde_json::from_str(&raw)
        .map_err(|err| format!("Failed to parse '{}': {err}", args.input.display()))?;

    let options = ctx.options(&args.policy);
    let report = ctx
        .pool
        .install(|| ctx.validator.validate_command_set(&items, options));

    match ctx.format {
        CliOutputFormat::Json => print_json(&report)?,
        CliOutputFormat::Text => print_command_set(&report),
    }
    Ok(report.is_valid())
}

fn print_command_set(report: &CommandSetReport) {
    for (idx, item) in report.items.iter().enumerate() {
        let label = item
            .item
            .command
            .as_deref()
            .or(item.item.example.as_deref())
            .unwrap_or("<empty>");
        println!("[{idx}] {label}");
        if let Some(result) = &item.result {
            println!("    signature: {}", describe(result));
        }
        if let Some(result) = &item.example_result {
            println!("    example:   {}", describe(result));
        }
    }
    println!(
        "{} item(s), {} signature failure(s), {} example failure(s).",
        report.items.len(),
        report.errors.len(),
        report.example_errors.len()
    );
}

fn print_result(format: CliOutputFormat, result: &ValidationResult) -> Result<(), String> {
    match format {
        CliOutputFormat::Json => print_json(result),
        CliOutputFormat::Text => {
            println!("{}", describe(result));
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to serialize results: {err}"))?;
    println!("{raw}");
    Ok(())
}

/// One-line verdict, noting when parameters went unchecked.
fn describe(result: &ValidationResult) -> String {
    if result.is_valid && !result.validated_param {
        format!("{result} Parameters were not checked.")
    } else {
        result.to_string()
    }
}

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("Failed to read stdin: {err}"))?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}
