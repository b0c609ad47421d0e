//! Extraction of CLI invocations from shell scripts.
//!
//! A script is read one logical line at a time (a trailing `\` joins the next
//! physical line). The words of a logical line form one outer invocation.
//! Command substitutions opened by a word like `$(`, `x=$(` or `(` start a
//! nested invocation that ends at the matching `)`. While a group is open,
//! each following word is folded into the last token of every enclosing
//! group, so the outer invocation sees the whole `$(...)` as a single value
//! whose span covers the exact source text.
//!
//! Nested invocations are yielded as soon as they close, before the outer
//! invocation of their line.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ScriptParseError;
use crate::lexer::split_words;
use crate::token::{LineIndex, Token};
use crate::tree::ROOT_COMMAND;

static GROUP_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_=$\-]*\(").expect("static regex must compile"));

static GROUP_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\);*)+$").expect("static regex must compile"));

/// The tokens of one invocation found in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Tokens in source order; never empty.
    pub tokens: Vec<Token>,
}

impl Invocation {
    /// Unescaped word contents.
    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.content.as_str()).collect()
    }

    /// `(line, col, end_line, end_col)` from the first token's start to the
    /// last token's end.
    pub fn span(&self) -> (usize, usize, usize, usize) {
        let (line, col) = self.tokens.first().map_or((0, 0), |t| (t.line, t.col));
        let (end_line, end_col) = self.tokens.last().map_or((0, 0), |t| (t.end_line, t.end_col));
        (line, col, end_line, end_col)
    }

    /// The script text under [`Invocation::span`].
    pub fn source<'s>(&self, index: &LineIndex<'s>) -> Option<&'s str> {
        let (line, col, end_line, end_col) = self.span();
        index.slice(line, col, end_line, end_col)
    }

    /// Whether the first word is the CLI root word.
    pub fn is_root_command(&self) -> bool {
        self.tokens
            .first()
            .is_some_and(|t| t.content == ROOT_COMMAND)
    }
}

/// An open bracket group.
struct Group {
    /// Position of the `(` that opened it.
    line: usize,
    col: usize,
    tokens: Vec<Token>,
}

/// Lazy iterator over the invocations of a script. See [`extract_invocations`].
pub struct Invocations<'s> {
    index: LineIndex<'s>,
    next_line: usize,
    pending: Vec<Token>,
    ready: VecDeque<Invocation>,
    error: Option<ScriptParseError>,
    done: bool,
}

/// Splits `script` into invocations, nested ones included.
///
/// Every invocation is yielded, whatever its first word; see
/// [`root_invocations`] for CLI commands only. After an error the iterator is
/// exhausted.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{LineIndex, extract_invocations};
///
/// let script = "az role assignment list --scope $(az group show -n rg --query id)";
/// let found: Vec<_> = extract_invocations(script).collect::<Result<_, _>>().unwrap();
/// assert_eq!(found.len(), 2);
///
/// let index = LineIndex::new(script);
/// assert_eq!(found[0].source(&index), Some("az group show -n rg --query id"));
/// assert_eq!(found[1].source(&index), Some(script));
/// assert_eq!(found[1].words()[5], "$(az group show -n rg --query id)");
/// ```
pub fn extract_invocations(script: &str) -> Invocations<'_> {
    Invocations {
        index: LineIndex::new(script),
        next_line: 0,
        pending: Vec::new(),
        ready: VecDeque::new(),
        error: None,
        done: false,
    }
}

/// Like [`extract_invocations`], keeping only invocations of the CLI itself.
pub fn root_invocations(
    script: &str,
) -> impl Iterator<Item = Result<Invocation, ScriptParseError>> + '_ {
    extract_invocations(script).filter(|item| match item {
        Ok(invocation) => invocation.is_root_command(),
        Err(_) => true,
    })
}

impl Iterator for Invocations<'_> {
    type Item = Result<Invocation, ScriptParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(invocation) = self.ready.pop_front() {
                return Some(Ok(invocation));
            }
            if let Some(err) = self.error.take() {
                self.done = true;
                return Some(Err(err));
            }
            if self.done || self.next_line >= self.index.line_count() {
                return None;
            }
            if let Err(err) = self.read_line() {
                self.error = Some(err);
            }
        }
    }
}

impl Invocations<'_> {
    /// Consumes one physical line, queueing whatever it completes.
    fn read_line(&mut self) -> Result<(), ScriptParseError> {
        let lineno = self.next_line;
        self.next_line += 1;
        let text = self.index.line(lineno).unwrap_or_default();
        let (body, continued) = match text.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let words = split_words(body, true)
            .map_err(|err| ScriptParseError::new(err.to_string(), lineno, text, body.len()))?;
        self.pending.extend(
            words
                .into_iter()
                .map(|w| Token::new(w.content, &body[w.start..w.end], lineno, w.start, w.end)),
        );

        if continued {
            return Ok(());
        }
        let tokens = std::mem::take(&mut self.pending);
        if tokens.is_empty() {
            return Ok(());
        }
        self.group_logical_line(tokens)
    }

    fn group_logical_line(&mut self, tokens: Vec<Token>) -> Result<(), ScriptParseError> {
        let mut outer: Vec<Token> = Vec::new();
        let mut stack: Vec<Group> = Vec::new();

        for token in tokens {
            if let Some((top, enclosing)) = stack.split_last_mut() {
                fold_into_last(&mut outer, &token, &self.index);
                for group in enclosing {
                    fold_into_last(&mut group.tokens, &token, &self.index);
                }
                top.tokens.push(token.clone());
            } else {
                outer.push(token.clone());
            }

            let mut rest = token.clone();
            while let Some(open) = GROUP_OPEN_RE.find(&rest.raw) {
                let paren_col = rest.col + open.end() - 1;
                rest = rest.split_from(open.end());
                stack.push(Group {
                    line: rest.line,
                    col: paren_col,
                    tokens: if rest.raw.is_empty() {
                        Vec::new()
                    } else {
                        vec![rest.clone()]
                    },
                });
            }

            if let Some(close) = GROUP_CLOSE_RE.find(&token.raw) {
                let closers = close.as_str();
                for nth in 1..=closers.matches(')').count() {
                    let pos_to_right = closers.splitn(nth + 1, ')').last().map_or(0, str::len) + 1;
                    let Some(mut group) = stack.pop() else {
                        return Err(ScriptParseError::new(
                            "No matching LeftParenthesis Found",
                            token.end_line,
                            self.index.line(token.end_line).unwrap_or_default(),
                            token.end_col.saturating_sub(pos_to_right),
                        ));
                    };
                    trim_last(&mut group.tokens, pos_to_right);
                    if !group.tokens.is_empty() {
                        self.ready.push_back(Invocation {
                            tokens: group.tokens,
                        });
                    }
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(ScriptParseError::new(
                "No matching RightParenthesis Found",
                open.line,
                self.index.line(open.line).unwrap_or_default(),
                open.col,
            ));
        }
        self.ready.push_back(Invocation { tokens: outer });
        Ok(())
    }
}

/// Extends the last token of `tokens` up to the end of `token`.
fn fold_into_last(tokens: &mut Vec<Token>, token: &Token, index: &LineIndex<'_>) {
    match tokens.last_mut() {
        Some(last) => {
            if let Some(merged) = last.merge(token, index) {
                *last = merged;
            }
        }
        None => tokens.push(token.clone()),
    }
}

/// Cuts closing brackets off the last token, dropping it if nothing is left.
fn trim_last(tokens: &mut Vec<Token>, pos_to_right: usize) {
    if let Some(last) = tokens.pop() {
        let trimmed = last.split_to(pos_to_right);
        if !trimmed.raw.is_empty() {
            tokens.push(trimmed);
        }
    }
}
