//! Shell-style word splitting with byte positions.
//!
//! Follows POSIX `shlex` rules closely enough to pull CLI invocations out of
//! scripts:
//!
//! - words are separated by unquoted whitespace;
//! - single quotes are literal, double quotes honour `\"` and `\\`;
//! - a backslash outside quotes escapes the next character, and a
//!   backslash-newline pair is a line continuation;
//! - with `comments` enabled, an unquoted `#` ends the word and discards the
//!   rest of the line.
//!
//! Unlike `shlex`, every word keeps the half-open byte range `[start, end)` it
//! was read from, so callers can recover the raw text. [`join`] goes the
//! other way through `shell_words`.

use crate::error::LexError;

/// A word and the byte range it occupies in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Unescaped content with quotes removed.
    pub content: String,
    /// Offset of the first byte.
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

/// Splits `text` into words.
///
/// # Errors
///
/// [`LexError::NoClosingQuotation`] for an unterminated quote,
/// [`LexError::NoEscapedCharacter`] for a trailing backslash.
///
/// # Examples
///
/// ```
/// use cli_validator_core::split_words;
///
/// let words = split_words(r#"az group create -n "my group""#, false).unwrap();
/// let contents: Vec<&str> = words.iter().map(|w| w.content.as_str()).collect();
/// assert_eq!(contents, ["az", "group", "create", "-n", "my group"]);
/// assert_eq!((words[4].start, words[4].end), (19, 29));
/// ```
pub fn split_words(text: &str, comments: bool) -> Result<Vec<Word>, LexError> {
    let mut words = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' && comments {
            skip_line(&mut chars);
            continue;
        }
        if c == '\\' && matches!(text[pos + 1..].chars().next(), Some('\n')) {
            chars.next();
            chars.next();
            continue;
        }

        let start = pos;
        let mut end = pos;
        let mut content = String::new();
        let mut quoted = false;

        while let Some((pos, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => break,
                '#' if comments => {
                    skip_line(&mut chars);
                    break;
                }
                '\'' => {
                    quoted = true;
                    end = read_single_quoted(&mut chars, &mut content)?;
                    continue;
                }
                '"' => {
                    quoted = true;
                    end = read_double_quoted(&mut chars, &mut content)?;
                    continue;
                }
                '\\' => match chars.next() {
                    Some((_, '\n')) => {}
                    Some((escaped_pos, escaped)) => {
                        content.push(escaped);
                        end = escaped_pos + escaped.len_utf8();
                        continue;
                    }
                    None => return Err(LexError::NoEscapedCharacter),
                },
                c => content.push(c),
            }
            end = pos + c.len_utf8();
        }

        if !content.is_empty() || quoted {
            words.push(Word {
                content,
                start,
                end,
            });
        }
    }

    Ok(words)
}

/// Splits `text` into word contents only.
///
/// # Examples
///
/// ```
/// use cli_validator_core::split;
///
/// assert_eq!(
///     split("az vm list # all of them", true).unwrap(),
///     vec!["az", "vm", "list"],
/// );
/// assert!(split("az vm list --query 'x", false).is_err());
/// ```
pub fn split(text: &str, comments: bool) -> Result<Vec<String>, LexError> {
    Ok(split_words(text, comments)?
        .into_iter()
        .map(|word| word.content)
        .collect())
}

/// Joins words back into a command line, quoting where needed.
///
/// # Examples
///
/// ```
/// use cli_validator_core::join;
///
/// assert_eq!(join(["az", "vm", "show", "-n", "my vm"]), "az vm show -n 'my vm'");
/// ```
pub fn join<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shell_words::join(words)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn skip_line(chars: &mut Chars<'_>) {
    for (_, c) in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn read_single_quoted(chars: &mut Chars<'_>, content: &mut String) -> Result<usize, LexError> {
    for (pos, c) in chars.by_ref() {
        if c == '\'' {
            return Ok(pos + 1);
        }
        content.push(c);
    }
    Err(LexError::NoClosingQuotation)
}

fn read_double_quoted(chars: &mut Chars<'_>, content: &mut String) -> Result<usize, LexError> {
    while let Some((pos, c)) = chars.next() {
        match c {
            '"' => return Ok(pos + 1),
            '\\' => match chars.next() {
                Some((_, escaped @ ('"' | '\\'))) => content.push(escaped),
                Some((_, other)) => {
                    content.push('\\');
                    content.push(other);
                }
                None => break,
            },
            c => content.push(c),
        }
    }
    Err(LexError::NoClosingQuotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(text: &str, comments: bool) -> Vec<String> {
        split(text, comments).unwrap()
    }

    #[test]
    fn test_quotes_are_stripped_and_positions_kept() {
        let text = r#"az vm show --query "[0].id" -o 'tsv'"#;
        let words = split_words(text, false).unwrap();
        assert_eq!(words[4].content, "[0].id");
        assert_eq!(&text[words[4].start..words[4].end], r#""[0].id""#);
        assert_eq!(&text[words[6].start..words[6].end], "'tsv'");
    }

    #[test]
    fn test_adjacent_quoted_parts_form_one_word() {
        assert_eq!(contents(r#"--tags "a b"'c d'e"#, false), vec!["--tags", "a bc de"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_word() {
        assert_eq!(contents(r#"az x --value """#, false), vec!["az", "x", "--value", ""]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(contents(r"a\ b", false), vec!["a b"]);
        assert_eq!(contents(r#""a\"b\\c\d""#, false), vec![r#"a"b\c\d"#]);
        assert_eq!(contents(r"'a\b'", false), vec![r"a\b"]);
    }

    #[test]
    fn test_comments_only_when_enabled() {
        assert_eq!(contents("az vm list #comment", true), vec!["az", "vm", "list"]);
        assert_eq!(
            contents("az vm list #comment", false),
            vec!["az", "vm", "list", "#comment"]
        );
        assert_eq!(contents("# header\naz vm list", true), vec!["az", "vm", "list"]);
        assert_eq!(contents("echo '#not'", true), vec!["echo", "#not"]);
    }

    #[test]
    fn test_backslash_newline_continues_the_command() {
        assert_eq!(
            contents("az vm create \\\n  --name x", false),
            vec!["az", "vm", "create", "--name", "x"]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(split("az 'open", false), Err(LexError::NoClosingQuotation));
        assert_eq!(split("az \"open", false), Err(LexError::NoClosingQuotation));
        assert_eq!(split("az trailing\\", false), Err(LexError::NoEscapedCharacter));
    }

    #[test]
    fn test_join_quotes_unsafe_words() {
        assert_eq!(join(["az", "vm", "-n", "my vm"]), "az vm -n 'my vm'");
        assert_eq!(join(["az", ""]), "az ''");

        let words = ["az", "tag", "--value", "it's here", "$HOME"];
        let joined = join(words);
        assert!(!joined.contains("it's here"), "{joined}");
        assert_eq!(split(&joined, false).unwrap(), words);
    }
}
