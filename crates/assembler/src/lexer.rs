//! Tokenizer for GML assembly text.

use std::fmt;

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// A bare word: mnemonic, directive, name or keyword literal. Case is
    /// preserved; mnemonics are matched case-insensitively.
    Ident(String),
    /// A numeric literal (decimal, exponent or hex).
    Number(f64),
    /// A double-quoted string literal, escapes resolved.
    Str(String),
    /// A field key written as `key=`.
    Key(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => f.write_str(s),
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Key(k) => write!(f, "{k}="),
        }
    }
}

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` outside a string literal and extend to end of
/// line.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => break,
            '"' => {
                chars.next();
                tokens.push(Token::Str(read_string(&mut chars, line_num)?));
            }
            _ => {
                let mut end = line.len();
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ';' | '"' | '=') {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                let word = &line[start..end];

                if word.is_empty() {
                    // A lone `=` with no key in front of it.
                    return Err(AsmError::UnexpectedToken {
                        line: line_num,
                        token: "=".to_string(),
                    });
                }
                if chars.peek().is_some_and(|&(_, c)| c == '=') {
                    chars.next();
                    tokens.push(Token::Key(word.to_string()));
                } else {
                    tokens.push(classify_word(word, line_num)?);
                }
            }
        }
    }

    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line_num: usize,
) -> Result<String, AsmError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(AsmError::UnterminatedString { line: line_num }),
            Some((_, '"')) => return Ok(text),
            Some((_, '\\')) => match chars.next() {
                Some((_, '"')) => text.push('"'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, other)) => {
                    return Err(AsmError::InvalidEscape {
                        line: line_num,
                        escape: other,
                    })
                }
                None => return Err(AsmError::UnterminatedString { line: line_num }),
            },
            Some((_, c)) => text.push(c),
        }
    }
}

/// Numbers start with a digit, or a sign or point followed by a digit.
/// Everything else is an identifier.
fn classify_word(word: &str, line_num: usize) -> Result<Token, AsmError> {
    let bytes = word.as_bytes();
    let numeric = match bytes {
        [first, ..] if first.is_ascii_digit() => true,
        [b'+' | b'-' | b'.', second, ..] => second.is_ascii_digit() || *second == b'.',
        _ => false,
    };
    if !numeric {
        return Ok(Token::Ident(word.to_string()));
    }

    parse_number(word)
        .map(Token::Number)
        .ok_or_else(|| AsmError::InvalidNumber {
            line: line_num,
            token: word.to_string(),
        })
}

fn parse_number(word: &str) -> Option<f64> {
    let (negative, digits) = match word.as_bytes().first() {
        Some(b'-') => (true, &word[1..]),
        Some(b'+') => (false, &word[1..]),
        _ => (false, word),
    };

    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok()? as f64,
        None => {
            // Rust's float grammar also accepts words like "infinity";
            // those never reach here because they start with a letter.
            digits.parse::<f64>().ok()?
        }
    };

    Some(if negative { -magnitude } else { magnitude })
}
