//! Tokenizer for the JSON parser.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    /// Single- or double-quoted string, escapes already resolved
    Quoted(String),
    /// Unquoted run of text: literals, numbers, or anything else
    Bare(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenBrace => f.write_str("'{'"),
            TokenKind::CloseBrace => f.write_str("'}'"),
            TokenKind::OpenBracket => f.write_str("'['"),
            TokenKind::CloseBracket => f.write_str("']'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Quoted(text) => write!(f, "string {:?}", text),
            TokenKind::Bare(text) => write!(f, "'{}'", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token
    pub offset: usize,
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Split `text` into tokens. Only unterminated strings fail here; grammar
/// errors are the parser's business.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '"' | '\'' => {
                chars.next();
                let text = read_quoted(&mut chars, c, offset)?;
                tokens.push(Token {
                    kind: TokenKind::Quoted(text),
                    offset,
                });
                continue;
            }
            _ => {
                tokens.push(Token {
                    kind: TokenKind::Bare(read_bare(&mut chars)),
                    offset,
                });
                continue;
            }
        };
        chars.next();
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

/// Read up to the closing `quote`; the opening quote is already consumed.
fn read_quoted(chars: &mut Chars<'_>, quote: char, start: usize) -> Result<String, ParseError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(ParseError::UnterminatedString { offset: start }),
            Some((_, c)) if c == quote => return Ok(text),
            Some((_, '\\')) => {
                let (_, escaped) = chars
                    .next()
                    .ok_or(ParseError::UnterminatedString { offset: start })?;
                match escaped {
                    '"' | '\'' | '\\' | '/' => text.push(escaped),
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    'b' => text.push('\u{8}'),
                    'f' => text.push('\u{c}'),
                    // Unknown escapes (including \u) are kept verbatim
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
            }
            Some((_, c)) => text.push(c),
        }
    }
}

/// Read an unquoted run up to the next structural character.
fn read_bare(chars: &mut Chars<'_>) -> String {
    let mut text = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if matches!(c, '{' | '}' | '[' | ']' | ':' | ',') {
            break;
        }
        text.push(c);
        chars.next();
    }
    text.trim_end().to_string()
}
