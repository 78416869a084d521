//! Minimal JSON support used for the persisted service configuration, the
//! bodies returned by monitored health endpoints and the HTTP API.
//!
//! The grammar is deliberately lenient in a few places (single-quoted strings,
//! bare words falling back to strings, trailing commas) but the top level must
//! always be a balanced object or array. Exponent notation and `\u` escapes
//! are not interpreted.

mod lexer;
mod parser;
mod serializer;
mod value;

pub use parser::{parse, MAX_NESTING_DEPTH};
pub use serializer::serialize;
pub use value::{JsonObject, JsonValue, Number};

/// Structural failure while parsing JSON text.
///
/// Offsets are byte positions into the text passed to [`parse`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected a JSON object or array enclosed in matching delimiters")]
    NotAContainer,

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("trailing content at offset {offset}")]
    TrailingContent { offset: usize },

    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },
}
