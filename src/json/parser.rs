//! Recursive-descent parser over the token stream.

use super::lexer::{tokenize, Token, TokenKind};
use super::{JsonObject, JsonValue, Number, ParseError};

/// Containers nested deeper than this are rejected instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse JSON text into a [`JsonValue`].
///
/// The trimmed text must start and end with matching container delimiters
/// (`{...}` or `[...]`) and contain exactly one value.
pub fn parse(text: &str) -> Result<JsonValue, ParseError> {
    let trimmed = text.trim();
    let balanced = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !balanced {
        return Err(ParseError::NotAContainer);
    }

    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::TrailingContent {
            offset: token.offset,
        });
    }
    Ok(value)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Token, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_value(&mut self) -> Result<JsonValue, ParseError> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::OpenBrace => self.nested(token, Self::parse_object),
            TokenKind::OpenBracket => self.nested(token, Self::parse_array),
            TokenKind::Quoted(text) => Ok(JsonValue::String(text.clone())),
            TokenKind::Bare(word) => Ok(classify_bare(word)),
            _ => Err(unexpected(token, "a value")),
        }
    }

    fn nested(
        &mut self,
        open: &Token,
        body: fn(&mut Self) -> Result<JsonValue, ParseError>,
    ) -> Result<JsonValue, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep {
                offset: open.offset,
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let value = body(self);
        self.depth -= 1;
        value
    }

    /// Object body; the opening brace is already consumed.
    fn parse_object(&mut self) -> Result<JsonValue, ParseError> {
        let mut object = JsonObject::new();
        loop {
            let token = self.next()?;
            let key = match &token.kind {
                // Also accepts a trailing comma before the brace
                TokenKind::CloseBrace => return Ok(JsonValue::Object(object)),
                TokenKind::Quoted(key) | TokenKind::Bare(key) => key.clone(),
                _ => return Err(unexpected(token, "an object key")),
            };

            let colon = self.next()?;
            if colon.kind != TokenKind::Colon {
                return Err(unexpected(colon, "':'"));
            }

            let value = self.parse_value()?;
            object.insert(key, value);

            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::CloseBrace => return Ok(JsonValue::Object(object)),
                _ => return Err(unexpected(token, "',' or '}'")),
            }
        }
    }

    /// Array body; the opening bracket is already consumed.
    fn parse_array(&mut self) -> Result<JsonValue, ParseError> {
        let mut items = Vec::new();
        loop {
            if let Some(Token {
                kind: TokenKind::CloseBracket,
                ..
            }) = self.peek()
            {
                self.pos += 1;
                return Ok(JsonValue::Array(items));
            }

            items.push(self.parse_value()?);

            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::CloseBracket => return Ok(JsonValue::Array(items)),
                _ => return Err(unexpected(token, "',' or ']'")),
            }
        }
    }
}

fn unexpected(token: &Token, expected: &'static str) -> ParseError {
    ParseError::UnexpectedToken {
        offset: token.offset,
        found: token.kind.to_string(),
        expected,
    }
}

/// Literal, then integer, then plain decimal, else the raw text as a string.
fn classify_bare(word: &str) -> JsonValue {
    match word {
        "true" => return JsonValue::Bool(true),
        "false" => return JsonValue::Bool(false),
        "null" => return JsonValue::Null,
        _ => {}
    }
    if let Ok(value) = word.parse::<i64>() {
        return JsonValue::Number(Number::Int(value));
    }
    if is_plain_decimal(word) {
        if let Ok(value) = word.parse::<f64>() {
            return JsonValue::Number(Number::Float(value));
        }
    }
    JsonValue::String(word.to_string())
}

/// Digits with an optional sign and decimal point; rules out exponents,
/// `inf` and `NaN`, which `f64::from_str` would otherwise accept.
fn is_plain_decimal(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::serialize;

    fn object(text: &str) -> JsonObject {
        match parse(text).unwrap() {
            JsonValue::Object(object) => object,
            other => panic!("expected object, got {:?}", other),
        }
    }

    // =============================================================================
    // Grammar productions
    // =============================================================================

    #[test]
    fn test_parse_nested_object() {
        let parsed = object(r#"{"a":{"b":1},"c":2}"#);
        assert_eq!(parsed.len(), 2);
        let inner = parsed.get_object("a").unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner.get("b"), Some(&JsonValue::from(1)));
        assert_eq!(parsed.get("c"), Some(&JsonValue::from(2)));
    }

    #[test]
    fn test_parse_commas_inside_nested_array_do_not_split_fields() {
        let parsed = object(r#"{"a":[1,2,3],"b":4}"#);
        assert_eq!(
            parsed.get_array("a").unwrap(),
            &[JsonValue::from(1), JsonValue::from(2), JsonValue::from(3)]
        );
        assert_eq!(parsed.get("b"), Some(&JsonValue::from(4)));
    }

    #[test]
    fn test_parse_array_of_mixed_values() {
        let parsed = parse(r#"[ {"x": [ ]}, "s", 1.5, true, null ]"#).unwrap();
        assert_eq!(
            parsed,
            JsonValue::Array(vec![
                JsonValue::Object(JsonObject::new().with("x", JsonValue::Array(vec![]))),
                JsonValue::from("s"),
                JsonValue::from(1.5),
                JsonValue::Bool(true),
                JsonValue::Null,
            ])
        );
    }

    #[test]
    fn test_parse_string_escapes_and_single_quotes() {
        let parsed = object(r#"{'q': 'say \'hi\'', "d": "a \"b\" c"}"#);
        assert_eq!(parsed.get("q").and_then(JsonValue::as_str), Some("say 'hi'"));
        assert_eq!(parsed.get("d").and_then(JsonValue::as_str), Some("a \"b\" c"));
    }

    #[test]
    fn test_parse_numbers() {
        let parsed = parse("[0, -17, +5, 3.25, -0.5, 9223372036854775808]").unwrap();
        assert_eq!(
            parsed,
            JsonValue::Array(vec![
                JsonValue::from(0),
                JsonValue::from(-17),
                JsonValue::from(5),
                JsonValue::from(3.25),
                JsonValue::from(-0.5),
                JsonValue::from(9223372036854775808.0),
            ])
        );
    }

    #[test]
    fn test_parse_exponent_and_special_words_fall_back_to_string() {
        let parsed = parse("[1e5, NaN, inf, 1.2.3]").unwrap();
        assert_eq!(
            parsed,
            JsonValue::Array(vec![
                JsonValue::from("1e5"),
                JsonValue::from("NaN"),
                JsonValue::from("inf"),
                JsonValue::from("1.2.3"),
            ])
        );
    }

    #[test]
    fn test_parse_literals() {
        let parsed = object(r#"{"t": true, "f": false, "n": null}"#);
        assert_eq!(parsed.get("t"), Some(&JsonValue::Bool(true)));
        assert_eq!(parsed.get("f"), Some(&JsonValue::Bool(false)));
        assert_eq!(parsed.get("n"), Some(&JsonValue::Null));
    }

    #[test]
    fn test_parse_bare_key_and_bare_word_value() {
        let parsed = object("{status: UP}");
        assert_eq!(parsed.get_text("status").as_deref(), Some("UP"));
    }

    #[test]
    fn test_parse_duplicate_key_last_write_wins() {
        let parsed = object(r#"{"a":1,"b":2,"a":3}"#);
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(parsed.get("a"), Some(&JsonValue::from(3)));
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let parsed = object(r#"{"z":1,"a":2,"m":3}"#);
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_empty_containers() {
        assert_eq!(parse("{}").unwrap(), JsonValue::Object(JsonObject::new()));
        assert_eq!(parse(" [ ] ").unwrap(), JsonValue::Array(vec![]));
    }

    // Compatibility decision: a trailing comma is tolerated and ignored,
    // matching files written for the older, more lenient format.
    #[test]
    fn test_parse_trailing_comma_is_ignored() {
        assert_eq!(
            parse("[1,2,]").unwrap(),
            JsonValue::Array(vec![JsonValue::from(1), JsonValue::from(2)])
        );
        assert_eq!(object(r#"{"a":1,}"#).len(), 1);
    }

    // =============================================================================
    // Rejections
    // =============================================================================

    #[test]
    fn test_parse_rejects_non_container_text() {
        assert_eq!(parse(""), Err(ParseError::NotAContainer));
        assert_eq!(parse("   "), Err(ParseError::NotAContainer));
        assert_eq!(parse("\"text\""), Err(ParseError::NotAContainer));
        assert_eq!(parse("42"), Err(ParseError::NotAContainer));
        assert_eq!(parse("{\"a\":1]"), Err(ParseError::NotAContainer));
    }

    #[test]
    fn test_parse_rejects_unbalanced_nesting() {
        assert!(parse(r#"{"a":{"b":1}"#).is_err());
        assert!(parse(r#"{"a":[1,2}"#).is_err());
        assert!(parse("[[1]]]").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_value_and_colon() {
        assert!(matches!(
            parse(r#"{"a":}"#),
            Err(ParseError::UnexpectedToken { expected: "a value", .. })
        ));
        assert!(matches!(
            parse(r#"{"a" 1}"#),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse(r#"{"a"}"#),
            Err(ParseError::UnexpectedToken { expected: "':'", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_doubled_commas() {
        assert!(parse("[1,,2]").is_err());
        assert!(parse(r#"{"a":1,,"b":2}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_content() {
        assert_eq!(
            parse("{} {}"),
            Err(ParseError::TrailingContent { offset: 3 })
        );
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let deep = format!(
            "{}{}",
            "[".repeat(MAX_NESTING_DEPTH + 1),
            "]".repeat(MAX_NESTING_DEPTH + 1)
        );
        assert!(matches!(parse(&deep), Err(ParseError::TooDeep { .. })));

        let allowed = format!(
            "{}{}",
            "[".repeat(MAX_NESTING_DEPTH),
            "]".repeat(MAX_NESTING_DEPTH)
        );
        assert!(parse(&allowed).is_ok());
    }

    // =============================================================================
    // Round trip
    // =============================================================================

    #[test]
    fn test_serialize_then_parse_returns_same_tree() {
        let tree = JsonValue::Object(
            JsonObject::new()
                .with("name", "Auth \"core\"\n\ttab\\slash")
                .with("quote", "it's")
                .with("empty", "")
                .with("looks_like_number", "42")
                .with("looks_like_literal", "true")
                .with("int", -12)
                .with("float", 2.0)
                .with("fraction", 0.1)
                .with("flag", false)
                .with("nothing", JsonValue::Null)
                .with(
                    "list",
                    JsonValue::Array(vec![
                        JsonValue::Array(vec![]),
                        JsonValue::Object(JsonObject::new()),
                        JsonValue::from("a,b"),
                        JsonValue::from("{not: nested}"),
                    ]),
                )
                .with(
                    "nested",
                    JsonObject::new().with("deeper", JsonObject::new().with("k", 1)),
                ),
        );

        assert_eq!(parse(&serialize(&tree)).unwrap(), tree);
    }
}
