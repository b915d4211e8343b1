//! The closed set of ABI values a caller may hand to the encoder.
//!
//! Tokens are built once per call, either directly or from the JSON
//! `{ "type": <tag>, "value": <value> }` boundary, and are never mutated.

use alloy_primitives::{Address, Sign, I256, U256};
use serde_json::{json, Value};
use std::{fmt, str::FromStr};

use crate::{
    error::{AbiError, Result},
    param::ParamType,
};

/// One ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 20-byte address, left-padded on the wire.
    Address(Address),
    Bool(bool),
    /// Signed integer, two's complement on the wire.
    Int(I256),
    Uint(U256),
    /// `bytesN`: at most 32 bytes, right-padded, never length-prefixed.
    FixedBytes(Vec<u8>),
    /// Length-prefixed byte payload.
    Bytes(Vec<u8>),
    /// UTF-8 text, encoded exactly like `Bytes`.
    String(String),
    /// `T[N]`: children share one element type.
    FixedArray(Vec<Token>),
    /// `T[]`: children share one element type.
    Array(Vec<Token>),
}

/// Tag of a [`Token`] variant, as it appears on the JSON boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Address,
    Bool,
    Int,
    Uint,
    FixedBytes,
    Bytes,
    String,
    FixedArray,
    Array,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Address => "address",
            TokenKind::Bool => "bool",
            TokenKind::Int => "int",
            TokenKind::Uint => "uint",
            TokenKind::FixedBytes => "fixedBytes",
            TokenKind::Bytes => "bytes",
            TokenKind::String => "string",
            TokenKind::FixedArray => "fixedArray",
            TokenKind::Array => "array",
        }
    }
}

impl FromStr for TokenKind {
    type Err = AbiError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "address" => Ok(TokenKind::Address),
            "bool" => Ok(TokenKind::Bool),
            "int" => Ok(TokenKind::Int),
            "uint" => Ok(TokenKind::Uint),
            "fixedBytes" => Ok(TokenKind::FixedBytes),
            "bytes" => Ok(TokenKind::Bytes),
            "string" => Ok(TokenKind::String),
            "fixedArray" => Ok(TokenKind::FixedArray),
            "array" => Ok(TokenKind::Array),
            other => Err(AbiError::InvalidTokenType { tag: other.to_string() }),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Address(_) => TokenKind::Address,
            Token::Bool(_) => TokenKind::Bool,
            Token::Int(_) => TokenKind::Int,
            Token::Uint(_) => TokenKind::Uint,
            Token::FixedBytes(_) => TokenKind::FixedBytes,
            Token::Bytes(_) => TokenKind::Bytes,
            Token::String(_) => TokenKind::String,
            Token::FixedArray(_) => TokenKind::FixedArray,
            Token::Array(_) => TokenKind::Array,
        }
    }

    /// Build a token from a tag and a loosely typed JSON value.
    ///
    /// # Errors
    /// - `InvalidTokenType` for an unknown tag
    /// - `OutOfRange` for integers outside the 256-bit domain
    /// - `MalformedInput` when the value does not fit the tag
    pub fn from_tagged(tag: &str, value: &Value) -> Result<Self> {
        let kind: TokenKind = tag.parse()?;
        match kind {
            TokenKind::Address => parse_address(value).map(Token::Address),
            TokenKind::Bool => value
                .as_bool()
                .map(Token::Bool)
                .ok_or_else(|| AbiError::malformed(format!("expected boolean, got {value}"))),
            TokenKind::Uint => parse_uint(value).map(Token::Uint),
            TokenKind::Int => parse_int(value).map(Token::Int),
            TokenKind::FixedBytes => {
                let bytes = parse_bytes(value)?;
                if bytes.len() > 32 {
                    return Err(AbiError::malformed(format!(
                        "fixedBytes holds at most 32 bytes, got {}",
                        bytes.len()
                    )));
                }
                Ok(Token::FixedBytes(bytes))
            }
            TokenKind::Bytes => parse_bytes(value).map(Token::Bytes),
            TokenKind::String => value
                .as_str()
                .map(|s| Token::String(s.to_string()))
                .ok_or_else(|| AbiError::malformed(format!("expected string, got {value}"))),
            TokenKind::FixedArray => tokens_from_json(value).map(Token::FixedArray),
            TokenKind::Array => tokens_from_json(value).map(Token::Array),
        }
    }

    /// Build a token from `{ "type": <tag>, "value": <value> }`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            AbiError::malformed(format!("expected {{type, value}} object, got {value}"))
        })?;
        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AbiError::malformed("token object has no string 'type'"))?;
        let inner = obj
            .get("value")
            .ok_or_else(|| AbiError::malformed(format!("token '{tag}' has no 'value'")))?;
        Self::from_tagged(tag, inner)
    }

    /// Render as `{ "type": <tag>, "value": <value> }`.
    ///
    /// Integers become decimal strings, addresses and bytes lowercase
    /// `0x` hex.
    pub fn to_json(&self) -> Value {
        let value = match self {
            Token::Address(a) => json!(format!("0x{}", hex::encode(a.as_slice()))),
            Token::Bool(b) => json!(b),
            Token::Int(i) => json!(i.to_string()),
            Token::Uint(u) => json!(u.to_string()),
            Token::FixedBytes(b) | Token::Bytes(b) => json!(format!("0x{}", hex::encode(b))),
            Token::String(s) => json!(s),
            Token::FixedArray(items) | Token::Array(items) => {
                Value::Array(items.iter().map(Token::to_json).collect())
            }
        };
        json!({ "type": self.kind().as_str(), "value": value })
    }

    /// Structural conformance of this token to `ty`.
    pub fn type_check(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Token::Address(_), ParamType::Address)
            | (Token::Bool(_), ParamType::Bool)
            | (Token::Int(_), ParamType::Int(_))
            | (Token::Uint(_), ParamType::Uint(_))
            | (Token::Bytes(_), ParamType::Bytes)
            | (Token::String(_), ParamType::String) => true,
            (Token::FixedBytes(b), ParamType::FixedBytes(len)) => b.len() == *len,
            (Token::FixedArray(items), ParamType::FixedArray(inner, len)) => {
                items.len() == *len && items.iter().all(|t| t.type_check(inner))
            }
            (Token::Array(items), ParamType::Array(inner)) => {
                items.iter().all(|t| t.type_check(inner))
            }
            _ => false,
        }
    }

    /// Nesting depth; scalars are depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Token::FixedArray(items) | Token::Array(items) => {
                1 + items.iter().map(Token::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Address(a) => write!(f, "0x{}", hex::encode(a.as_slice())),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Uint(u) => write!(f, "{u}"),
            Token::FixedBytes(b) | Token::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Token::String(s) => write!(f, "{s}"),
            Token::FixedArray(items) | Token::Array(items) => {
                let parts: Vec<_> = items.iter().map(|t| t.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Parse a JSON token list.
///
/// # Errors
/// `MissingToken` when `value` is not an array.
pub fn tokens_from_json(value: &Value) -> Result<Vec<Token>> {
    let items = value.as_array().ok_or_else(|| AbiError::MissingToken {
        reason: format!("expected an array of tokens, got {value}"),
    })?;
    items.iter().map(Token::from_json).collect()
}

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn parse_address(value: &Value) -> Result<Address> {
    let s = value
        .as_str()
        .ok_or_else(|| AbiError::malformed(format!("expected address string, got {value}")))?;
    let bytes = hex::decode(strip_hex(s))
        .map_err(|e| AbiError::malformed(format!("address '{s}': {e}")))?;
    if bytes.len() != 20 {
        return Err(AbiError::malformed(format!(
            "address '{s}' is {} bytes, expected 20",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

fn parse_bytes(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => hex::decode(strip_hex(s))
            .map_err(|e| AbiError::malformed(format!("bytes '{s}': {e}"))),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| AbiError::malformed(format!("invalid byte {item}")))
            })
            .collect(),
        other => Err(AbiError::malformed(format!(
            "expected hex string or byte array, got {other}"
        ))),
    }
}

/// Split a numeric JSON value into sign and magnitude.
fn parse_magnitude(value: &Value) -> Result<(Sign, U256)> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok((Sign::Positive, U256::from(u)))
            } else if let Some(i) = n.as_i64() {
                Ok((Sign::Negative, U256::from(i.unsigned_abs())))
            } else {
                Err(AbiError::malformed(format!("non-integer number {n}")))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let (sign, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (Sign::Negative, rest),
                None => (Sign::Positive, trimmed),
            };
            if digits.is_empty() {
                return Err(AbiError::malformed("empty numeric string"));
            }
            let (radix, body) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                Some(hex_body) => (16, hex_body),
                None => (10, digits),
            };
            if body.is_empty() || !body.chars().all(|c| c.is_digit(radix as u32)) {
                return Err(AbiError::malformed(format!("'{s}' is not an integer")));
            }
            let magnitude = U256::from_str_radix(body, radix)
                .map_err(|_| AbiError::out_of_range(format!("'{s}' exceeds 256 bits")))?;
            Ok((sign, magnitude))
        }
        other => Err(AbiError::malformed(format!("expected integer, got {other}"))),
    }
}

fn parse_uint(value: &Value) -> Result<U256> {
    match parse_magnitude(value)? {
        (Sign::Negative, m) if !m.is_zero() => Err(AbiError::out_of_range(format!(
            "uint cannot be negative: {value}"
        ))),
        (_, m) => Ok(m),
    }
}

fn parse_int(value: &Value) -> Result<I256> {
    let (sign, magnitude) = parse_magnitude(value)?;
    I256::checked_from_sign_and_abs(sign, magnitude)
        .ok_or_else(|| AbiError::out_of_range(format!("{value} does not fit int256")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_invalid_token_type() {
        let err = Token::from_tagged("noMatch", &json!(1)).unwrap_err();
        assert!(matches!(err, AbiError::InvalidTokenType { tag } if tag == "noMatch"));
    }

    #[test]
    fn parses_every_tag() {
        let list = json!([
            { "type": "address", "value": "0x1111111111111111111111111111111111111111" },
            { "type": "bool", "value": true },
            { "type": "int", "value": "-123" },
            { "type": "uint", "value": "0x10" },
            { "type": "fixedBytes", "value": "0x1234" },
            { "type": "bytes", "value": [18, 52] },
            { "type": "string", "value": "gavofyork" },
            { "type": "fixedArray", "value": [{ "type": "uint", "value": 1 }] },
            { "type": "array", "value": [] }
        ]);
        let tokens = tokens_from_json(&list).unwrap();
        assert_eq!(tokens[0], Token::Address(Address::from([0x11u8; 20])));
        assert_eq!(tokens[1], Token::Bool(true));
        assert_eq!(tokens[2].to_string(), "-123");
        assert_eq!(tokens[3], Token::Uint(U256::from(16u64)));
        assert_eq!(tokens[4], Token::FixedBytes(vec![0x12, 0x34]));
        assert_eq!(tokens[5], Token::Bytes(vec![0x12, 0x34]));
        assert_eq!(tokens[6], Token::String("gavofyork".into()));
        assert_eq!(tokens[7], Token::FixedArray(vec![Token::Uint(U256::from(1u64))]));
        assert_eq!(tokens[8], Token::Array(vec![]));
    }

    #[test]
    fn non_array_is_missing_token() {
        let err = tokens_from_json(&json!({ "type": "bool", "value": true })).unwrap_err();
        assert!(matches!(err, AbiError::MissingToken { .. }));
    }

    #[test]
    fn uint_over_256_bits_out_of_range() {
        let too_big = format!("0x1{}", "0".repeat(64));
        let err = Token::from_tagged("uint", &json!(too_big)).unwrap_err();
        assert!(matches!(err, AbiError::OutOfRange { .. }));

        let err = Token::from_tagged("uint", &json!(-1)).unwrap_err();
        assert!(matches!(err, AbiError::OutOfRange { .. }));
    }

    #[test]
    fn int_bounds() {
        let min = format!("-0x8{}", "0".repeat(63));
        assert!(Token::from_tagged("int", &json!(min)).is_ok());
        let over = format!("0x8{}", "0".repeat(63));
        assert!(matches!(
            Token::from_tagged("int", &json!(over)),
            Err(AbiError::OutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_values() {
        assert!(matches!(
            Token::from_tagged("address", &json!("0x1234")),
            Err(AbiError::MalformedInput { .. })
        ));
        assert!(matches!(
            Token::from_tagged("bool", &json!("yes")),
            Err(AbiError::MalformedInput { .. })
        ));
        assert!(matches!(
            Token::from_tagged("fixedBytes", &json!(format!("0x{}", "00".repeat(33)))),
            Err(AbiError::MalformedInput { .. })
        ));
        assert!(matches!(
            Token::from_tagged("uint", &json!(1.5)),
            Err(AbiError::MalformedInput { .. })
        ));
    }

    #[test]
    fn to_json_shape() {
        let token = Token::Array(vec![
            Token::Uint(U256::from(4u64)),
            Token::Address(Address::from([0xabu8; 20])),
        ]);
        assert_eq!(
            token.to_json(),
            json!({
                "type": "array",
                "value": [
                    { "type": "uint", "value": "4" },
                    { "type": "address", "value": format!("0x{}", "ab".repeat(20)) }
                ]
            })
        );
        assert_eq!(Token::from_json(&token.to_json()).unwrap(), token);
    }

    #[test]
    fn type_check_nested() {
        let ty = ParamType::FixedArray(Box::new(ParamType::Array(Box::new(ParamType::Bool))), 2);
        let ok = Token::FixedArray(vec![
            Token::Array(vec![Token::Bool(true)]),
            Token::Array(vec![]),
        ]);
        assert!(ok.type_check(&ty));
        let short = Token::FixedArray(vec![Token::Array(vec![])]);
        assert!(!short.type_check(&ty));
        assert!(!Token::FixedBytes(vec![1, 2]).type_check(&ParamType::FixedBytes(32)));
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(Token::Bool(true).depth(), 1);
        let nested = Token::Array(vec![Token::Array(vec![Token::Bool(false)])]);
        assert_eq!(nested.depth(), 3);
        assert_eq!(Token::Array(vec![]).depth(), 1);
    }
}
