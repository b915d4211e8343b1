//! ABI parameter types.
//!
//! Callers resolve Solidity type strings into [`ParamType`] themselves; this
//! module only renders the canonical string back (for signatures) and
//! answers head-size questions for the decoder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a single ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    Address,
    Bool,
    /// Signed integer. Width in bits.
    Int(usize),
    /// Unsigned integer. Width in bits.
    Uint(usize),
    /// `bytesN`. Length in bytes (1..=32).
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[N]`
    FixedArray(Box<ParamType>, usize),
    /// `T[]`
    Array(Box<ParamType>),
}

impl ParamType {
    /// Number of head words this type occupies in its sibling list.
    ///
    /// A fixed array's children sit in the head one after another, so its
    /// head is the sum of theirs whatever the element type.
    pub fn head_words(&self) -> usize {
        match self {
            ParamType::FixedArray(inner, len) => len.saturating_mul(inner.head_words()),
            _ => 1,
        }
    }

    /// Nesting depth; scalars are depth 1.
    pub fn depth(&self) -> usize {
        match self {
            ParamType::FixedArray(inner, _) | ParamType::Array(inner) => 1 + inner.depth(),
            _ => 1,
        }
    }

    /// Value types that fit a single word (and an event topic) verbatim.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ParamType::Address
                | ParamType::Bool
                | ParamType::Int(_)
                | ParamType::Uint(_)
                | ParamType::FixedBytes(_)
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::FixedBytes(len) => write!(f, "bytes{len}"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::String => write!(f, "string"),
            ParamType::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// Comma-joined canonical type list, as used inside a signature.
pub fn join_types(types: &[ParamType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_canonical_strings() {
        assert_eq!(ParamType::Uint(256).to_string(), "uint256");
        assert_eq!(
            ParamType::Array(Box::new(ParamType::Address)).to_string(),
            "address[]"
        );
        assert_eq!(
            ParamType::FixedArray(Box::new(ParamType::FixedBytes(32)), 3).to_string(),
            "bytes32[3]"
        );
        assert_eq!(
            ParamType::Array(Box::new(ParamType::FixedArray(Box::new(ParamType::Bool), 2)))
                .to_string(),
            "bool[2][]"
        );
    }

    #[test]
    fn head_words_of_fixed_arrays() {
        let static_fixed = ParamType::FixedArray(Box::new(ParamType::Address), 3);
        assert_eq!(static_fixed.head_words(), 3);

        let nested = ParamType::FixedArray(Box::new(static_fixed), 2);
        assert_eq!(nested.head_words(), 6);

        // one pointer per dynamic child, all in the head
        let of_strings = ParamType::FixedArray(Box::new(ParamType::String), 3);
        assert_eq!(of_strings.head_words(), 3);

        let of_arrays = ParamType::FixedArray(
            Box::new(ParamType::Array(Box::new(ParamType::Address))),
            2,
        );
        assert_eq!(of_arrays.head_words(), 2);
        assert_eq!(ParamType::Array(Box::new(of_arrays)).head_words(), 1);
    }

    #[test]
    fn serde_shape() {
        let ty = ParamType::Array(Box::new(ParamType::Uint(256)));
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, r#"{"array":{"uint":256}}"#);
        let back: ParamType = serde_json::from_str(r#"{"fixedArray":["address",2]}"#).unwrap();
        assert_eq!(back, ParamType::FixedArray(Box::new(ParamType::Address), 2));
    }
}
