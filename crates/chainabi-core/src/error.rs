//! Error types for the ChainAbi encode/decode pipeline.

use thiserror::Error;

/// Errors raised while building tokens, encoding them, or decoding words.
///
/// Every failure is reported at the point of detection; encode and decode
/// never hand back partial output.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("Invalid token type: {tag}")]
    InvalidTokenType { tag: String },

    #[error("Value out of range: {reason}")]
    OutOfRange { reason: String },

    #[error("Missing token: {reason}")]
    MissingToken { reason: String },

    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("Truncated data: needed {needed} words, only {available} available")]
    TruncatedData { needed: usize, available: usize },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AbiError {
    pub fn out_of_range(reason: impl Into<String>) -> Self {
        AbiError::OutOfRange { reason: reason.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        AbiError::MalformedInput { reason: reason.into() }
    }

    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        AbiError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Short, stable label used for metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            AbiError::InvalidTokenType { .. } => "invalid_token_type",
            AbiError::OutOfRange { .. } => "out_of_range",
            AbiError::MissingToken { .. } => "missing_token",
            AbiError::MalformedInput { .. } => "malformed_input",
            AbiError::TruncatedData { .. } => "truncated_data",
            AbiError::TypeMismatch { .. } => "type_mismatch",
            AbiError::NestingTooDeep { .. } => "nesting_too_deep",
            AbiError::Serde(_) => "serde",
        }
    }
}

pub type Result<T> = std::result::Result<T, AbiError>;
