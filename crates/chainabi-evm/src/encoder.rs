//! ABI encoder.
//!
//! Lowers an ordered token list and writes the head region followed by the
//! tail region. The result is always a whole number of 32-byte words and is
//! suitable for placing after a 4-byte selector in calldata.
//!
//! # Usage
//! ```ignore
//! let data = Encoder::new().encode_hex(&[
//!     Token::Address(to),
//!     Token::Uint(U256::from(1_000_000u64)),
//! ])?;
//! ```

use chainabi_core::{
    config::CodecConfig,
    error::Result,
    token::{tokens_from_json, Token},
};
use serde_json::Value;

use crate::mediate::{encode_list, Mediate};

/// ABI encoder. Holds only configuration; every call owns its own lowered
/// tree.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `tokens` into head ++ tail bytes.
    ///
    /// All-or-nothing: any invalid token fails the whole call.
    pub fn encode(&self, tokens: &[Token]) -> Result<Vec<u8>> {
        let mediates = Mediate::lower_all(tokens, 1, self.config.max_depth)?;
        let total: usize = mediates.iter().map(|m| m.head_len() + m.tail_len()).sum();

        let mut out = Vec::with_capacity(total);
        encode_list(&mediates, &mut out);
        debug_assert_eq!(out.len(), total);

        tracing::debug!(tokens = tokens.len(), bytes = out.len(), "abi encoded");
        Ok(out)
    }

    /// Encode to a `0x`-prefixed lowercase hex string.
    pub fn encode_hex(&self, tokens: &[Token]) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.encode(tokens)?)))
    }

    /// Encode a JSON token list (`[{ "type": .., "value": .. }, ..]`).
    ///
    /// # Errors
    /// `MissingToken` if `tokens` is not an array, plus every token
    /// construction error.
    pub fn encode_json(&self, tokens: &Value) -> Result<String> {
        let tokens = tokens_from_json(tokens)?;
        self.encode_hex(&tokens)
    }
}

/// Encode with the default configuration.
pub fn encode(tokens: &[Token]) -> Result<Vec<u8>> {
    Encoder::new().encode(tokens)
}

/// Encode with the default configuration, as `0x` hex.
pub fn encode_hex(tokens: &[Token]) -> Result<String> {
    Encoder::new().encode_hex(tokens)
}
