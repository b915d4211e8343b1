//! # chainabi-core
//!
//! Shared model for the ChainAbi contract-call codec: the [`Token`] values a
//! caller supplies, the [`ParamType`]s a decoder walks, the 32-byte word
//! primitives both directions rely on, and the error taxonomy.

pub mod config;
pub mod error;
pub mod param;
pub mod token;
pub mod word;

pub use config::CodecConfig;
pub use error::{AbiError, Result};
pub use param::ParamType;
pub use token::{tokens_from_json, Token, TokenKind};
pub use word::{split_bytes, split_words, Word, WORD_SIZE};
