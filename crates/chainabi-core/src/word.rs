//! 32-byte word primitives.
//!
//! Numeric, boolean and address values are left-padded into a single word.
//! Raw byte payloads are right-padded with zeros up to the next word
//! boundary.

use alloy_primitives::{Address, I256, U256};

use crate::error::{AbiError, Result};

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// The atomic 32-byte unit of the wire format.
pub type Word = [u8; WORD_SIZE];

/// Left-pad a 20-byte address into a word.
pub fn pad_address(address: &Address) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Big-endian word of an unsigned 256-bit value.
pub fn pad_u256(value: &U256) -> Word {
    value.to_be_bytes::<WORD_SIZE>()
}

/// Two's-complement word of a signed 256-bit value.
///
/// Negative values come out left-padded with one-bits.
pub fn pad_i256(value: &I256) -> Word {
    value.into_raw().to_be_bytes::<WORD_SIZE>()
}

/// Word holding a length, count or offset.
pub fn pad_usize(value: usize) -> Word {
    pad_u256(&U256::from(value))
}

pub fn pad_bool(value: bool) -> Word {
    pad_usize(usize::from(value))
}

/// Right-pad a `bytesN` value (N <= 32) into one word.
pub fn pad_fixed_bytes(bytes: &[u8]) -> Result<Word> {
    if bytes.len() > WORD_SIZE {
        return Err(AbiError::malformed(format!(
            "fixed bytes of length {} exceed one word",
            bytes.len()
        )));
    }
    let mut word = [0u8; WORD_SIZE];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

/// Right-pad a byte sequence to the next multiple of 32 bytes.
///
/// An empty input stays empty: rounding up from zero is zero.
pub fn pad_raw_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
    let mut out = Vec::with_capacity(padded_len);
    out.extend_from_slice(bytes);
    out.resize(padded_len, 0);
    out
}

/// Split a hex blob (optionally `0x`-prefixed) into words.
///
/// The empty blob yields a single all-zero word. A trailing partial word is
/// right-padded with zeros.
pub fn split_words(hex_data: &str) -> Result<Vec<Word>> {
    let stripped = hex_data.strip_prefix("0x").unwrap_or(hex_data);
    let bytes = hex::decode(stripped)
        .map_err(|e| AbiError::malformed(format!("invalid hex data: {e}")))?;
    Ok(split_bytes(&bytes))
}

/// Same as [`split_words`] over raw bytes.
pub fn split_bytes(bytes: &[u8]) -> Vec<Word> {
    if bytes.is_empty() {
        return vec![[0u8; WORD_SIZE]];
    }
    bytes
        .chunks(WORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word[..chunk.len()].copy_from_slice(chunk);
            word
        })
        .collect()
}

/// Read a word as a length/offset. The value must fit in `usize`.
pub fn word_to_usize(word: &Word) -> Result<usize> {
    let value = U256::from_be_bytes(*word);
    usize::try_from(value)
        .map_err(|_| AbiError::out_of_range(format!("word {value} does not fit in usize")))
}
