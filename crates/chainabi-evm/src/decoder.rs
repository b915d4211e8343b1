//! ABI decoder, the inverse of [`crate::encoder`].
//!
//! Walks a caller-supplied type list against a word sequence, keeping two
//! cursors per sibling list: the next head word and the next tail word.
//! Pointers resolve against a base word:
//! - top-level values and array children use the enclosing base
//! - children of a fixed array use the fixed array's tail start minus the
//!   size of the children's heads

use alloy_primitives::{Address, I256, U256};
use chainabi_core::{
    config::CodecConfig,
    error::{AbiError, Result},
    param::ParamType,
    token::Token,
    word::{self, Word, WORD_SIZE},
};
use std::{cell::Cell, iter};

use crate::mediate::tail_len_of;

/// ABI decoder. Holds only configuration.
#[derive(Debug, Default, Clone)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Decode `types` from a word sequence (see [`word::split_words`]).
    ///
    /// # Errors
    /// - `TruncatedData` if a required word lies past the end
    /// - `MalformedInput` for misaligned pointers, non-0/1 bools, invalid
    ///   UTF-8, or once the element budget is spent
    /// - `OutOfRange` for pointers or lengths that overflow `usize`
    /// - `NestingTooDeep` past the configured depth
    pub fn decode(&self, types: &[ParamType], words: &[Word]) -> Result<Vec<Token>> {
        let budget = self.config.element_budget(words.len());
        let walker = Walker {
            words,
            max_depth: self.config.max_depth,
            budget,
            remaining: Cell::new(budget),
        };
        let heads: usize = types.iter().map(ParamType::head_words).sum();
        let tokens = walker.decode_list(types.iter(), 0, heads, 0, 1)?;
        tracing::debug!(
            types = types.len(),
            words = words.len(),
            elements = budget - walker.remaining.get(),
            "abi decoded"
        );
        Ok(tokens)
    }

    /// Decode from raw bytes.
    pub fn decode_bytes(&self, types: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
        self.decode(types, &word::split_bytes(data))
    }

    /// Decode from a hex string, optionally `0x`-prefixed.
    pub fn decode_hex(&self, types: &[ParamType], data: &str) -> Result<Vec<Token>> {
        self.decode(types, &word::split_words(data)?)
    }
}

/// Decode with the default configuration.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
    Decoder::new().decode_bytes(types, data)
}

/// Decode a hex string with the default configuration.
pub fn decode_hex(types: &[ParamType], data: &str) -> Result<Vec<Token>> {
    Decoder::new().decode_hex(types, data)
}

struct Walker<'a> {
    words: &'a [Word],
    max_depth: usize,
    budget: usize,
    /// Elements still allowed. Pointers may alias, so without this a few
    /// words could describe an exponentially large value.
    remaining: Cell<usize>,
}

impl<'a> Walker<'a> {
    fn peek(&self, position: usize) -> Result<&'a Word> {
        self.words.get(position).ok_or(AbiError::TruncatedData {
            needed: position.saturating_add(1),
            available: self.words.len(),
        })
    }

    fn ensure(&self, position: usize, count: usize) -> Result<()> {
        let needed = position.saturating_add(count);
        if needed > self.words.len() {
            return Err(AbiError::TruncatedData {
                needed,
                available: self.words.len(),
            });
        }
        Ok(())
    }

    fn charge(&self) -> Result<()> {
        match self.remaining.get().checked_sub(1) {
            Some(left) => {
                self.remaining.set(left);
                Ok(())
            }
            None => Err(AbiError::malformed(format!(
                "element budget of {} exhausted",
                self.budget
            ))),
        }
    }

    /// Word position a pointer at `position` refers to.
    fn follow(&self, ty: &ParamType, position: usize, base: usize) -> Result<usize> {
        let pointer = word::word_to_usize(self.peek(position)?)?;
        if pointer % WORD_SIZE != 0 {
            return Err(AbiError::malformed(format!(
                "offset {pointer:#x} for {ty} is not word aligned"
            )));
        }
        Ok(base.saturating_add(pointer / WORD_SIZE))
    }

    /// Decode a sibling list whose heads start at word `head` and whose
    /// tails start at word `tail`. Pointers resolve against `base`.
    fn decode_list<'t, I>(
        &self,
        types: I,
        head: usize,
        tail: usize,
        base: usize,
        depth: usize,
    ) -> Result<Vec<Token>>
    where
        I: Iterator<Item = &'t ParamType>,
    {
        let mut tokens = Vec::new();
        let mut cursor = head;
        let mut tail = tail;
        for ty in types {
            if depth > self.max_depth {
                return Err(AbiError::NestingTooDeep { limit: self.max_depth });
            }
            let token = self.decode_one(ty, cursor, tail, base, depth)?;
            cursor = cursor.saturating_add(ty.head_words());
            tail = tail.saturating_add(tail_len_of(&token) / WORD_SIZE);
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn decode_one(
        &self,
        ty: &ParamType,
        cursor: usize,
        tail: usize,
        base: usize,
        depth: usize,
    ) -> Result<Token> {
        match ty {
            ParamType::FixedArray(inner, len) => {
                let heads = ty.head_words();
                self.ensure(cursor, heads)?;
                let own_base = tail.checked_sub(heads).ok_or_else(|| {
                    AbiError::malformed(format!("{ty} heads overlap its tail"))
                })?;
                let items = self.decode_list(
                    iter::repeat(inner.as_ref()).take(*len),
                    cursor,
                    tail,
                    own_base,
                    depth + 1,
                )?;
                Ok(Token::FixedArray(items))
            }
            ParamType::Bytes => {
                let position = self.follow(ty, cursor, base)?;
                self.charge()?;
                self.take_bytes(position).map(Token::Bytes)
            }
            ParamType::String => {
                let position = self.follow(ty, cursor, base)?;
                self.charge()?;
                let bytes = self.take_bytes(position)?;
                String::from_utf8(bytes)
                    .map(Token::String)
                    .map_err(|e| AbiError::malformed(format!("string is not UTF-8: {e}")))
            }
            ParamType::Array(inner) => {
                let position = self.follow(ty, cursor, base)?;
                self.charge()?;
                let count = word::word_to_usize(self.peek(position)?)?;
                // Every element needs at least one head word; reject hostile
                // counts before iterating.
                let heads = count.saturating_mul(inner.head_words());
                self.ensure(position + 1, count.saturating_mul(inner.head_words().max(1)))?;
                let items = self.decode_list(
                    iter::repeat(inner.as_ref()).take(count),
                    position + 1,
                    position + 1 + heads,
                    base,
                    depth + 1,
                )?;
                Ok(Token::Array(items))
            }
            _ => {
                let slot = self.peek(cursor)?;
                self.charge()?;
                decode_word(ty, slot)
            }
        }
    }

    /// Read `[length word][payload]` at `position`.
    fn take_bytes(&self, position: usize) -> Result<Vec<u8>> {
        let len = word::word_to_usize(self.peek(position)?)?;
        let words = len.div_ceil(WORD_SIZE);
        self.ensure(position + 1, words)?;
        let mut bytes: Vec<u8> = self.words[position + 1..position + 1 + words]
            .iter()
            .flatten()
            .copied()
            .collect();
        bytes.truncate(len);
        Ok(bytes)
    }
}

/// Read a single-word value.
fn decode_word(ty: &ParamType, slot: &Word) -> Result<Token> {
    match ty {
        ParamType::Address => Ok(Token::Address(Address::from_slice(&slot[12..]))),
        ParamType::Bool => match U256::from_be_bytes(*slot) {
            v if v.is_zero() => Ok(Token::Bool(false)),
            v if v == U256::from(1u64) => Ok(Token::Bool(true)),
            v => Err(AbiError::malformed(format!("bool word {v} is not 0 or 1"))),
        },
        ParamType::Int(_) => Ok(Token::Int(I256::from_raw(U256::from_be_bytes(*slot)))),
        ParamType::Uint(_) => Ok(Token::Uint(U256::from_be_bytes(*slot))),
        ParamType::FixedBytes(len) if *len <= WORD_SIZE => {
            Ok(Token::FixedBytes(slot[..*len].to_vec()))
        }
        ParamType::FixedBytes(len) => Err(AbiError::malformed(format!(
            "bytes{len} exceeds one word"
        ))),
        other => Err(AbiError::mismatch("single-word type", other.to_string())),
    }
}
