//! Event log decoding.
//!
//! # EVM log layout
//! - `topics[0]` → keccak256 of the event signature (absent for anonymous
//!   events)
//! - `topics[1..]` → indexed parameters, one word each
//! - `data` → non-indexed parameters, ABI-encoded as one sibling list
//!
//! Indexed value types (uint, int, bool, address, bytesN) are stored
//! verbatim in their topic. Indexed strings, bytes and arrays are stored as
//! the keccak256 of their encoding, so the original value is unrecoverable;
//! those come back as the raw 32-byte topic in a `FixedBytes` token.

use chainabi_core::{
    error::{AbiError, Result},
    param::{join_types, ParamType},
    token::Token,
    word::Word,
};
use serde::{Deserialize, Serialize};

use crate::{decoder::Decoder, fingerprint};

/// A named event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParam {
    #[serde(default)]
    pub name: String,
    pub kind: ParamType,
    #[serde(default)]
    pub indexed: bool,
}

/// A contract event as described by its ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<EventParam>,
    #[serde(default)]
    pub anonymous: bool,
}

/// One decoded log parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogParam {
    pub name: String,
    pub value: Token,
}

impl Event {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<ParamType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        format!("{}({})", self.name, join_types(&types))
    }

    /// topics[0] of a non-anonymous log.
    pub fn signature_topic(&self) -> Word {
        fingerprint::keccak256(self.signature().as_bytes())
    }

    /// Decode a log into its parameters, in declaration order.
    ///
    /// # Errors
    /// `TypeMismatch` when the topic count does not match the indexed
    /// parameters or topic 0 is not this event's signature; every decoder
    /// error for the data section.
    pub fn decode_log(&self, topics: &[Word], data: &[u8]) -> Result<Vec<LogParam>> {
        self.decode_log_with(&Decoder::new(), topics, data)
    }

    pub fn decode_log_with(
        &self,
        decoder: &Decoder,
        topics: &[Word],
        data: &[u8],
    ) -> Result<Vec<LogParam>> {
        let indexed_count = self.inputs.iter().filter(|p| p.indexed).count();
        let expected_topics = indexed_count + usize::from(!self.anonymous);
        if topics.len() != expected_topics {
            return Err(AbiError::mismatch(
                format!("{expected_topics} topics for {}", self.signature()),
                topics.len().to_string(),
            ));
        }

        let indexed_topics = if self.anonymous {
            topics
        } else {
            let signature_topic = self.signature_topic();
            if topics[0] != signature_topic {
                return Err(AbiError::mismatch(
                    format!("topic 0x{}", hex::encode(signature_topic)),
                    format!("0x{}", hex::encode(topics[0])),
                ));
            }
            &topics[1..]
        };

        let data_types: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let decoded = if data_types.is_empty() {
            Vec::new()
        } else {
            decoder.decode_bytes(&data_types, data)?
        };
        let mut data_tokens = decoded.into_iter();

        let mut topic_iter = indexed_topics.iter();
        let mut params = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let value = if input.indexed {
                let topic = topic_iter
                    .next()
                    .ok_or_else(|| AbiError::mismatch("indexed topic", "none"))?;
                decode_topic(decoder, &input.kind, topic)?
            } else {
                data_tokens
                    .next()
                    .ok_or_else(|| AbiError::mismatch(input.kind.to_string(), "none"))?
            };
            params.push(LogParam {
                name: input.name.clone(),
                value,
            });
        }

        tracing::debug!(event = %self.name, params = params.len(), "log decoded");
        Ok(params)
    }
}

fn decode_topic(decoder: &Decoder, kind: &ParamType, topic: &Word) -> Result<Token> {
    if !kind.is_value_type() {
        return Ok(Token::FixedBytes(topic.to_vec()));
    }
    let mut tokens = decoder.decode(std::slice::from_ref(kind), std::slice::from_ref(topic))?;
    tokens
        .pop()
        .ok_or_else(|| AbiError::mismatch(kind.to_string(), "empty topic"))
}
