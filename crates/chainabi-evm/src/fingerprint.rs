//! Keccak-256 fingerprints for function selectors and event topics.
//!
//! A function selector is the first 4 bytes of
//! `keccak256("transfer(address,uint256)")`; an event's topic 0 is the full
//! 32-byte hash of its signature.

use chainabi_core::word::Word;
use tiny_keccak::{Hasher, Keccak};

pub fn keccak256(data: &[u8]) -> Word {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// First 4 bytes of the signature hash.
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
