//! Rayon-powered batch helpers.
//!
//! Encode and decode are pure, so independent invocations run on the rayon
//! pool without coordination. Each item's result keeps its input index.

use chainabi_core::{error::AbiError, param::ParamType, token::Token};
use rayon::prelude::*;

use crate::{decoder::Decoder, encoder::Encoder};

/// Encode many token lists in parallel. Returns `(successes, errors)`,
/// each tagged with the input index.
pub fn encode_many(
    encoder: &Encoder,
    calls: &[Vec<Token>],
) -> (Vec<(usize, Vec<u8>)>, Vec<(usize, AbiError)>) {
    let results: Vec<(usize, Result<Vec<u8>, AbiError>)> = calls
        .par_iter()
        .enumerate()
        .map(|(idx, tokens)| (idx, encoder.encode(tokens)))
        .collect();
    split_results(results)
}

/// Decode many payloads against the same type list in parallel.
pub fn decode_many(
    decoder: &Decoder,
    types: &[ParamType],
    payloads: &[Vec<u8>],
) -> (Vec<(usize, Vec<Token>)>, Vec<(usize, AbiError)>) {
    let results: Vec<(usize, Result<Vec<Token>, AbiError>)> = payloads
        .par_iter()
        .enumerate()
        .map(|(idx, data)| (idx, decoder.decode_bytes(types, data)))
        .collect();
    split_results(results)
}

fn split_results<T>(
    results: Vec<(usize, Result<T, AbiError>)>,
) -> (Vec<(usize, T)>, Vec<(usize, AbiError)>) {
    let mut ok = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (idx, r) in results {
        match r {
            Ok(v) => ok.push((idx, v)),
            Err(e) => errors.push((idx, e)),
        }
    }
    if !errors.is_empty() {
        tracing::debug!(failed = errors.len(), total = ok.len() + errors.len(), "batch had failures");
    }
    (ok, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn encode_many_keeps_indices() {
        let calls = vec![
            vec![Token::Uint(U256::from(1u64))],
            vec![Token::FixedBytes(vec![0; 40])],
            vec![Token::Bool(true)],
        ];
        let (ok, errors) = encode_many(&Encoder::new(), &calls);
        assert_eq!(ok.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, 1);
    }

    #[test]
    fn decode_many_round_trip() {
        let encoder = Encoder::new();
        let payloads: Vec<Vec<u8>> = (0..16u64)
            .map(|n| encoder.encode(&[Token::Uint(U256::from(n))]).unwrap())
            .collect();
        let (ok, errors) = decode_many(&Decoder::new(), &[ParamType::Uint(256)], &payloads);
        assert!(errors.is_empty());
        for (idx, tokens) in ok {
            assert_eq!(tokens, vec![Token::Uint(U256::from(idx as u64))]);
        }
    }
}
