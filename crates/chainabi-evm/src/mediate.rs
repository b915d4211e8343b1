//! Lowering pass: `Token` → `Mediate`.
//!
//! Every lowered node answers the same four questions (head length, tail
//! length, head bytes, tail bytes), so nested arrays and fixed arrays of
//! dynamic elements fall out of one recursive rule with no static/dynamic
//! flag.
//!
//! Offsets handed to a sibling list follow `Mediate::offset_for`:
//! - top-level tokens get `offset_for(tokens, i)`
//! - a fixed array ignores its own offset; child `j` gets
//!   `offset_for(children, j)`
//! - an array's child `j` gets `offset + 32 + offset_for(children, j)`,
//!   the extra word being the array's count

use chainabi_core::{
    error::{AbiError, Result},
    token::Token,
    word::{self, Word, WORD_SIZE},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mediate {
    /// One word of head data, no tail.
    Raw(Word),
    /// Pointer in the head; tail is `[length word][payload padded to 32]`.
    Prefixed(Vec<u8>),
    /// Children heads inline in the head, children tails in the tail.
    FixedArray(Vec<Mediate>),
    /// Pointer in the head; tail is `[count word][children heads][children tails]`.
    Array(Vec<Mediate>),
}

impl Mediate {
    /// Lower one token. `depth` is the nesting level of `token` (top level
    /// is 1); anything past `max_depth` fails with `NestingTooDeep`.
    pub(crate) fn lower(token: &Token, depth: usize, max_depth: usize) -> Result<Self> {
        if depth > max_depth {
            return Err(AbiError::NestingTooDeep { limit: max_depth });
        }
        let node = match token {
            Token::Address(a) => Mediate::Raw(word::pad_address(a)),
            Token::Bool(b) => Mediate::Raw(word::pad_bool(*b)),
            Token::Int(i) => Mediate::Raw(word::pad_i256(i)),
            Token::Uint(u) => Mediate::Raw(word::pad_u256(u)),
            Token::FixedBytes(b) => Mediate::Raw(word::pad_fixed_bytes(b)?),
            Token::Bytes(b) => Mediate::prefixed(b),
            Token::String(s) => Mediate::prefixed(s.as_bytes()),
            Token::FixedArray(items) => {
                Mediate::FixedArray(Self::lower_all(items, depth + 1, max_depth)?)
            }
            Token::Array(items) => Mediate::Array(Self::lower_all(items, depth + 1, max_depth)?),
        };
        tracing::trace!(depth, kind = %token.kind(), head = node.head_len(), tail = node.tail_len(), "lowered token");
        Ok(node)
    }

    pub(crate) fn lower_all(tokens: &[Token], depth: usize, max_depth: usize) -> Result<Vec<Self>> {
        tokens
            .iter()
            .map(|t| Self::lower(t, depth, max_depth))
            .collect()
    }

    fn prefixed(bytes: &[u8]) -> Self {
        let mut payload = word::pad_usize(bytes.len()).to_vec();
        payload.extend(word::pad_raw_bytes(bytes));
        Mediate::Prefixed(payload)
    }

    pub(crate) fn head_len(&self) -> usize {
        match self {
            Mediate::Raw(_) | Mediate::Prefixed(_) | Mediate::Array(_) => WORD_SIZE,
            Mediate::FixedArray(children) => children.iter().map(Mediate::head_len).sum(),
        }
    }

    pub(crate) fn tail_len(&self) -> usize {
        match self {
            Mediate::Raw(_) => 0,
            Mediate::Prefixed(payload) => payload.len(),
            Mediate::FixedArray(children) => children.iter().map(Mediate::tail_len).sum(),
            Mediate::Array(children) => WORD_SIZE + list_len(children),
        }
    }

    /// Byte offset handed to `siblings[position]`: the whole head of the
    /// list plus the tails of the siblings before it.
    pub(crate) fn offset_for(siblings: &[Mediate], position: usize) -> usize {
        let head_total: usize = siblings.iter().map(Mediate::head_len).sum();
        head_total
            + siblings[..position]
                .iter()
                .map(Mediate::tail_len)
                .sum::<usize>()
    }

    fn emit_head(&self, offset: usize, out: &mut Vec<u8>) {
        match self {
            Mediate::Raw(word) => out.extend_from_slice(word),
            Mediate::Prefixed(_) | Mediate::Array(_) => {
                out.extend_from_slice(&word::pad_usize(offset));
            }
            Mediate::FixedArray(children) => {
                for (child, child_offset) in children.iter().zip(offsets(children, 0)) {
                    child.emit_head(child_offset, out);
                }
            }
        }
    }

    fn emit_tail(&self, offset: usize, out: &mut Vec<u8>) {
        match self {
            Mediate::Raw(_) => {}
            Mediate::Prefixed(payload) => out.extend_from_slice(payload),
            Mediate::FixedArray(children) => {
                for (child, child_offset) in children.iter().zip(offsets(children, 0)) {
                    child.emit_tail(child_offset, out);
                }
            }
            Mediate::Array(children) => {
                out.extend_from_slice(&word::pad_usize(children.len()));
                let child_offsets = offsets(children, offset + WORD_SIZE);
                for (child, child_offset) in children.iter().zip(&child_offsets) {
                    child.emit_head(*child_offset, out);
                }
                for (child, child_offset) in children.iter().zip(&child_offsets) {
                    child.emit_tail(*child_offset, out);
                }
            }
        }
    }
}

/// Total encoded size of a sibling list.
fn list_len(nodes: &[Mediate]) -> usize {
    nodes.iter().map(|n| n.head_len() + n.tail_len()).sum()
}

/// `base + offset_for(nodes, i)` for every position, in one pass.
fn offsets(nodes: &[Mediate], base: usize) -> Vec<usize> {
    let mut next = base + nodes.iter().map(Mediate::head_len).sum::<usize>();
    let mut out = Vec::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        debug_assert_eq!(next - base, Mediate::offset_for(nodes, position));
        out.push(next);
        next += node.tail_len();
    }
    out
}

/// Write `head ++ tail` for the top-level token list.
pub(crate) fn encode_list(nodes: &[Mediate], out: &mut Vec<u8>) {
    let top_offsets = offsets(nodes, 0);
    for (node, offset) in nodes.iter().zip(&top_offsets) {
        node.emit_head(*offset, out);
    }
    for (node, offset) in nodes.iter().zip(&top_offsets) {
        node.emit_tail(*offset, out);
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_SIZE) * WORD_SIZE
}

/// Head length `token` would lower to, without building the node.
pub(crate) fn head_len_of(token: &Token) -> usize {
    match token {
        Token::FixedArray(items) => items.iter().map(head_len_of).sum(),
        _ => WORD_SIZE,
    }
}

/// Tail length `token` would lower to, without building the node.
pub(crate) fn tail_len_of(token: &Token) -> usize {
    match token {
        Token::Bytes(b) => WORD_SIZE + padded_len(b.len()),
        Token::String(s) => WORD_SIZE + padded_len(s.len()),
        Token::FixedArray(items) => items.iter().map(tail_len_of).sum(),
        Token::Array(items) => {
            WORD_SIZE
                + items
                    .iter()
                    .map(|t| head_len_of(t) + tail_len_of(t))
                    .sum::<usize>()
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn lower(token: &Token) -> Mediate {
        Mediate::lower(token, 1, 32).unwrap()
    }

    fn addr(b: u8) -> Token {
        Token::Address(Address::from([b; 20]))
    }

    #[test]
    fn scalars_lower_to_raw() {
        for token in [
            addr(0x11),
            Token::Bool(true),
            Token::Uint(U256::from(123u64)),
            Token::FixedBytes(vec![1, 2, 3]),
        ] {
            let node = lower(&token);
            assert!(matches!(node, Mediate::Raw(_)));
            assert_eq!((node.head_len(), node.tail_len()), (32, 0));
        }
    }

    #[test]
    fn bytes_and_string_lower_to_prefixed() {
        let node = lower(&Token::String("gavofyork".into()));
        assert!(matches!(node, Mediate::Prefixed(_)));
        assert_eq!((node.head_len(), node.tail_len()), (32, 64));

        let empty = lower(&Token::Bytes(vec![]));
        assert_eq!(empty.tail_len(), 32);
    }

    #[test]
    fn fixed_array_heads_are_inline() {
        let node = lower(&Token::FixedArray(vec![addr(1), addr(2)]));
        assert_eq!((node.head_len(), node.tail_len()), (64, 0));

        let node = lower(&Token::FixedArray(vec![
            Token::Bytes(vec![1]),
            Token::Bytes(vec![2]),
        ]));
        // one pointer per element, then two (length, payload) pairs
        assert_eq!((node.head_len(), node.tail_len()), (64, 128));
    }

    #[test]
    fn array_lengths() {
        let node = lower(&Token::Array(vec![addr(1), addr(2)]));
        assert_eq!((node.head_len(), node.tail_len()), (32, 32 + 64));
    }

    #[test]
    fn offsets_skip_earlier_tails() {
        let nodes = Mediate::lower_all(
            &[
                Token::Uint(U256::from(5u64)),
                Token::Bytes(vec![0xaa; 64]),
                Token::Uint(U256::from(3u64)),
                Token::Bytes(vec![0xbb; 64]),
            ],
            1,
            32,
        )
        .unwrap();
        assert_eq!(Mediate::offset_for(&nodes, 1), 0x80);
        assert_eq!(Mediate::offset_for(&nodes, 3), 0xe0);
    }

    #[test]
    fn fixed_array_children_point_past_its_own_heads() {
        let nodes = Mediate::lower_all(
            &[Token::FixedArray(vec![
                Token::Array(vec![addr(1), addr(2)]),
                Token::Array(vec![addr(3), addr(4)]),
            ])],
            1,
            32,
        )
        .unwrap();
        let mut out = Vec::new();
        encode_list(&nodes, &mut out);
        assert_eq!(out.len(), 8 * 32);
        assert_eq!(out[31], 0x40);
        assert_eq!(out[63], 0xa0);
        assert_eq!(out[64 + 31], 2);
        assert_eq!(out[160 + 31], 2);
    }

    #[test]
    fn array_children_are_offset_by_the_count_word() {
        let nodes = Mediate::lower_all(
            &[Token::Array(vec![
                Token::Array(vec![addr(1)]),
                Token::Array(vec![addr(2)]),
            ])],
            1,
            32,
        )
        .unwrap();
        let mut out = Vec::new();
        encode_list(&nodes, &mut out);
        let words: Vec<u8> = out.chunks(32).map(|w| w[31]).collect();
        assert_eq!(words, vec![0x20, 2, 0x80, 0xc0, 1, 1, 1, 2]);
        assert_eq!(nodes[0].tail_len(), out.len() - 32);
    }

    #[test]
    fn token_lengths_agree_with_lowering() {
        let token = Token::Array(vec![
            Token::FixedArray(vec![Token::String("ab".into()), Token::Bytes(vec![0; 33])]),
            Token::FixedArray(vec![Token::String(String::new()), Token::Bytes(vec![])]),
        ]);
        let node = lower(&token);
        assert_eq!(head_len_of(&token), node.head_len());
        assert_eq!(tail_len_of(&token), node.tail_len());

        let fixed = Token::FixedArray(vec![addr(1), Token::Array(vec![addr(2)])]);
        let node = lower(&fixed);
        assert_eq!((head_len_of(&fixed), tail_len_of(&fixed)), (node.head_len(), node.tail_len()));
    }

    #[test]
    fn depth_limit() {
        let nested = Token::Array(vec![Token::Array(vec![Token::Bool(true)])]);
        assert!(Mediate::lower(&nested, 1, 3).is_ok());
        assert!(matches!(
            Mediate::lower(&nested, 1, 2),
            Err(AbiError::NestingTooDeep { limit: 2 })
        ));
    }
}
