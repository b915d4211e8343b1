//! # chainabi-evm
//!
//! The EVM contract-call ABI codec.
//!
//! ## Implementation notes
//! - Tokens are lowered into head/tail nodes (`mediate`) before any byte is
//!   written, because sibling pointers depend on the total head size
//! - Top-level and array element pointers count from the start of the
//!   encoding; fixed-array element pointers count from the fixed array's
//!   own heads
//! - Function selectors and event topics are keccak256 of the canonical
//!   signature

pub mod batch;
pub mod decoder;
pub mod encoder;
pub mod event;
pub mod fingerprint;
pub mod function;
mod mediate;

pub use decoder::{decode, decode_hex, Decoder};
pub use encoder::{encode, encode_hex, Encoder};
pub use event::{Event, EventParam, LogParam};
pub use function::{Function, Param};
