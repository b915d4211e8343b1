//! # chainabi-observability
//!
//! Logging and metrics for the ChainAbi codec.
//!
//! ## Built-in metrics
//! - `chainabi.encodes`: counter of successful encodes
//! - `chainabi.decodes`: counter of successful decodes
//! - `chainabi.codec_errors`: counter, tagged with op + error_type
//! - `chainabi.encoded_bytes`: histogram of encoded payload sizes
//! - `chainabi.latency_ms`: histogram, tagged with op
//!
//! ## Structured logging
//! Human-readable or JSON logs, with per-component levels.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::CodecMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
