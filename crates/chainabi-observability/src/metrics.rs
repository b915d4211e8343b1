//! ChainAbi metrics definitions.
//!
//! All metrics use OpenTelemetry conventions. Without an installed meter
//! provider the global meter is a no-op.

use chainabi_core::error::AbiError;
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Which direction of the codec a measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    Encode,
    Decode,
}

impl CodecOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecOp::Encode => "encode",
            CodecOp::Decode => "decode",
        }
    }
}

/// Central metrics handle for the codec.
#[derive(Clone)]
pub struct CodecMetrics {
    pub encodes: Counter<u64>,
    pub decodes: Counter<u64>,
    pub codec_errors: Counter<u64>,
    pub encoded_bytes: Histogram<u64>,
    pub latency_ms: Histogram<f64>,
}

impl CodecMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            encodes: meter
                .u64_counter("chainabi.encodes")
                .with_description("Token lists successfully encoded")
                .build(),
            decodes: meter
                .u64_counter("chainabi.decodes")
                .with_description("Payloads successfully decoded")
                .build(),
            codec_errors: meter
                .u64_counter("chainabi.codec_errors")
                .with_description("Encode or decode calls that failed")
                .build(),
            encoded_bytes: meter
                .u64_histogram("chainabi.encoded_bytes")
                .with_description("Size of encoded payloads in bytes")
                .build(),
            latency_ms: meter
                .f64_histogram("chainabi.latency_ms")
                .with_description("Time spent in a single encode or decode in milliseconds")
                .build(),
        }
    }

    /// Metrics bound to the global meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("chainabi"))
    }

    pub fn record_encoded(&self, bytes: usize) {
        self.encodes.add(1, &[]);
        self.encoded_bytes.record(bytes as u64, &[]);
    }

    pub fn record_decoded(&self, tokens: usize) {
        self.decodes
            .add(1, &[KeyValue::new("tokens", tokens as i64)]);
    }

    pub fn record_error(&self, op: CodecOp, error: &AbiError) {
        self.codec_errors.add(
            1,
            &[
                KeyValue::new("op", op.as_str()),
                KeyValue::new("error_type", error.kind()),
            ],
        );
    }

    pub fn record_latency(&self, op: CodecOp, ms: f64) {
        self.latency_ms
            .record(ms, &[KeyValue::new("op", op.as_str())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_meter_accepts_measurements() {
        let metrics = CodecMetrics::global();
        metrics.record_encoded(64);
        metrics.record_decoded(2);
        metrics.record_error(CodecOp::Decode, &AbiError::TruncatedData { needed: 2, available: 1 });
        metrics.record_latency(CodecOp::Encode, 0.5);
    }

    #[test]
    fn op_labels() {
        assert_eq!(CodecOp::Encode.as_str(), "encode");
        assert_eq!(CodecOp::Decode.as_str(), "decode");
    }
}
