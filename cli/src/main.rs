//! ChainAbi CLI: encode, decode and inspect EVM ABI payloads.
//!
//! # Commands
//! ```text
//! chainabi encode      --tokens <json>
//! chainabi decode      --types <json> --data <hex>
//! chainabi split       --data <hex>
//! chainabi selector    --signature <sig>
//! chainabi encode-call --name <fn> --types <json> --tokens <json>
//! chainabi decode-log  --event <json> --topics <hex..> --data <hex>
//! chainabi info
//! ```

use anyhow::{Context, Result};
use chainabi_core::{
    config::CodecConfig,
    param::ParamType,
    token::{tokens_from_json, Token},
    word::{self, Word},
};
use chainabi_evm::{fingerprint, Decoder, Encoder, Event, Function, LogParam, Param};
use chainabi_observability::{init_tracing, metrics::CodecOp, CodecMetrics, LogConfig};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;
use std::{path::PathBuf, time::Instant};

#[derive(Parser)]
#[command(
    name = "chainabi",
    about = "EVM contract ABI codec: ChainAbi CLI",
    long_about = "
ChainAbi CLI: encode token lists to ABI hex, decode ABI hex back to tokens,
build calldata and decode event logs.

Tokens are JSON objects of the form {\"type\": <tag>, \"value\": <value>} with
tags address, bool, int, uint, fixedBytes, bytes, string, fixedArray, array.
Types are JSON, e.g. \"address\", {\"uint\": 256}, {\"array\": \"string\"}.
",
    version
)]
struct Cli {
    /// JSON config file with optional `codec` and `log` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the maximum array nesting depth
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Log level: trace | debug | info | warn | error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON structured logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON token list to ABI hex
    Encode {
        /// JSON array of tokens, e.g. '[{"type":"uint","value":"4"}]'
        #[arg(long)]
        tokens: String,
    },

    /// Decode ABI hex into tokens
    Decode {
        /// JSON array of types, e.g. '["address", {"uint": 256}]'
        #[arg(long)]
        types: String,
        /// ABI-encoded data (0x-prefixed hex)
        #[arg(long)]
        data: String,
    },

    /// Split hex data into 32-byte words
    Split {
        #[arg(long)]
        data: String,
    },

    /// Compute the 4-byte selector of a canonical signature
    Selector {
        /// e.g. 'transfer(address,uint256)'
        #[arg(long)]
        signature: String,
    },

    /// Encode a function call to ABI calldata
    #[command(name = "encode-call")]
    EncodeCall {
        /// Function name
        #[arg(long)]
        name: String,
        /// JSON array of input types
        #[arg(long)]
        types: String,
        /// JSON array of argument tokens
        #[arg(long)]
        tokens: String,
    },

    /// Decode an EVM event log from raw topics + data
    #[command(name = "decode-log")]
    DecodeLog {
        /// Event description as JSON: {"name", "inputs": [{"name","kind","indexed"}], "anonymous"}
        #[arg(long)]
        event: String,
        /// topics[0] = event signature hash, topics[1..] = indexed params
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,
        /// Non-indexed params (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
    },

    /// Show ChainAbi build and capability info
    Info,
}

/// Contents of the `--config` file.
#[derive(Debug, Default, Deserialize)]
struct CliConfig {
    #[serde(default)]
    codec: CodecConfig,
    #[serde(default)]
    log: LogConfig,
}

impl CliConfig {
    fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("read config file '{}'", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parse config file '{}'", path.display()))?
            }
            None => CliConfig::default(),
        };
        if let Some(depth) = cli.max_depth {
            config.codec.max_depth = depth;
        }
        if let Some(level) = &cli.log_level {
            config.log.level = level.clone();
        }
        if cli.json_logs {
            config.log.json = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(&cli)?;
    init_tracing(&config.log);

    let codec = Codec {
        encoder: Encoder::with_config(config.codec.clone()),
        decoder: Decoder::with_config(config.codec.clone()),
        metrics: CodecMetrics::global(),
    };

    match cli.command {
        Commands::Encode { tokens } => cmd_encode(&codec, &tokens),
        Commands::Decode { types, data } => cmd_decode(&codec, &types, &data),
        Commands::Split { data } => cmd_split(&data),
        Commands::Selector { signature } => cmd_selector(&signature),
        Commands::EncodeCall { name, types, tokens } => {
            cmd_encode_call(&codec, &name, &types, &tokens)
        }
        Commands::DecodeLog { event, topics, data } => {
            cmd_decode_log(&codec, &event, &topics, &data)
        }
        Commands::Info => cmd_info(&config.codec),
    }
}

/// Encoder and decoder sharing one config, with metrics around each call.
struct Codec {
    encoder: Encoder,
    decoder: Decoder,
    metrics: CodecMetrics,
}

impl Codec {
    fn encode(&self, tokens: &[Token]) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = self.encoder.encode(tokens);
        self.metrics
            .record_latency(CodecOp::Encode, start.elapsed().as_secs_f64() * 1000.0);
        match result {
            Ok(bytes) => {
                self.metrics.record_encoded(bytes.len());
                Ok(bytes)
            }
            Err(e) => {
                self.metrics.record_error(CodecOp::Encode, &e);
                Err(e).context("encode tokens")
            }
        }
    }

    fn encode_call(&self, function: &Function, args: &[Token]) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = function.encode_input_with(&self.encoder, args);
        self.metrics
            .record_latency(CodecOp::Encode, start.elapsed().as_secs_f64() * 1000.0);
        match result {
            Ok(calldata) => {
                self.metrics.record_encoded(calldata.len());
                Ok(calldata)
            }
            Err(e) => {
                self.metrics.record_error(CodecOp::Encode, &e);
                Err(e).with_context(|| format!("encode call to {}", function.signature()))
            }
        }
    }

    fn decode_log(&self, event: &Event, topics: &[Word], data: &[u8]) -> Result<Vec<LogParam>> {
        let start = Instant::now();
        let result = event.decode_log_with(&self.decoder, topics, data);
        self.metrics
            .record_latency(CodecOp::Decode, start.elapsed().as_secs_f64() * 1000.0);
        match result {
            Ok(params) => {
                self.metrics.record_decoded(params.len());
                Ok(params)
            }
            Err(e) => {
                self.metrics.record_error(CodecOp::Decode, &e);
                Err(e).with_context(|| format!("decode log for {}", event.signature()))
            }
        }
    }

    fn decode(&self, types: &[ParamType], words: &[Word]) -> Result<Vec<Token>> {
        let start = Instant::now();
        let result = self.decoder.decode(types, words);
        self.metrics
            .record_latency(CodecOp::Decode, start.elapsed().as_secs_f64() * 1000.0);
        match result {
            Ok(tokens) => {
                self.metrics.record_decoded(tokens.len());
                Ok(tokens)
            }
            Err(e) => {
                self.metrics.record_error(CodecOp::Decode, &e);
                Err(e).context("decode data")
            }
        }
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

fn parse_tokens(json: &str) -> Result<Vec<Token>> {
    let value: Value = serde_json::from_str(json).context("parse tokens JSON")?;
    Ok(tokens_from_json(&value)?)
}

fn parse_types(json: &str) -> Result<Vec<ParamType>> {
    serde_json::from_str(json).context("parse types JSON")
}

fn decode_hex_arg(data: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(data.strip_prefix("0x").unwrap_or(data))
        .with_context(|| format!("invalid {what} hex"))
}

fn cmd_encode(codec: &Codec, tokens_json: &str) -> Result<()> {
    let tokens = parse_tokens(tokens_json)?;
    let encoded = codec.encode(&tokens)?;
    println!("0x{}", hex::encode(encoded));
    Ok(())
}

fn cmd_decode(codec: &Codec, types_json: &str, data: &str) -> Result<()> {
    let types = parse_types(types_json)?;
    let words = word::split_words(data)?;
    let tokens = codec.decode(&types, &words)?;
    let out: Vec<Value> = tokens.iter().map(Token::to_json).collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_split(data: &str) -> Result<()> {
    for (i, w) in word::split_words(data)?.iter().enumerate() {
        println!("{:>4}  0x{}", format!("{:#x}", i * word::WORD_SIZE), hex::encode(w));
    }
    Ok(())
}

fn cmd_selector(signature: &str) -> Result<()> {
    println!("0x{}", hex::encode(fingerprint::selector_of(signature)));
    Ok(())
}

fn cmd_encode_call(codec: &Codec, name: &str, types_json: &str, tokens_json: &str) -> Result<()> {
    let types = parse_types(types_json)?;
    let function = Function {
        name: name.to_string(),
        inputs: types
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Param::new(format!("arg{i}"), kind))
            .collect(),
        outputs: Vec::new(),
    };
    let args = parse_tokens(tokens_json)?;
    let calldata = codec.encode_call(&function, &args)?;
    tracing::info!(signature = %function.signature(), bytes = calldata.len(), "calldata built");
    println!("0x{}", hex::encode(calldata));
    Ok(())
}

fn cmd_decode_log(codec: &Codec, event_json: &str, topics: &[String], data: &str) -> Result<()> {
    let event: Event = serde_json::from_str(event_json).context("parse event JSON")?;
    let topics: Vec<Word> = topics
        .iter()
        .map(|t| {
            let bytes = decode_hex_arg(t, "topic")?;
            Word::try_from(bytes.as_slice())
                .map_err(|_| anyhow::anyhow!("topic {t} is not 32 bytes"))
        })
        .collect::<Result<_>>()?;
    let data = decode_hex_arg(data, "data")?;

    let params = codec.decode_log(&event, &topics, &data)?;

    let out: serde_json::Map<String, Value> = params
        .into_iter()
        .map(|p| (p.name, p.value.to_json()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_info(codec: &CodecConfig) -> Result<()> {
    println!("ChainAbi v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Token types:   address, bool, int, uint, fixedBytes, bytes, string, fixedArray, array");
    println!("Word size:     {} bytes", word::WORD_SIZE);
    println!("Max depth:     {}", codec.max_depth);
    println!("Selectors:     keccak256(signature)[..4]");
    println!();
    println!("Crates:");
    println!("  chainabi-core           token model, types, word primitives");
    println!("  chainabi-evm            encoder, decoder, functions, events");
    println!("  chainabi-observability  metrics + structured logging");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::parse_from([
            "chainabi",
            "--max-depth",
            "4",
            "--log-level",
            "debug",
            "--json-logs",
            "info",
        ]);
        let config = CliConfig::load(&cli).unwrap();
        assert_eq!(config.codec.max_depth, 4);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.json);
    }

    #[test]
    fn config_file_sections_are_optional() {
        let config: CliConfig = serde_json::from_str(r#"{"codec": {"max_depth": 8}}"#).unwrap();
        assert_eq!(config.codec.max_depth, 8);
        assert_eq!(config.log.level, "warn");
    }

    fn test_codec() -> Codec {
        Codec {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            metrics: CodecMetrics::global(),
        }
    }

    #[test]
    fn encode_call_goes_through_codec() {
        let function = Function {
            name: "transfer".into(),
            inputs: parse_types(r#"["address", {"uint": 256}]"#)
                .unwrap()
                .into_iter()
                .enumerate()
                .map(|(i, kind)| Param::new(format!("arg{i}"), kind))
                .collect(),
            outputs: Vec::new(),
        };
        let args = parse_tokens(
            r#"[{"type":"address","value":"0x0000000000000000000000000000000000000001"},{"type":"uint","value":"5"}]"#,
        )
        .unwrap();
        let calldata = test_codec().encode_call(&function, &args).unwrap();
        assert_eq!(calldata[..4], function.selector());
        assert_eq!(calldata.len(), 4 + 64);

        let err = test_codec().encode_call(&function, &args[..1]).unwrap_err();
        assert!(err.to_string().contains("transfer(address,uint256)"));
    }

    #[test]
    fn parse_types_from_json() {
        let types = parse_types(r#"["address", {"array": {"uint": 256}}]"#).unwrap();
        assert_eq!(types[1].to_string(), "uint256[]");
    }
}
