//! Contract functions: selectors, calldata encoding and result decoding.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4]
//! - Remaining bytes = ABI-encoded inputs
//! - Return data carries no selector; it is the ABI-encoded outputs

use chainabi_core::{
    error::{AbiError, Result},
    param::{join_types, ParamType},
    token::Token,
};
use serde::{Deserialize, Serialize};

use crate::{decoder::Decoder, encoder::Encoder, fingerprint};

/// A named function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    pub kind: ParamType,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A contract function as described by its ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
}

impl Function {
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, join_types(&self.input_types()))
    }

    pub fn selector(&self) -> [u8; 4] {
        fingerprint::selector_of(&self.signature())
    }

    /// Build calldata: `selector ++ encode(args)`.
    ///
    /// # Errors
    /// `TypeMismatch` when the argument count or any argument's shape does
    /// not match the declared inputs.
    pub fn encode_input(&self, args: &[Token]) -> Result<Vec<u8>> {
        self.encode_input_with(&Encoder::new(), args)
    }

    pub fn encode_input_with(&self, encoder: &Encoder, args: &[Token]) -> Result<Vec<u8>> {
        check_arguments(&self.inputs, args)?;
        let mut calldata = self.selector().to_vec();
        calldata.extend(encoder.encode(args)?);
        Ok(calldata)
    }

    /// Decode full calldata (selector included) back into input tokens.
    pub fn decode_input(&self, calldata: &[u8]) -> Result<Vec<Token>> {
        self.decode_input_with(&Decoder::new(), calldata)
    }

    pub fn decode_input_with(&self, decoder: &Decoder, calldata: &[u8]) -> Result<Vec<Token>> {
        if calldata.len() < 4 {
            return Err(AbiError::malformed(format!(
                "calldata too short: {} bytes (need at least 4 for selector)",
                calldata.len()
            )));
        }
        let selector = self.selector();
        if calldata[..4] != selector {
            return Err(AbiError::mismatch(
                format!("selector 0x{}", hex::encode(selector)),
                format!("0x{}", hex::encode(&calldata[..4])),
            ));
        }
        decoder.decode_bytes(&self.input_types(), &calldata[4..])
    }

    /// Decode `eth_call` return data into output tokens.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>> {
        self.decode_output_with(&Decoder::new(), data)
    }

    pub fn decode_output_with(&self, decoder: &Decoder, data: &[u8]) -> Result<Vec<Token>> {
        decoder.decode_bytes(&self.output_types(), data)
    }
}

fn check_arguments(params: &[Param], args: &[Token]) -> Result<()> {
    if params.len() != args.len() {
        return Err(AbiError::mismatch(
            format!("{} arguments", params.len()),
            args.len().to_string(),
        ));
    }
    for (param, arg) in params.iter().zip(args) {
        if !arg.type_check(&param.kind) {
            return Err(AbiError::mismatch(
                format!("{} for '{}'", param.kind, param.name),
                arg.kind().to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn transfer() -> Function {
        Function {
            name: "transfer".into(),
            inputs: vec![
                Param::new("to", ParamType::Address),
                Param::new("amount", ParamType::Uint(256)),
            ],
            outputs: vec![Param::new("", ParamType::Bool)],
        }
    }

    #[test]
    fn signature_and_selector() {
        let f = transfer();
        assert_eq!(f.signature(), "transfer(address,uint256)");
        assert_eq!(hex::encode(f.selector()), "a9059cbb");
    }

    #[test]
    fn encode_transfer() {
        let to: Address = Address::from([0xd8u8; 20]);
        let calldata = transfer()
            .encode_input(&[Token::Address(to), Token::Uint(U256::from(1_000_000u64))])
            .unwrap();
        assert_eq!(&calldata[..4], hex::decode("a9059cbb").unwrap().as_slice());
        // 4 + 32 + 32
        assert_eq!(calldata.len(), 68);
    }

    #[test]
    fn roundtrip_encode_decode() {
        let args = vec![
            Token::Address(Address::from([0xabu8; 20])),
            Token::Uint(U256::from(999_888u64)),
        ];
        let f = transfer();
        let calldata = f.encode_input(&args).unwrap();
        assert_eq!(f.decode_input(&calldata).unwrap(), args);
    }

    #[test]
    fn wrong_arg_count_returns_error() {
        let err = transfer()
            .encode_input(&[Token::Uint(U256::from(1u64))])
            .unwrap_err();
        assert!(matches!(err, AbiError::TypeMismatch { .. }));
    }

    #[test]
    fn wrong_arg_type_returns_error() {
        let err = transfer()
            .encode_input(&[Token::Bool(true), Token::Uint(U256::from(1u64))])
            .unwrap_err();
        assert!(matches!(err, AbiError::TypeMismatch { .. }));
    }

    #[test]
    fn selector_mismatch() {
        let mut calldata = transfer()
            .encode_input(&[Token::Address(Address::ZERO), Token::Uint(U256::ZERO)])
            .unwrap();
        calldata[0] ^= 0xff;
        assert!(matches!(
            transfer().decode_input(&calldata),
            Err(AbiError::TypeMismatch { .. })
        ));
        assert!(matches!(
            transfer().decode_input(&[0xa9]),
            Err(AbiError::MalformedInput { .. })
        ));
    }

    #[test]
    fn decode_input_honours_decoder_config() {
        let function = Function {
            name: "batch".into(),
            inputs: vec![Param::new(
                "groups",
                ParamType::Array(Box::new(ParamType::Array(Box::new(ParamType::Address)))),
            )],
            outputs: vec![],
        };
        let args = vec![Token::Array(vec![Token::Array(vec![Token::Address(Address::ZERO)])])];
        let calldata = function.encode_input(&args).unwrap();

        assert_eq!(function.decode_input(&calldata).unwrap(), args);
        let shallow = Decoder::with_config(chainabi_core::config::CodecConfig::with_max_depth(1));
        assert!(matches!(
            function.decode_input_with(&shallow, &calldata),
            Err(AbiError::NestingTooDeep { limit: 1 })
        ));
    }

    #[test]
    fn decode_bool_output() {
        let mut data = [0u8; 32];
        data[31] = 1;
        assert_eq!(transfer().decode_output(&data).unwrap(), vec![Token::Bool(true)]);
    }

    #[test]
    fn function_from_json() {
        let f: Function = serde_json::from_str(
            r#"{
                "name": "transfer",
                "inputs": [
                    { "name": "to", "kind": "address" },
                    { "name": "amount", "kind": { "uint": 256 } }
                ],
                "outputs": [{ "kind": "bool" }]
            }"#,
        )
        .unwrap();
        assert_eq!(f, transfer());
    }
}
