//! Contract ABI encoding for aggregator calls.
//!
//! The node takes the function signature and the encoded parameters
//! separately and derives the selector itself, so only the parameter block
//! is encoded here.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use thiserror::Error;

/// `submit(uint256 roundId, int256 submission)`
pub const SUBMIT_SELECTOR: &str = "submit(uint256,int256)";

/// `oracleRoundState(address oracle, uint32 queriedRoundId)`
pub const ROUND_STATE_SELECTOR: &str = "oracleRoundState(address,uint32)";

/// Return type of `oracleRoundState`.
pub const ROUND_STATE_RETURN: &str = "(bool,uint32,int256,uint64,uint64,uint128,uint8,uint128)";

#[derive(Debug, Error)]
pub enum AbiError {
	#[error("Invalid signature: {0}")]
	Signature(String),
	#[error("Encode error: {0}")]
	Encode(String),
	#[error("Decode error: {0}")]
	Decode(String),
}

/// Extracts the parameter tuple type from a function signature such as
/// `submit(uint256,int256)`.
fn parameter_type(selector: &str) -> Result<DynSolType, AbiError> {
	let start = selector
		.find('(')
		.ok_or_else(|| AbiError::Signature(selector.to_string()))?;
	if !selector.ends_with(')') {
		return Err(AbiError::Signature(selector.to_string()));
	}

	DynSolType::parse(&selector[start..])
		.map_err(|e| AbiError::Signature(format!("{}: {}", selector, e)))
}

/// ABI-encodes `values` as the parameters of `selector`.
pub fn encode_parameters(selector: &str, values: Vec<DynSolValue>) -> Result<Vec<u8>, AbiError> {
	let ty = parameter_type(selector)?;
	let tuple = DynSolValue::Tuple(values);
	if !ty.matches(&tuple) {
		return Err(AbiError::Encode(format!(
			"values do not match parameters of {}",
			selector
		)));
	}

	Ok(tuple.abi_encode_params())
}

/// Decodes hex-encoded return data positionally against `type_sig`.
pub fn decode_return(type_sig: &str, data: &str) -> Result<Vec<DynSolValue>, AbiError> {
	let ty = DynSolType::parse(type_sig)
		.map_err(|e| AbiError::Signature(format!("{}: {}", type_sig, e)))?;
	let bytes = hex::decode(data.trim_start_matches("0x"))
		.map_err(|e| AbiError::Decode(format!("invalid hex: {}", e)))?;

	match ty
		.abi_decode_params(&bytes)
		.map_err(|e| AbiError::Decode(e.to_string()))?
	{
		DynSolValue::Tuple(values) => Ok(values),
		value => Ok(vec![value]),
	}
}
