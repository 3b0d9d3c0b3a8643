//! TRON account and contract addresses.
//!
//! A TRON address is 21 bytes: the `0x41` network prefix followed by the same
//! 20-byte account id an EVM chain would use. Nodes accept it either as
//! base58check (`T...`) when `visible = true` or as 42 hex digits.

use crate::utils::without_0x_prefix;
use alloy_primitives::Address as EvmAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network prefix byte of mainnet/testnet TRON addresses.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Length of a TRON address in bytes, prefix included.
pub const ADDRESS_LENGTH: usize = 21;

/// Errors that can occur when parsing an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("Invalid base58 address: {0}")]
	Base58(String),
	#[error("Invalid hex address: {0}")]
	Hex(String),
	#[error("Invalid address length: expected {ADDRESS_LENGTH} bytes, got {0}")]
	Length(usize),
	#[error("Invalid address prefix: expected 0x41, got {0:#04x}")]
	Prefix(u8),
}

/// A 21-byte TRON address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_LENGTH]);

impl TronAddress {
	/// Builds an address from its full 21-byte form, checking the prefix.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
		if bytes.len() != ADDRESS_LENGTH {
			return Err(AddressError::Length(bytes.len()));
		}
		if bytes[0] != ADDRESS_PREFIX {
			return Err(AddressError::Prefix(bytes[0]));
		}
		let mut inner = [0u8; ADDRESS_LENGTH];
		inner.copy_from_slice(bytes);
		Ok(Self(inner))
	}

	/// Returns the raw 21 bytes, prefix included.
	pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
		&self.0
	}

	/// Returns the 20-byte account id used when the address is ABI encoded.
	pub fn evm_address(&self) -> EvmAddress {
		EvmAddress::from_slice(&self.0[1..])
	}

	/// Returns the base58check form (`T...`).
	pub fn to_base58(&self) -> String {
		bs58::encode(self.0).with_check().into_string()
	}

	/// Returns the 42-digit hex form (`41...`), without `0x`.
	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}

	fn from_base58(s: &str) -> Result<Self, AddressError> {
		let bytes = bs58::decode(s)
			.with_check(None)
			.into_vec()
			.map_err(|e| AddressError::Base58(e.to_string()))?;
		Self::from_bytes(&bytes)
	}

	fn from_hex(s: &str) -> Result<Self, AddressError> {
		let digits = without_0x_prefix(s);
		let bytes = hex::decode(digits).map_err(|e| AddressError::Hex(e.to_string()))?;
		match bytes.len() {
			20 => Ok(EvmAddress::from_slice(&bytes).into()),
			_ => Self::from_bytes(&bytes),
		}
	}
}

impl From<EvmAddress> for TronAddress {
	fn from(address: EvmAddress) -> Self {
		let mut inner = [0u8; ADDRESS_LENGTH];
		inner[0] = ADDRESS_PREFIX;
		inner[1..].copy_from_slice(address.as_slice());
		Self(inner)
	}
}

impl FromStr for TronAddress {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.starts_with('T') {
			Self::from_base58(s)
		} else {
			Self::from_hex(s)
		}
	}
}

impl fmt::Display for TronAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_base58())
	}
}

impl fmt::Debug for TronAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TronAddress({})", self.to_base58())
	}
}

impl Serialize for TronAddress {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_base58())
	}
}

impl<'de> Deserialize<'de> for TronAddress {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const USDT_BASE58: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
	const USDT_HEX: &str = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c";

	#[test]
	fn test_base58_and_hex_agree() {
		let from_base58: TronAddress = USDT_BASE58.parse().unwrap();
		let from_hex: TronAddress = USDT_HEX.parse().unwrap();

		assert_eq!(from_base58, from_hex);
		assert_eq!(from_base58.to_hex(), USDT_HEX);
		assert_eq!(from_hex.to_base58(), USDT_BASE58);
	}

	#[test]
	fn test_zero_address() {
		let zero = TronAddress::from(EvmAddress::ZERO);
		assert_eq!(zero.to_string(), "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb");
	}

	#[test]
	fn test_evm_form_gets_prefixed() {
		let address: TronAddress = "0xa614f803b6fd780986a42c78ec9c7f77e6ded13c".parse().unwrap();
		assert_eq!(address.to_base58(), USDT_BASE58);
		assert_eq!(
			address.evm_address(),
			"0xa614f803b6fd780986a42c78ec9c7f77e6ded13c"
				.parse::<EvmAddress>()
				.unwrap()
		);
	}

	#[test]
	fn test_rejects_bad_input() {
		// Last character changed breaks the checksum
		assert!(matches!(
			"TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6u".parse::<TronAddress>(),
			Err(AddressError::Base58(_))
		));
		assert!(matches!(
			"42a614f803b6fd780986a42c78ec9c7f77e6ded13c".parse::<TronAddress>(),
			Err(AddressError::Prefix(0x42))
		));
		assert!(matches!(
			"41a614".parse::<TronAddress>(),
			Err(AddressError::Length(3))
		));
		assert!(matches!(
			"zz".parse::<TronAddress>(),
			Err(AddressError::Hex(_))
		));
	}

	#[test]
	fn test_serde_uses_base58() {
		let address: TronAddress = USDT_HEX.parse().unwrap();
		let json = serde_json::to_string(&address).unwrap();
		assert_eq!(json, format!("\"{}\"", USDT_BASE58));

		let back: TronAddress = serde_json::from_str(&json).unwrap();
		assert_eq!(back, address);
	}
}
