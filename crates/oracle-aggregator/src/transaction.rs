//! Wire format of TRON transactions.
//!
//! The node hands out the raw transaction as protobuf bytes. Its id is the
//! SHA-256 of those exact bytes, so the raw bytes are carried through
//! untouched and only decoded for inspection.

use oracle_types::B256;
use prost::Message;
use sha2::{Digest, Sha256};

use crate::AggregatorError;

/// The subset of `Transaction.raw` the oracle inspects.
///
/// Contract payloads and other fields are skipped on decode.
#[derive(Clone, PartialEq, Message)]
pub struct TransactionRaw {
	#[prost(bytes = "vec", tag = "1")]
	pub ref_block_bytes: Vec<u8>,
	#[prost(bytes = "vec", tag = "4")]
	pub ref_block_hash: Vec<u8>,
	#[prost(int64, tag = "8")]
	pub expiration: i64,
	#[prost(int64, tag = "14")]
	pub timestamp: i64,
	#[prost(int64, tag = "18")]
	pub fee_limit: i64,
}

/// A transaction as accepted by `broadcasthex`.
#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
	/// Serialized `Transaction.raw`.
	#[prost(bytes = "vec", tag = "1")]
	pub raw_data: Vec<u8>,
	#[prost(bytes = "vec", repeated, tag = "2")]
	pub signature: Vec<Vec<u8>>,
}

/// An unsigned transaction returned by the node.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
	raw_data: Vec<u8>,
	raw: TransactionRaw,
}

impl UnsignedTransaction {
	/// Parses `raw_data_hex`, checking the computed id against `tx_id` when
	/// the node supplied one.
	///
	/// The node builds the transaction, so its fee limit is checked against
	/// `max_fee_limit` before anything gets signed.
	pub fn from_hex(
		raw_data_hex: &str,
		tx_id: Option<&str>,
		max_fee_limit: u64,
	) -> Result<Self, AggregatorError> {
		let raw_data = hex::decode(raw_data_hex)
			.map_err(|e| AggregatorError::Protocol(format!("Invalid raw_data_hex: {}", e)))?;
		let raw = TransactionRaw::decode(raw_data.as_slice())
			.map_err(|e| AggregatorError::Protocol(format!("Invalid raw transaction: {}", e)))?;

		if u64::try_from(raw.fee_limit).map_or(true, |fee_limit| fee_limit > max_fee_limit) {
			return Err(AggregatorError::Protocol(format!(
				"Transaction fee limit {} outside 0..={}",
				raw.fee_limit, max_fee_limit
			)));
		}

		let transaction = Self { raw_data, raw };
		if let Some(expected) = tx_id {
			let computed = hex::encode(transaction.hash());
			if !computed.eq_ignore_ascii_case(expected) {
				return Err(AggregatorError::Protocol(format!(
					"Transaction id mismatch: node reported {}, computed {}",
					expected, computed
				)));
			}
		}

		Ok(transaction)
	}

	/// SHA-256 of the raw transaction bytes.
	pub fn hash(&self) -> B256 {
		B256::from_slice(&Sha256::digest(&self.raw_data))
	}

	pub fn raw(&self) -> &TransactionRaw {
		&self.raw
	}

	/// Attaches `signature` and serializes the result for broadcast.
	pub fn into_signed(self, signature: Vec<u8>) -> Transaction {
		Transaction {
			raw_data: self.raw_data,
			signature: vec![signature],
		}
	}
}

impl Transaction {
	pub fn to_hex(&self) -> String {
		hex::encode(self.encode_to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FEE_LIMIT: u64 = 10_000_000;

	fn sample_raw() -> TransactionRaw {
		TransactionRaw {
			ref_block_bytes: vec![0x12, 0x34],
			ref_block_hash: vec![0xab; 8],
			expiration: 1_700_000_060_000,
			timestamp: 1_700_000_000_000,
			fee_limit: 10_000_000,
		}
	}

	#[test]
	fn test_parse_and_hash() {
		let bytes = sample_raw().encode_to_vec();
		let expected = hex::encode(Sha256::digest(&bytes));

		let tx = UnsignedTransaction::from_hex(&hex::encode(&bytes), Some(&expected), FEE_LIMIT)
			.unwrap();

		assert_eq!(hex::encode(tx.hash()), expected);
		assert_eq!(tx.raw().fee_limit, 10_000_000);
		assert_eq!(tx.raw().expiration, 1_700_000_060_000);
	}

	#[test]
	fn test_fee_limit_ceiling() {
		let bytes = sample_raw().encode_to_vec();

		// equal to the ceiling is accepted
		assert!(UnsignedTransaction::from_hex(&hex::encode(&bytes), None, 10_000_000).is_ok());

		let result = UnsignedTransaction::from_hex(&hex::encode(&bytes), None, 9_999_999);
		assert!(matches!(result, Err(AggregatorError::Protocol(ref m)) if m.contains("fee limit")));

		let negative = TransactionRaw {
			fee_limit: -1,
			..sample_raw()
		}
		.encode_to_vec();
		let result = UnsignedTransaction::from_hex(&hex::encode(negative), None, FEE_LIMIT);
		assert!(matches!(result, Err(AggregatorError::Protocol(_))));
	}

	#[test]
	fn test_tx_id_mismatch() {
		let bytes = sample_raw().encode_to_vec();
		let result =
			UnsignedTransaction::from_hex(&hex::encode(bytes), Some(&"00".repeat(32)), FEE_LIMIT);
		assert!(matches!(result, Err(AggregatorError::Protocol(_))));
	}

	#[test]
	fn test_invalid_hex() {
		let result = UnsignedTransaction::from_hex("zz", None, FEE_LIMIT);
		assert!(matches!(result, Err(AggregatorError::Protocol(_))));
	}

	#[test]
	fn test_unknown_fields_survive_signing() {
		// raw bytes followed by an unknown field (tag 11, length-delimited)
		let mut bytes = sample_raw().encode_to_vec();
		bytes.extend_from_slice(&[0x5a, 0x02, 0xde, 0xad]);

		let tx = UnsignedTransaction::from_hex(&hex::encode(&bytes), None, FEE_LIMIT).unwrap();
		let signed = tx.into_signed(vec![0x01; 65]);
		let decoded = Transaction::decode(hex::decode(signed.to_hex()).unwrap().as_slice()).unwrap();

		assert_eq!(decoded.raw_data, bytes);
		assert_eq!(decoded.signature, vec![vec![0x01; 65]]);
	}
}
