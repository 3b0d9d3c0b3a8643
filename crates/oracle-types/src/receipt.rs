//! Records produced by a successful submission.

use crate::TronAddress;
use serde::{Deserialize, Serialize};

/// Receipt for a transaction the node acknowledged on broadcast.
///
/// Only ever built after the broadcast endpoint answered `result = true`;
/// the node id in `surrogate_id` is what confirmations are tracked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The submitting account.
	pub from: TronAddress,
	/// The aggregator contract.
	pub to: TronAddress,
	/// Node-assigned transaction id.
	pub surrogate_id: String,
	/// Hex-encoded signature attached to the broadcast transaction.
	pub signed_raw_tx: String,
	/// Hex-encoded SHA-256 hash of the raw transaction.
	pub hash: String,
	/// Hex-encoded ABI parameters of the contract call.
	pub data: String,
}
