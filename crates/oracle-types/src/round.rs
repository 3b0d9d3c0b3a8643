//! Aggregator round state as reported by the contract for one oracle.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Serialize};

/// Snapshot of a FluxAggregator round from the point of view of the
/// querying oracle.
///
/// Decoded positionally from the contract's `oracleRoundState` return value.
/// A fresh value is produced for every query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
	/// Whether the node considers this oracle allowed to submit.
	pub eligible_to_submit: bool,
	/// The round the oracle should report for.
	pub round_id: u64,
	/// The oracle's most recent answer.
	pub latest_submission: I256,
	/// Unix timestamp (seconds) at which the round started.
	pub started_at: u64,
	/// Round timeout in seconds.
	pub timeout: u64,
	/// Funds the aggregator holds for paying oracles.
	pub available_funds: U256,
	/// Number of oracles registered with the aggregator.
	pub oracle_count: u32,
	/// Payment per oracle per round.
	pub payment_amount: U256,
}

impl RoundState {
	/// Minimum funding the aggregator must hold before submitting: three full
	/// rounds of payouts to every oracle.
	pub fn required_funds(&self) -> U256 {
		self.payment_amount
			.saturating_mul(U256::from(self.oracle_count))
			.saturating_mul(U256::from(3u8))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_required_funds() {
		let state = RoundState {
			eligible_to_submit: true,
			round_id: 1,
			latest_submission: I256::ZERO,
			started_at: 0,
			timeout: 0,
			available_funds: U256::ZERO,
			oracle_count: 4,
			payment_amount: U256::from(25u64),
		};

		assert_eq!(state.required_funds(), U256::from(300u64));
	}
}
