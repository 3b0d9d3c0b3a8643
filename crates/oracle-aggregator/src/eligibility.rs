//! Submission policy for a fetched round state.

use oracle_types::{RoundState, U256};

/// Decides whether the oracle should submit for `state`.
///
/// A missing state, an ineligible oracle, a zero payment or an aggregator
/// holding less than three rounds of payouts all reject. Rejections are
/// logged at warn level.
pub fn check_oracle_round_state(state: Option<&RoundState>) -> bool {
	let Some(state) = state else {
		tracing::warn!("Round state unavailable");
		return false;
	};

	if !state.eligible_to_submit {
		tracing::warn!(round_id = state.round_id, "Oracle not eligible to submit");
		return false;
	}

	if state.payment_amount == U256::ZERO {
		tracing::warn!(round_id = state.round_id, "Payment amount is zero");
		return false;
	}

	let required = state.required_funds();
	if state.available_funds < required {
		tracing::warn!(
			round_id = state.round_id,
			available = %state.available_funds,
			required = %required,
			"Aggregator is underfunded"
		);
		return false;
	}

	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use oracle_types::I256;

	fn state() -> RoundState {
		RoundState {
			eligible_to_submit: true,
			round_id: 7,
			latest_submission: I256::ZERO,
			started_at: 1_700_000_000,
			timeout: 3600,
			available_funds: U256::from(300u64),
			oracle_count: 4,
			payment_amount: U256::from(25u64),
		}
	}

	#[test]
	fn test_eligible_state_passes() {
		assert!(check_oracle_round_state(Some(&state())));
	}

	#[test]
	fn test_missing_state_rejected() {
		assert!(!check_oracle_round_state(None));
	}

	#[test]
	fn test_not_eligible_rejected() {
		let state = RoundState {
			eligible_to_submit: false,
			..state()
		};
		assert!(!check_oracle_round_state(Some(&state)));
	}

	#[test]
	fn test_zero_payment_rejected() {
		let state = RoundState {
			payment_amount: U256::ZERO,
			available_funds: U256::from(1_000_000u64),
			..state()
		};
		assert!(!check_oracle_round_state(Some(&state)));
	}

	#[test]
	fn test_funding_boundary() {
		// 25 * 4 * 3 = 300
		let exact = state();
		assert!(check_oracle_round_state(Some(&exact)));

		let short = RoundState {
			available_funds: U256::from(299u64),
			..state()
		};
		assert!(!check_oracle_round_state(Some(&short)));
	}

	#[test]
	fn test_no_oracles_needs_no_funds() {
		let state = RoundState {
			oracle_count: 0,
			available_funds: U256::ZERO,
			..state()
		};
		assert!(check_oracle_round_state(Some(&state)));
	}
}
