//! Polling loop that keeps every configured job's aggregator answered.

use oracle_aggregator::{check_oracle_round_state, AggregatorError, FluxAggregator};
use oracle_config::JobConfig;
use oracle_feed::{FeedError, FeedService};
use oracle_types::{truncate_id, TransactionReceipt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::instrument;

/// Round id asking the contract for the oracle's next eligible round.
const NEXT_ELIGIBLE_ROUND: u64 = 0;

#[derive(Debug, Error)]
pub enum RunnerError {
	#[error("Feed error: {0}")]
	Feed(#[from] FeedError),
	#[error("Aggregator error: {0}")]
	Aggregator(#[from] AggregatorError),
}

/// What a single job run did.
#[derive(Debug)]
pub enum JobOutcome {
	Submitted(TransactionReceipt),
	/// The round state was missing or failed the eligibility check.
	Skipped,
}

/// Counts for one pass over all jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
	pub submitted: usize,
	pub skipped: usize,
	pub failed: usize,
}

pub struct OracleRunner {
	aggregator: Arc<FluxAggregator>,
	feed: FeedService,
	jobs: Vec<JobConfig>,
	poll_interval: Duration,
}

impl OracleRunner {
	pub fn new(
		aggregator: Arc<FluxAggregator>,
		feed: FeedService,
		jobs: Vec<JobConfig>,
		poll_interval: Duration,
	) -> Self {
		Self {
			aggregator,
			feed,
			jobs,
			poll_interval,
		}
	}

	/// Fetches, checks, prices and submits for one job.
	#[instrument(skip_all, fields(job = %job.name, contract = %job.contract))]
	pub async fn run_job(&self, job: &JobConfig) -> Result<JobOutcome, RunnerError> {
		let state = match self
			.aggregator
			.get_oracle_round_state(&job.contract, NEXT_ELIGIBLE_ROUND)
			.await
		{
			Some(state) if check_oracle_round_state(Some(&state)) => state,
			_ => return Ok(JobOutcome::Skipped),
		};

		let value = self.feed.fetch_for_job(job).await?;
		let receipt = self
			.aggregator
			.submit(&job.contract, state.round_id, value)
			.await?;

		tracing::info!(
			round_id = state.round_id,
			value,
			tx_id = %truncate_id(&receipt.surrogate_id),
			"Submitted answer"
		);
		Ok(JobOutcome::Submitted(receipt))
	}

	/// Runs every job once, in configuration order.
	pub async fn tick(&self) -> TickSummary {
		let mut summary = TickSummary::default();
		for job in &self.jobs {
			match self.run_job(job).await {
				Ok(JobOutcome::Submitted(_)) => summary.submitted += 1,
				Ok(JobOutcome::Skipped) => summary.skipped += 1,
				Err(e) => {
					tracing::error!(job = %job.name, error = %e, "Job failed");
					summary.failed += 1;
				},
			}
		}
		summary
	}

	/// Ticks every poll interval until Ctrl-C, or once when `once` is set.
	pub async fn run(&self, once: bool) {
		let mut interval = tokio::time::interval(self.poll_interval);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = interval.tick() => {
					let summary = self.tick().await;
					tracing::info!(
						submitted = summary.submitted,
						skipped = summary.skipped,
						failed = summary.failed,
						"Completed tick"
					);
					if once {
						break;
					}
				}

				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown requested");
					break;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_dyn_abi::DynSolValue;
	use oracle_account::implementations::local::create_account;
	use oracle_account::AccountService;
	use oracle_aggregator::transaction::{TransactionRaw, UnsignedTransaction};
	use oracle_aggregator::DEFAULT_FEE_LIMIT;
	use oracle_feed::implementations::http::HttpPriceFeed;
	use oracle_transport::testing::ScriptedTransport;
	use oracle_transport::{NodeClient, NodeEndpoint, RetryPolicy};
	use oracle_types::{SecretString, I256, U256};
	use prost::Message;
	use rust_decimal::Decimal;
	use serde_json::json;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	struct Harness {
		node: Arc<ScriptedTransport>,
		feed: Arc<ScriptedTransport>,
		runner: OracleRunner,
	}

	fn job(name: &str) -> JobConfig {
		JobConfig {
			name: name.to_string(),
			contract: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap(),
			url: "http://feed.test/price".to_string(),
			path: "price".to_string(),
			multiplier: Decimal::from(100),
		}
	}

	fn harness(jobs: Vec<JobConfig>) -> Harness {
		let node = Arc::new(ScriptedTransport::new());
		let feed = Arc::new(ScriptedTransport::new());
		let account = AccountService::new(create_account(&SecretString::from(DEV_KEY)).unwrap());
		let aggregator = FluxAggregator::new(
			Arc::new(NodeClient::new(node.clone(), NodeEndpoint::new("http", "node.test"))),
			Arc::new(account),
			DEFAULT_FEE_LIMIT,
		);
		let feed_service = FeedService::new(Box::new(HttpPriceFeed::new(
			feed.clone(),
			RetryPolicy::default(),
		)));

		Harness {
			node,
			feed,
			runner: OracleRunner::new(
				Arc::new(aggregator),
				feed_service,
				jobs,
				Duration::from_secs(60),
			),
		}
	}

	fn round_state(eligible: bool) -> serde_json::Value {
		let encoded = DynSolValue::Tuple(vec![
			DynSolValue::Bool(eligible),
			DynSolValue::Uint(U256::from(9u64), 32),
			DynSolValue::Int(I256::ZERO, 256),
			DynSolValue::Uint(U256::ZERO, 64),
			DynSolValue::Uint(U256::ZERO, 64),
			DynSolValue::Uint(U256::from(1_000u64), 128),
			DynSolValue::Uint(U256::from(1u64), 8),
			DynSolValue::Uint(U256::from(10u64), 128),
		])
		.abi_encode_params();
		json!({ "result": { "result": true }, "constant_result": [hex::encode(encoded)] })
	}

	fn trigger_response() -> serde_json::Value {
		let raw = TransactionRaw {
			ref_block_bytes: vec![0x01, 0x02],
			ref_block_hash: vec![0x03; 8],
			expiration: 1_700_000_060_000,
			timestamp: 1_700_000_000_000,
			fee_limit: DEFAULT_FEE_LIMIT as i64,
		}
		.encode_to_vec();
		let tx_id = hex::encode(
			UnsignedTransaction::from_hex(&hex::encode(&raw), None, DEFAULT_FEE_LIMIT)
				.unwrap()
				.hash(),
		);
		json!({
			"result": { "result": true },
			"transaction": { "txID": tx_id, "raw_data_hex": hex::encode(&raw) }
		})
	}

	#[tokio::test]
	async fn test_eligible_job_submits() {
		let h = harness(vec![job("trx-usd")]);
		h.node.push_json(200, &round_state(true));
		h.feed.push_json(200, &json!({ "price": "0.1234" }));
		h.node.push_json(200, &trigger_response());
		h.node.push_json(200, &json!({ "result": true, "txid": "ab".repeat(32) }));

		let outcome = h.runner.run_job(&job("trx-usd")).await.unwrap();

		let JobOutcome::Submitted(receipt) = outcome else {
			panic!("expected submission");
		};
		assert_eq!(receipt.surrogate_id, "ab".repeat(32));
		// round 9, answer round(0.1234 * 100) = 12
		assert!(receipt.data.starts_with(&format!("{:064x}", 9)));
		assert!(receipt.data.ends_with(&format!("{:064x}", 12)));

		let requests = h.node.requests();
		assert_eq!(requests.len(), 3);
		assert_eq!(requests[1].body.as_ref().unwrap()["function_selector"], "submit(uint256,int256)");
	}

	#[tokio::test]
	async fn test_ineligible_job_skips_feed() {
		let h = harness(vec![job("trx-usd")]);
		h.node.push_json(200, &round_state(false));

		let outcome = h.runner.run_job(&job("trx-usd")).await.unwrap();

		assert!(matches!(outcome, JobOutcome::Skipped));
		assert!(h.feed.requests().is_empty());
		assert_eq!(h.node.requests().len(), 1);
	}

	#[tokio::test]
	async fn test_tick_counts_failures_and_continues() {
		let h = harness(vec![job("first"), job("second")]);
		// first: round state unavailable
		h.node.push_response(500, "");
		// second: eligible, feed down
		h.node.push_json(200, &round_state(true));
		h.feed.push_response(404, "");

		let summary = h.runner.tick().await;

		assert_eq!(
			summary,
			TickSummary {
				submitted: 0,
				skipped: 1,
				failed: 1,
			}
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_run_once_stops_after_one_tick() {
		let h = harness(vec![job("trx-usd")]);
		h.node.push_json(200, &round_state(false));

		h.runner.run(true).await;

		assert_eq!(h.node.requests().len(), 1);
	}
}
