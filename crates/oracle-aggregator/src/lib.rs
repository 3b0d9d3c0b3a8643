//! FluxAggregator client for the flux oracle node.
//!
//! Reads the oracle's round state from the aggregator contract and submits
//! answers to it through the node's HTTP API. The read path reports every
//! failure as `None` after logging it; the write path propagates every
//! failure to the caller. Nothing here retries.

use alloy_dyn_abi::DynSolValue;
use oracle_account::{AccountError, AccountService};
use oracle_transport::{HttpResponse, NodeClient, TransportError};
use oracle_types::{
	decode_node_message, truncate_id, RoundState, TransactionReceipt, TronAddress, I256, U256,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

pub mod abi;
pub mod eligibility;
pub mod transaction;

pub use abi::AbiError;
pub use eligibility::check_oracle_round_state;

use abi::{
	decode_return, encode_parameters, ROUND_STATE_RETURN, ROUND_STATE_SELECTOR, SUBMIT_SELECTOR,
};
use transaction::{Transaction, UnsignedTransaction};

/// Fee ceiling for submissions, in sun (10 TRX).
pub const DEFAULT_FEE_LIMIT: u64 = 10_000_000;

const TRIGGER_PATH: &str = "/wallet/triggersmartcontract";
const BROADCAST_PATH: &str = "/wallet/broadcasthex";

/// Errors that can occur while talking to the aggregator.
#[derive(Debug, Error)]
pub enum AggregatorError {
	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),
	/// Unexpected response shape or a node-reported failure.
	#[error("Protocol error: {0}")]
	Protocol(String),
	#[error("ABI error: {0}")]
	Abi(#[from] AbiError),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	/// The node refused the broadcast.
	#[error("Transaction rejected ({code}): {message}")]
	Rejected { code: String, message: String },
}

#[derive(Debug, Deserialize)]
struct ReturnStatus {
	#[serde(default)]
	result: bool,
	code: Option<String>,
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeTransaction {
	#[serde(rename = "txID")]
	tx_id: Option<String>,
	raw_data_hex: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
	result: Option<ReturnStatus>,
	#[serde(default)]
	constant_result: Vec<String>,
	transaction: Option<NodeTransaction>,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
	#[serde(default)]
	result: bool,
	txid: Option<String>,
	code: Option<String>,
	message: Option<String>,
}

/// Client for one oracle account against FluxAggregator contracts.
pub struct FluxAggregator {
	node: Arc<NodeClient>,
	account: Arc<AccountService>,
	fee_limit: u64,
}

impl FluxAggregator {
	pub fn new(node: Arc<NodeClient>, account: Arc<AccountService>, fee_limit: u64) -> Self {
		Self {
			node,
			account,
			fee_limit,
		}
	}

	/// Fetches the round state for this oracle, or `None` on any failure.
	///
	/// Round 0 asks the contract for the round the oracle should report on
	/// next.
	#[instrument(skip_all, fields(contract = %contract, round_id = round_id))]
	pub async fn get_oracle_round_state(
		&self,
		contract: &TronAddress,
		round_id: u64,
	) -> Option<RoundState> {
		match self.fetch_round_state(contract, round_id).await {
			Ok(state) => {
				tracing::debug!(
					round_id = state.round_id,
					eligible = state.eligible_to_submit,
					"Fetched oracle round state"
				);
				Some(state)
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to fetch oracle round state");
				None
			},
		}
	}

	async fn fetch_round_state(
		&self,
		contract: &TronAddress,
		round_id: u64,
	) -> Result<RoundState, AggregatorError> {
		let owner = self.account.get_address().await?;
		let round = u32::try_from(round_id)
			.map_err(|_| AbiError::Encode(format!("round id {} exceeds uint32", round_id)))?;
		let parameter = encode_parameters(
			ROUND_STATE_SELECTOR,
			vec![
				DynSolValue::Address(owner.evm_address()),
				DynSolValue::Uint(U256::from(round), 32),
			],
		)?;

		let response = self
			.trigger(contract, &owner, ROUND_STATE_SELECTOR, &parameter, None)
			.await?;
		let output = response
			.constant_result
			.first()
			.ok_or_else(|| AggregatorError::Protocol("Missing constant_result".to_string()))?;

		decode_round_state(&decode_return(ROUND_STATE_RETURN, output)?)
	}

	/// Submits `result` for `round_id` and returns the receipt once the node
	/// accepted the broadcast.
	#[instrument(skip_all, fields(contract = %contract, round_id = round_id, value = result))]
	pub async fn submit(
		&self,
		contract: &TronAddress,
		round_id: u64,
		result: i64,
	) -> Result<TransactionReceipt, AggregatorError> {
		let owner = self.account.get_address().await?;
		let submission = I256::try_from(result)
			.map_err(|e| AbiError::Encode(format!("submission {}: {}", result, e)))?;
		let parameter = encode_parameters(
			SUBMIT_SELECTOR,
			vec![
				DynSolValue::Uint(U256::from(round_id), 256),
				DynSolValue::Int(submission, 256),
			],
		)?;

		let response = self
			.trigger(
				contract,
				&owner,
				SUBMIT_SELECTOR,
				&parameter,
				Some(self.fee_limit),
			)
			.await?;
		let node_tx = response
			.transaction
			.ok_or_else(|| AggregatorError::Protocol("Missing transaction".to_string()))?;
		let raw_data_hex = node_tx
			.raw_data_hex
			.ok_or_else(|| AggregatorError::Protocol("Missing raw_data_hex".to_string()))?;

		let unsigned = UnsignedTransaction::from_hex(
			&raw_data_hex,
			node_tx.tx_id.as_deref(),
			self.fee_limit,
		)?;
		let hash = unsigned.hash();
		let tx_hash = hex::encode(hash);
		tracing::debug!(
			tx_id = %truncate_id(&tx_hash),
			expiration = unsigned.raw().expiration,
			fee_limit = unsigned.raw().fee_limit,
			"Signing transaction"
		);
		let signature = self.account.sign(&hash).await?;
		let signed = unsigned.into_signed(signature.as_bytes().to_vec());

		let surrogate_id = self.broadcast(&signed).await?.unwrap_or_else(|| tx_hash.clone());

		tracing::info!(tx_id = %truncate_id(&surrogate_id), "Submission broadcast");

		Ok(TransactionReceipt {
			from: owner,
			to: *contract,
			surrogate_id,
			signed_raw_tx: signature.to_hex(),
			hash: tx_hash,
			data: hex::encode(&parameter),
		})
	}

	/// Calls `triggersmartcontract`. Without a fee limit the node executes
	/// the call as a constant (read-only) call.
	async fn trigger(
		&self,
		contract: &TronAddress,
		owner: &TronAddress,
		selector: &str,
		parameter: &[u8],
		fee_limit: Option<u64>,
	) -> Result<TriggerResponse, AggregatorError> {
		let mut params = Map::new();
		params.insert("owner_address".into(), json!(owner.to_base58()));
		params.insert("contract_address".into(), json!(contract.to_base58()));
		params.insert("function_selector".into(), json!(selector));
		params.insert("parameter".into(), json!(hex::encode(parameter)));
		if let Some(fee_limit) = fee_limit {
			params.insert("fee_limit".into(), json!(fee_limit));
			params.insert("call_value".into(), json!(0));
		}
		params.insert("visible".into(), Value::Bool(true));

		let response: TriggerResponse = parse_body(&self.node.post(TRIGGER_PATH, params).await?)?;
		let status = response
			.result
			.as_ref()
			.ok_or_else(|| AggregatorError::Protocol("Missing result".to_string()))?;
		if !status.result {
			return Err(AggregatorError::Protocol(format!(
				"{} failed ({}): {}",
				selector,
				status.code.as_deref().unwrap_or("UNKNOWN"),
				status
					.message
					.as_deref()
					.map(decode_node_message)
					.unwrap_or_default()
			)));
		}

		Ok(response)
	}

	/// Broadcasts a signed transaction, returning the node's transaction id.
	async fn broadcast(&self, signed: &Transaction) -> Result<Option<String>, AggregatorError> {
		let mut params = Map::new();
		params.insert("transaction".into(), json!(signed.to_hex()));

		let ack: BroadcastResponse = parse_body(&self.node.post(BROADCAST_PATH, params).await?)?;
		if !ack.result {
			return Err(AggregatorError::Rejected {
				code: ack.code.unwrap_or_else(|| "UNKNOWN".to_string()),
				message: ack
					.message
					.as_deref()
					.map(decode_node_message)
					.unwrap_or_default(),
			});
		}

		Ok(ack.txid)
	}
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, AggregatorError> {
	if !response.is_success() {
		return Err(AggregatorError::Protocol(format!(
			"HTTP {}: {}",
			response.status, response.body
		)));
	}

	response
		.json()
		.map_err(|e| AggregatorError::Protocol(format!("Invalid response body: {}", e)))
}

fn uint_field<T: TryFrom<U256>>(
	values: &[DynSolValue],
	index: usize,
	name: &str,
) -> Result<T, AggregatorError> {
	values
		.get(index)
		.and_then(|value| value.as_uint())
		.and_then(|(value, _)| T::try_from(value).ok())
		.ok_or_else(|| AbiError::Decode(format!("field {} ({}) is not a valid uint", index, name)).into())
}

/// Maps the decoded `oracleRoundState` tuple onto a [`RoundState`].
fn decode_round_state(values: &[DynSolValue]) -> Result<RoundState, AggregatorError> {
	if values.len() != 8 {
		return Err(AbiError::Decode(format!("expected 8 values, got {}", values.len())).into());
	}

	Ok(RoundState {
		eligible_to_submit: values[0]
			.as_bool()
			.ok_or_else(|| AbiError::Decode("field 0 (eligible) is not a bool".to_string()))?,
		round_id: uint_field(values, 1, "roundId")?,
		latest_submission: values[2]
			.as_int()
			.map(|(value, _)| value)
			.ok_or_else(|| AbiError::Decode("field 2 (latestSubmission) is not an int".to_string()))?,
		started_at: uint_field(values, 3, "startedAt")?,
		timeout: uint_field(values, 4, "timeout")?,
		available_funds: uint_field(values, 5, "availableFunds")?,
		oracle_count: uint_field(values, 6, "oracleCount")?,
		payment_amount: uint_field(values, 7, "paymentAmount")?,
	})
}
