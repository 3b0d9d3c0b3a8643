//! Price feed module for the flux oracle node.
//!
//! A job's answer comes from a JSON HTTP endpoint: one value is selected by
//! a dotted path, scaled by the job's multiplier and rounded to the integer
//! the aggregator stores.

use async_trait::async_trait;
use oracle_config::JobConfig;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur while fetching a price.
#[derive(Debug, Error)]
pub enum FeedError {
	/// The source URL is unusable.
	#[error("Invalid source: {0}")]
	Source(String),
	/// No response could be obtained.
	#[error("Price data unavailable: {0}")]
	Unavailable(String),
	/// The source answered with a non-success status.
	#[error("Unexpected status {status} from {url}")]
	Status { status: u16, url: String },
	/// The body or the selected value is not usable.
	#[error("Parse error: {0}")]
	Parse(String),
	/// The path does not select a value.
	#[error("Path not found: {0}")]
	Path(String),
	/// The scaled value does not fit an `i64`.
	#[error("Value out of range: {0}")]
	Overflow(String),
}

/// Where a job's answer comes from and how it is scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSource {
	pub url: String,
	/// Dot-separated path into the JSON body; numeric segments index arrays.
	pub path: String,
	pub multiplier: Decimal,
}

impl From<&JobConfig> for PriceSource {
	fn from(job: &JobConfig) -> Self {
		Self {
			url: job.url.clone(),
			path: job.path.clone(),
			multiplier: job.multiplier,
		}
	}
}

/// Trait defining the interface for price feed implementations.
#[async_trait]
pub trait PriceFeedInterface: Send + Sync {
	/// Fetches the scaled integer answer for `source`.
	///
	/// Implementations read the quote at `source.url`, select the value at
	/// the dotted `source.path` and multiply it by `source.multiplier`,
	/// rounding half away from zero.
	///
	/// # Arguments
	///
	/// * `source` - Where to read the quote and how to scale it
	///
	/// # Returns
	///
	/// Returns the answer to submit on-chain, or a `FeedError` if the source
	/// is unreachable, the path is missing or the scaled value overflows.
	async fn fetch(&self, source: &PriceSource) -> Result<i64, FeedError>;
}

/// Service that manages price lookups.
pub struct FeedService {
	implementation: Box<dyn PriceFeedInterface>,
}

impl FeedService {
	pub fn new(implementation: Box<dyn PriceFeedInterface>) -> Self {
		Self { implementation }
	}

	/// Fetches the answer for a configured job.
	pub async fn fetch_for_job(&self, job: &JobConfig) -> Result<i64, FeedError> {
		let value = self.implementation.fetch(&PriceSource::from(job)).await?;
		tracing::debug!(job = %job.name, value, "Fetched price");
		Ok(value)
	}
}

/// Selects the value at `path` in `body`. An empty path selects the body.
pub fn select<'a>(body: &'a Value, path: &str) -> Result<&'a Value, FeedError> {
	if path.is_empty() {
		return Ok(body);
	}

	path.split('.').try_fold(body, |value, segment| {
		let next = match value {
			Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
			Value::Object(fields) => fields.get(segment),
			_ => None,
		};
		next.ok_or_else(|| FeedError::Path(format!("{} (at '{}')", path, segment)))
	})
}

fn parse_decimal(raw: &str) -> Result<Decimal, FeedError> {
	let raw = raw.trim();
	Decimal::from_str(raw)
		.or_else(|_| Decimal::from_scientific(raw))
		.map_err(|e| FeedError::Parse(format!("'{}' is not a number: {}", raw, e)))
}

/// Scales `value` by `multiplier`, rounding half away from zero.
///
/// Accepts JSON numbers and numeric strings.
pub fn scale(value: &Value, multiplier: Decimal) -> Result<i64, FeedError> {
	let decimal = match value {
		Value::Number(n) => parse_decimal(&n.to_string())?,
		Value::String(s) => parse_decimal(s)?,
		other => return Err(FeedError::Parse(format!("expected a number, got {}", other))),
	};

	decimal
		.checked_mul(multiplier)
		.map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
		.and_then(|rounded| rounded.to_i64())
		.ok_or_else(|| FeedError::Overflow(format!("{} * {}", decimal, multiplier)))
}
