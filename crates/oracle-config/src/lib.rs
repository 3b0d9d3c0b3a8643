//! Configuration module for the flux oracle node.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`, which keeps private keys out of
//! the file itself.
//!
//! ## Modular Configuration Support
//!
//! A file may pull in other files with `include = ["node.toml", "jobs.toml"]`.
//! Each top-level section must be unique across all files.

mod loader;

use oracle_types::{SecretString, TronAddress};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the oracle node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity and scheduling of this oracle instance.
	pub oracle: OracleConfig,
	/// Node HTTP endpoint and transaction parameters.
	pub node: NodeConfig,
	/// Retry policy for GET requests.
	#[serde(default)]
	pub retry: RetryConfig,
	/// Signing account.
	pub account: AccountConfig,
	/// Aggregators to report to and where their values come from.
	#[serde(default)]
	pub jobs: Vec<JobConfig>,
}

/// Configuration specific to the oracle instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
	/// Identifier used in logs.
	pub id: String,
	/// Seconds between two reporting passes of the run loop.
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
}

fn default_poll_interval_seconds() -> u64 {
	60
}

/// Node endpoint configuration.
///
/// Scheme and host are fixed for the whole deployment; every request path is
/// resolved against them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// `http` or `https`.
	#[serde(default = "default_scheme")]
	pub scheme: String,
	/// Host, optionally with a port (e.g. `api.trongrid.io`, `127.0.0.1:8090`).
	pub host: String,
	/// Connect and request timeout applied to every call.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Fee ceiling for submissions, in sun.
	#[serde(default = "default_fee_limit")]
	pub fee_limit: u64,
}

fn default_scheme() -> String {
	"https".to_string()
}

fn default_timeout_seconds() -> u64 {
	5
}

/// 10 TRX.
fn default_fee_limit() -> u64 {
	10_000_000
}

/// Linear backoff retry policy for GET requests answered with 503.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
	/// Retries after the first attempt.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// Retry `n` waits `n * step_ms` milliseconds.
	#[serde(default = "default_step_ms")]
	pub step_ms: u64,
}

fn default_max_retries() -> u32 {
	3
}

fn default_step_ms() -> u64 {
	100
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_retries(),
			step_ms: default_step_ms(),
		}
	}
}

/// Signing account configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Hex secp256k1 private key, with or without `0x`.
	pub private_key: SecretString,
}

/// One aggregator the node reports to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
	/// Unique job name used in logs.
	pub name: String,
	/// FluxAggregator contract address.
	pub contract: TronAddress,
	/// HTTP JSON source of the value to report.
	pub url: String,
	/// Dot-separated path to the value inside the JSON document.
	pub path: String,
	/// Factor applied before rounding to the integer the contract expects.
	#[serde(default = "default_multiplier")]
	pub multiplier: Decimal,
}

fn default_multiplier() -> Decimal {
	Decimal::ONE
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with `default`
/// for `${VAR_NAME:-default}` when the variable is unset.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match (std::env::var(var_name.as_str()), default_value) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Reverse order keeps earlier offsets valid
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader::IncludeLoader::new(base_dir).load(file_name).await
	}

	/// Deserializes and validates a table whose environment variables are
	/// already expanded.
	fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
		let config: Config = toml::Value::Table(table).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Validates values serde cannot check on its own.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.oracle.id.trim().is_empty() {
			return Err(ConfigError::Validation("Oracle ID cannot be empty".into()));
		}
		if self.oracle.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"poll_interval_seconds must be greater than 0".into(),
			));
		}

		if self.node.scheme != "http" && self.node.scheme != "https" {
			return Err(ConfigError::Validation(format!(
				"Unsupported node scheme '{}', expected http or https",
				self.node.scheme
			)));
		}
		if self.node.host.trim().is_empty() {
			return Err(ConfigError::Validation("Node host cannot be empty".into()));
		}
		if self.node.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Node timeout_seconds must be greater than 0".into(),
			));
		}
		if self.node.fee_limit == 0 {
			return Err(ConfigError::Validation(
				"Node fee_limit must be greater than 0".into(),
			));
		}

		if self.retry.max_retries > 10 {
			return Err(ConfigError::Validation(
				"Retry max_retries cannot exceed 10".into(),
			));
		}

		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"Account private_key cannot be empty".into(),
			));
		}

		let mut names = HashSet::new();
		for job in &self.jobs {
			if job.name.trim().is_empty() {
				return Err(ConfigError::Validation("Job name cannot be empty".into()));
			}
			if !names.insert(job.name.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate job name '{}'",
					job.name
				)));
			}
			if job.url.trim().is_empty() || job.path.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Job '{}' must have a url and a path",
					job.name
				)));
			}
			if job.multiplier.is_zero() {
				return Err(ConfigError::Validation(format!(
					"Job '{}' multiplier cannot be 0",
					job.name
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		Self::from_table(toml::from_str(&resolved)?)
	}
}
