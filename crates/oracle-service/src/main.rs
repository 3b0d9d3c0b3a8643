//! Main entry point for the flux oracle node.
//!
//! This binary reads FluxAggregator round state through a TRON node's HTTP
//! API, checks whether the oracle should answer, and submits answers taken
//! from the configured price sources.

use clap::{Parser, Subcommand};
use oracle_account::AccountService;
use oracle_aggregator::{check_oracle_round_state, FluxAggregator};
use oracle_config::Config;
use oracle_feed::FeedService;
use oracle_transport::{HttpTransport, NodeClient, NodeEndpoint, RetryPolicy};
use oracle_types::TronAddress;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod runner;

use runner::OracleRunner;

// Import implementations from individual crates
use oracle_account::implementations::local::create_account;
use oracle_feed::implementations::http::HttpPriceFeed;
use oracle_transport::implementations::http::create_transport;

/// Command-line arguments for the oracle node.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the oracle account address
	Address,
	/// Fetch and print the oracle's round state for a contract
	RoundState {
		#[arg(long)]
		contract: TronAddress,
		/// Round to query; 0 asks for the next eligible round
		#[arg(long, default_value_t = 0)]
		round: u64,
	},
	/// Submit an answer for a round once
	Submit {
		#[arg(long)]
		contract: TronAddress,
		#[arg(long)]
		round: u64,
		#[arg(long, allow_hyphen_values = true)]
		value: i64,
	},
	/// Answer all configured jobs every poll interval
	Run {
		/// Run a single pass and exit
		#[arg(long)]
		once: bool,
	},
}

/// Components wired from configuration.
struct OracleNode {
	account: Arc<AccountService>,
	aggregator: Arc<FluxAggregator>,
	runner: OracleRunner,
}

/// Main entry point for the oracle node.
///
/// Parses arguments, initializes logging, loads configuration, wires the
/// node components and dispatches the requested command.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.oracle.id);

	let node = build_node(&config)?;

	match args.command {
		Command::Address => {
			println!("{}", node.account.get_address().await?);
		},
		Command::RoundState { contract, round } => {
			match node.aggregator.get_oracle_round_state(&contract, round).await {
				Some(state) => {
					println!("{}", serde_json::to_string_pretty(&state)?);
					println!("eligible: {}", check_oracle_round_state(Some(&state)));
				},
				None => return Err("round state unavailable".into()),
			}
		},
		Command::Submit {
			contract,
			round,
			value,
		} => {
			let receipt = node.aggregator.submit(&contract, round, value).await?;
			println!("{}", serde_json::to_string_pretty(&receipt)?);
		},
		Command::Run { once } => {
			tracing::info!(jobs = config.jobs.len(), "Started oracle");
			node.runner.run(once).await;
			tracing::info!("Stopped oracle");
		},
	}

	Ok(())
}

/// Builds the node components from configuration.
///
/// One HTTP client is shared by the node client and the price feed.
fn build_node(config: &Config) -> Result<OracleNode, Box<dyn std::error::Error>> {
	let transport: Arc<dyn HttpTransport> =
		Arc::new(create_transport(config.node.timeout_seconds)?);
	let node_client = Arc::new(NodeClient::new(
		transport.clone(),
		NodeEndpoint::new(&config.node.scheme, &config.node.host),
	));

	let account = Arc::new(AccountService::new(create_account(
		&config.account.private_key,
	)?));
	let aggregator = Arc::new(FluxAggregator::new(
		node_client,
		account.clone(),
		config.node.fee_limit,
	));

	let retry = RetryPolicy::linear(
		Duration::from_millis(config.retry.step_ms),
		config.retry.max_retries,
	);
	let feed = FeedService::new(Box::new(HttpPriceFeed::new(transport, retry)));

	let runner = OracleRunner::new(
		aggregator.clone(),
		feed,
		config.jobs.clone(),
		Duration::from_secs(config.oracle.poll_interval_seconds),
	);

	Ok(OracleNode {
		account,
		aggregator,
		runner,
	})
}
