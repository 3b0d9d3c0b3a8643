//! HTTP transport module for the flux oracle node.
//!
//! Every interaction with the node is a single HTTP request against one
//! configured scheme and host. This module provides the transport seam
//! (`HttpTransport`), a reqwest implementation, the `NodeClient` that
//! resolves request paths against the deployment's endpoint, and the retry
//! wrapper used for GET requests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub use reqwest::{StatusCode, Url};

/// Re-export implementations
pub mod implementations {
	pub mod http;
}
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use retry::RetryPolicy;

/// Errors that can occur while talking to a remote HTTP endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Connection or I/O failure.
	#[error("Network error: {0}")]
	Network(String),
	/// Connect or request timeout elapsed.
	#[error("Request timed out: {0}")]
	Timeout(String),
	/// The endpoint or path does not form a valid URL.
	#[error("Invalid URL: {0}")]
	InvalidUrl(String),
}

/// Status and body of a completed HTTP exchange.
///
/// Any status counts as a completed exchange; interpreting it is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: StatusCode,
	pub body: String,
}

impl HttpResponse {
	pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Parses the body as JSON.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_str(&self.body)
	}
}

/// Trait defining the interface for HTTP transports.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
	/// Issues a GET request.
	///
	/// Query parameters travel in `url` itself. Any status the server answers
	/// with is a completed exchange, including 4xx and 5xx.
	///
	/// # Arguments
	///
	/// * `url` - Fully resolved request URL
	///
	/// # Returns
	///
	/// Returns the status and body, or a `TransportError` when no response
	/// was received.
	async fn get(&self, url: Url) -> Result<HttpResponse, TransportError>;

	/// Issues a POST request with `body` serialized as JSON.
	///
	/// The request carries a JSON content type. Node calls go through this
	/// method and are never repeated by the transport.
	///
	/// # Arguments
	///
	/// * `url` - Fully resolved request URL
	/// * `body` - JSON value sent as the request body
	///
	/// # Returns
	///
	/// Returns the status and body, or `TransportError::Timeout` when the
	/// configured timeout elapses first.
	async fn post_json(&self, url: Url, body: &Value) -> Result<HttpResponse, TransportError>;
}

/// Scheme and host every node request is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
	pub scheme: String,
	pub host: String,
}

impl NodeEndpoint {
	pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
		Self {
			scheme: scheme.into(),
			host: host.into(),
		}
	}

	/// Builds the URL for `path`, with `query` appended as query parameters.
	pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
		let mut url = Url::parse(&format!("{}://{}", self.scheme, self.host))
			.map_err(|e| TransportError::InvalidUrl(format!("{}://{}: {}", self.scheme, self.host, e)))?;
		url.set_path(path);
		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}
		Ok(url)
	}
}

/// Client for the node's HTTP API.
///
/// Holds the injected transport and the fixed endpoint. POST requests are
/// issued exactly once.
pub struct NodeClient {
	transport: Arc<dyn HttpTransport>,
	endpoint: NodeEndpoint,
}

impl NodeClient {
	pub fn new(transport: Arc<dyn HttpTransport>, endpoint: NodeEndpoint) -> Self {
		Self {
			transport,
			endpoint,
		}
	}

	/// POSTs `params` as a JSON object to `path`.
	pub async fn post(
		&self,
		path: &str,
		params: Map<String, Value>,
	) -> Result<HttpResponse, TransportError> {
		let url = self.endpoint.url(path, &[])?;
		tracing::debug!(%url, "POST");
		self.transport.post_json(url, &Value::Object(params)).await
	}

	/// GETs `path` with `params` as query parameters.
	pub async fn get(
		&self,
		path: &str,
		params: &[(&str, &str)],
	) -> Result<HttpResponse, TransportError> {
		let url = self.endpoint.url(path, params)?;
		tracing::debug!(%url, "GET");
		self.transport.get(url).await
	}
}
