//! reqwest-backed HTTP transport.

use crate::{HttpResponse, HttpTransport, TransportError, Url};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// HTTP transport over a pooled reqwest client.
///
/// The same timeout bounds connecting and the full request.
#[derive(Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	pub fn new(timeout: Duration) -> Result<Self, TransportError> {
		let client = reqwest::Client::builder()
			.connect_timeout(timeout)
			.timeout(timeout)
			.build()
			.map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self { client })
	}

	async fn complete(
		response: Result<reqwest::Response, reqwest::Error>,
	) -> Result<HttpResponse, TransportError> {
		let response = response.map_err(map_error)?;
		let status = response.status();
		let body = response.text().await.map_err(map_error)?;
		Ok(HttpResponse { status, body })
	}
}

fn map_error(error: reqwest::Error) -> TransportError {
	if error.is_timeout() {
		TransportError::Timeout(error.to_string())
	} else if error.is_builder() {
		TransportError::InvalidUrl(error.to_string())
	} else {
		TransportError::Network(error.to_string())
	}
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
	async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
		Self::complete(self.client.get(url).send().await).await
	}

	async fn post_json(&self, url: Url, body: &Value) -> Result<HttpResponse, TransportError> {
		Self::complete(self.client.post(url).json(body).send().await).await
	}
}

/// Creates the default transport with the configured timeout.
pub fn create_transport(timeout_seconds: u64) -> Result<ReqwestTransport, TransportError> {
	ReqwestTransport::new(Duration::from_secs(timeout_seconds))
}
