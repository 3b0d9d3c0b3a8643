//! JSON-over-HTTP price feed.

use crate::{scale, select, FeedError, PriceFeedInterface, PriceSource};
use async_trait::async_trait;
use oracle_transport::{HttpTransport, RetryPolicy, Url};
use serde_json::Value;
use std::sync::Arc;

/// Fetches prices with GET requests under the configured retry policy.
pub struct HttpPriceFeed {
	transport: Arc<dyn HttpTransport>,
	retry: RetryPolicy,
}

impl HttpPriceFeed {
	pub fn new(transport: Arc<dyn HttpTransport>, retry: RetryPolicy) -> Self {
		Self { transport, retry }
	}
}

#[async_trait]
impl PriceFeedInterface for HttpPriceFeed {
	async fn fetch(&self, source: &PriceSource) -> Result<i64, FeedError> {
		let url = Url::parse(&source.url)
			.map_err(|e| FeedError::Source(format!("{}: {}", source.url, e)))?;

		let response = self
			.retry
			.request_with_retry(self.transport.as_ref(), &url)
			.await
			.ok_or_else(|| FeedError::Unavailable(source.url.clone()))?;
		if !response.is_success() {
			return Err(FeedError::Status {
				status: response.status.as_u16(),
				url: source.url.clone(),
			});
		}

		let body: Value = response
			.json()
			.map_err(|e| FeedError::Parse(format!("Invalid JSON from {}: {}", source.url, e)))?;

		scale(select(&body, &source.path)?, source.multiplier)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use httpmock::prelude::*;
	use oracle_transport::implementations::http::ReqwestTransport;
	use oracle_transport::testing::ScriptedTransport;
	use rust_decimal::Decimal;
	use serde_json::json;
	use std::time::Duration;

	fn source(url: &str, path: &str) -> PriceSource {
		PriceSource {
			url: url.to_string(),
			path: path.to_string(),
			multiplier: Decimal::from(1_000_000),
		}
	}

	#[tokio::test]
	async fn test_fetch_from_server() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/ticker").query_param("symbol", "TRXUSDT");
				then.status(200)
					.json_body(json!({ "data": { "price": "0.123456789" } }));
			})
			.await;

		let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap());
		let feed = HttpPriceFeed::new(transport, RetryPolicy::default());
		let value = feed
			.fetch(&source(&server.url("/ticker?symbol=TRXUSDT"), "data.price"))
			.await
			.unwrap();

		mock.assert_async().await;
		assert_eq!(value, 123_457);
	}

	#[tokio::test(start_paused = true)]
	async fn test_fetch_retries_unavailable_source() {
		let transport = Arc::new(ScriptedTransport::new());
		transport.push_response(503, "");
		transport.push_json(200, &json!([{ "price": 2 }]));
		let feed = HttpPriceFeed::new(transport.clone(), RetryPolicy::default());

		let value = feed.fetch(&source("http://feed.test/p", "0.price")).await.unwrap();

		assert_eq!(value, 2_000_000);
		assert_eq!(transport.requests().len(), 2);
	}

	#[tokio::test]
	async fn test_fetch_status_error() {
		let transport = Arc::new(ScriptedTransport::new());
		transport.push_response(404, "not found");
		let feed = HttpPriceFeed::new(transport, RetryPolicy::default());

		let result = feed.fetch(&source("http://feed.test/p", "price")).await;

		assert!(matches!(result, Err(FeedError::Status { status: 404, .. })));
	}

	#[tokio::test]
	async fn test_fetch_unavailable() {
		let transport = Arc::new(ScriptedTransport::new());
		let feed = HttpPriceFeed::new(transport, RetryPolicy::default());

		let result = feed.fetch(&source("http://feed.test/p", "price")).await;

		assert!(matches!(result, Err(FeedError::Unavailable(_))));
	}

	#[tokio::test]
	async fn test_fetch_invalid_url() {
		let transport = Arc::new(ScriptedTransport::new());
		let feed = HttpPriceFeed::new(transport.clone(), RetryPolicy::default());

		let result = feed.fetch(&source("not a url", "price")).await;

		assert!(matches!(result, Err(FeedError::Source(_))));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn test_fetch_invalid_json() {
		let transport = Arc::new(ScriptedTransport::new());
		transport.push_response(200, "<html>");
		let feed = HttpPriceFeed::new(transport, RetryPolicy::default());

		let result = feed.fetch(&source("http://feed.test/p", "price")).await;

		assert!(matches!(result, Err(FeedError::Parse(_))));
	}
}
