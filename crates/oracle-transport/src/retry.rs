//! Retry wrapper for idempotent requests.
//!
//! A `RetryPolicy` repeats an attempt while the response status is
//! retryable, sleeping between attempts according to the backoff function.
//! The first attempt that fails at the transport level ends the whole
//! operation with no result.

use crate::{HttpResponse, HttpTransport, StatusCode, Url};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Delay before the `retry`-th retry, counting from 1.
pub type BackoffFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Decides whether a response status warrants another attempt.
pub type RetryPredicate = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Retry policy applied to GET requests.
#[derive(Clone)]
pub struct RetryPolicy {
	max_retries: u32,
	backoff: BackoffFn,
	retry_on: RetryPredicate,
}

impl RetryPolicy {
	pub fn new(max_retries: u32, backoff: BackoffFn, retry_on: RetryPredicate) -> Self {
		Self {
			max_retries,
			backoff,
			retry_on,
		}
	}

	/// Retries on 503 only, waiting `step * n` before the n-th retry.
	pub fn linear(step: Duration, max_retries: u32) -> Self {
		Self::new(
			max_retries,
			Arc::new(move |retry: u32| step * retry),
			Arc::new(|status: StatusCode| status == StatusCode::SERVICE_UNAVAILABLE),
		)
	}

	pub fn backoff(&self, retry: u32) -> Duration {
		(self.backoff)(retry)
	}

	/// Runs `attempt` until it yields a non-retryable response or the retry
	/// budget is spent, returning the last response.
	///
	/// `None` from any attempt ends the operation with `None`, even when
	/// earlier attempts produced responses.
	pub async fn execute<F, Fut>(&self, mut attempt: F) -> Option<HttpResponse>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Option<HttpResponse>>,
	{
		let mut response = attempt().await?;
		let mut retry = 1;

		while (self.retry_on)(response.status) && retry <= self.max_retries {
			let delay = self.backoff(retry);
			tracing::warn!(
				status = %response.status,
				retry,
				delay_ms = delay.as_millis() as u64,
				"Retryable response, backing off"
			);
			tokio::time::sleep(delay).await;

			response = attempt().await?;
			retry += 1;
		}

		Some(response)
	}

	/// GETs `url` through `transport` under this policy.
	///
	/// Transport failures are logged and reported as `None`.
	pub async fn request_with_retry(
		&self,
		transport: &dyn HttpTransport,
		url: &Url,
	) -> Option<HttpResponse> {
		self.execute(move || async move {
			match transport.get(url.clone()).await {
				Ok(response) => Some(response),
				Err(e) => {
					tracing::error!(%url, error = %e, "GET request failed");
					None
				}
			}
		})
		.await
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::linear(Duration::from_millis(100), 3)
	}
}

impl fmt::Debug for RetryPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RetryPolicy")
			.field("max_retries", &self.max_retries)
			.finish_non_exhaustive()
	}
}
