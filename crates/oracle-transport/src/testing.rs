//! Scripted transport for tests.
//!
//! Replays queued responses in order and records every request it sees.

use crate::{HttpResponse, HttpTransport, StatusCode, TransportError, Url};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub method: &'static str,
	pub url: Url,
	pub body: Option<Value>,
}

/// Transport that answers from a queue instead of the network.
///
/// Once the queue is drained every request fails with a network error.
#[derive(Default)]
pub struct ScriptedTransport {
	responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a response with the given status and raw body.
	pub fn push_response(&self, status: u16, body: impl Into<String>) {
		let status = StatusCode::from_u16(status).expect("valid status code");
		self.responses
			.lock()
			.unwrap()
			.push_back(Ok(HttpResponse::new(status, body)));
	}

	/// Queues a response with a JSON body.
	pub fn push_json(&self, status: u16, body: &Value) {
		self.push_response(status, body.to_string());
	}

	/// Queues a transport failure.
	pub fn push_error(&self, error: TransportError) {
		self.responses.lock().unwrap().push_back(Err(error));
	}

	/// Every request seen so far, oldest first.
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().unwrap().clone()
	}

	/// Number of queued responses not yet consumed.
	pub fn remaining(&self) -> usize {
		self.responses.lock().unwrap().len()
	}

	fn next(
		&self,
		method: &'static str,
		url: Url,
		body: Option<Value>,
	) -> Result<HttpResponse, TransportError> {
		self.requests
			.lock()
			.unwrap()
			.push(RecordedRequest { method, url, body });
		self.responses
			.lock()
			.unwrap()
			.pop_front()
			.unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
	}
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
	async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
		self.next("GET", url, None)
	}

	async fn post_json(&self, url: Url, body: &Value) -> Result<HttpResponse, TransportError> {
		self.next("POST", url, Some(body.clone()))
	}
}
