//! Testing utilities including mock implementations.
//!
//! Useful for testing extraction logic without making real network calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HttpError, HttpResult};
use crate::http::{Method, Transport};

/// Record of one call made through a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    /// Value of a query parameter, if the call carried it.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type RouteMatch = Vec<(String, String)>;

/// A mock [`Transport`] with scripted responses and call recording.
///
/// Responses can be scripted two ways:
/// - `with_response`/`with_error`: a FIFO script consumed in call order,
///   for retry and sequencing assertions.
/// - `with_route`: parameter-matched responses that can be hit repeatedly
///   and in any order, for concurrent batch fetches.
///
/// Routes are consulted first; a call matching neither fails with a
/// connect error naming the URL.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<HttpResult<Value>>>,
    routes: RwLock<Vec<(RouteMatch, HttpResult<Value>)>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response.
    pub fn with_response(self, body: Value) -> Self {
        self.script.lock().unwrap().push_back(Ok(body));
        self
    }

    /// Queue a transport error.
    pub fn with_error(self, error: HttpError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Register a reusable response for calls whose query parameters contain
    /// every `(key, value)` pair in `matches`.
    pub fn with_route(self, matches: &[(&str, &str)], response: HttpResult<Value>) -> Self {
        let matches = matches
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.routes.write().unwrap().push((matches, response));
        self
    }

    /// All calls made through this transport, in dispatch order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> HttpResult<Value> {
        let call = RecordedCall {
            method: method.to_string(),
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        self.calls.write().unwrap().push(call.clone());

        for (matches, response) in self.routes.read().unwrap().iter() {
            let hit = matches
                .iter()
                .all(|(k, v)| call.param(k) == Some(v.as_str()));
            if hit {
                return response.clone();
            }
        }

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }

        Err(HttpError::Connect {
            url: url.to_string(),
            reason: "no scripted response".to_string(),
        })
    }
}
