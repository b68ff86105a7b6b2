//! Fluent builder for a single dispatch.

use crate::client::Client;
use crate::http::dispatch;
use crate::result::ApiResult;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A dispatch being assembled: payload, per-call headers and bearer token.
///
/// Created by [`Client::request`]. Nothing is sent until [`send`](Self::send).
#[derive(Debug)]
pub struct DispatchRequest<'a> {
    client: &'a Client,
    payload: Result<Value, String>,
    headers: HashMap<String, String>,
    bearer_token: Option<String>,
}

impl<'a> DispatchRequest<'a> {
    pub(crate) fn new(client: &'a Client, payload: impl Serialize) -> Self {
        Self {
            client,
            payload: serde_json::to_value(payload).map_err(|e| e.to_string()),
            headers: HashMap::new(),
            bearer_token: None,
        }
    }

    /// Adds a header for this call only. Overrides a client default of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several per-call headers.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sends `Authorization: Bearer <token>` with this call.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sends the request and returns its normalized result.
    ///
    /// A payload that could not be serialized yields a failed result with
    /// status 400 and no network call.
    pub async fn send(self) -> ApiResult {
        let payload = match self.payload {
            Ok(payload) => payload,
            Err(reason) => {
                return dispatch::validation_failure(format!("INVALID_PAYLOAD: {reason}"));
            }
        };

        let headers = (!self.headers.is_empty()).then_some(&self.headers);
        self.client
            .dispatch(&payload, headers, self.bearer_token.as_deref())
            .await
    }
}
