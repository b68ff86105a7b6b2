//! The uniform outcome of every remote operation.

use crate::errors::{FailureKind, PathError, SinglebaseError};
use crate::json_ext::parse_timestamp;
use crate::path;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Represents the result of an API operation.
///
/// Every dispatch produces exactly one `ApiResult`, whether the server accepted
/// the operation, rejected it, or was never reached. Inspect [`is_ok`](Self::is_ok),
/// [`error`](Self::error) and [`status_code`](Self::status_code) for the outcome,
/// and [`failure`](Self::failure) to tell *why* it failed.
///
/// A result is immutable once built. `data` and `meta` are always present and
/// are empty objects when the server sent nothing usable.
///
/// Results are only produced by the client, so `is_ok()` always agrees with
/// `status_code()` lying in `[200, 300)`.
///
/// # Example
///
/// ```no_run
/// use singlebase_rs::Client;
/// use serde_json::{json, Value};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("api-key", "my-project")?;
/// let result = client.request(json!({"op": "auth.me"})).send().await;
///
/// if result.is_ok() {
///     let name = result.get("user.name", Value::Null)?;
///     let email = result.get("user.email", json!("n/a"))?;
///     println!("{name} <{email}>");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResult {
    data: Map<String, Value>,
    meta: Map<String, Value>,
    ok: bool,
    error: String,
    status_code: u16,
    #[serde(skip)]
    failure: Option<FailureKind>,
}

impl ApiResult {
    /// Builds a successful result from a 2xx response.
    pub(crate) fn success(
        data: Map<String, Value>,
        meta: Map<String, Value>,
        status_code: u16,
    ) -> Self {
        debug_assert!(is_success_status(status_code), "success with status {status_code}");
        Self {
            data,
            meta,
            ok: true,
            error: String::new(),
            status_code,
            failure: None,
        }
    }

    /// Builds a failed result with empty `data` and `meta`.
    pub(crate) fn failed(kind: FailureKind, error: impl Into<String>, status_code: u16) -> Self {
        debug_assert!(!is_success_status(status_code), "failure with status {status_code}");
        Self {
            data: Map::new(),
            meta: Map::new(),
            ok: false,
            error: error.into(),
            status_code,
            failure: Some(kind),
        }
    }

    /// The response payload.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Auxiliary response metadata (pagination, counts, ...).
    #[must_use]
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Returns `true` if the HTTP status was in `[200, 300)`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// The error message; empty on success.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// The HTTP status, or a local sentinel (400 for rejected payloads, 500 for
    /// transport and parse failures).
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Why the operation failed; `None` on success.
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Consumes the result and returns its payload.
    #[must_use]
    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    /// Looks up a dot-notation `path` in `data`.
    ///
    /// An empty path returns all of `data`. A missing key returns `default`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotTraversable`] if the path descends into a value
    /// that is not an object, e.g. `"user.id.value"` when `user.id` is a number.
    pub fn get(&self, path: &str, default: Value) -> Result<Value, PathError> {
        path::lookup(&self.data, path, default)
    }

    /// Looks up a dot-notation `path` in `meta`, with the same rules as [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotTraversable`] on a non-object intermediate value.
    pub fn get_meta(&self, path: &str, default: Value) -> Result<Value, PathError> {
        path::lookup(&self.meta, path, default)
    }

    /// Looks up a dot-notation `path` in `data` and decodes it as a timestamp.
    ///
    /// Returns `Ok(None)` when the path is empty, the key is missing, or the
    /// value is not a string in a recognized ISO 8601 layout.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotTraversable`] on a non-object intermediate value.
    pub fn get_timestamp(&self, path: &str) -> Result<Option<DateTime<FixedOffset>>, PathError> {
        if path.is_empty() {
            return Ok(None);
        }

        Ok(path::lookup_ref(&self.data, path)?
            .and_then(Value::as_str)
            .and_then(parse_timestamp))
    }

    /// Renders the external JSON representation:
    /// `{"data", "meta", "ok", "error", "status_code"}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("data".to_string(), Value::Object(self.data.clone()));
        map.insert("meta".to_string(), Value::Object(self.meta.clone()));
        map.insert("ok".to_string(), Value::Bool(self.ok));
        map.insert("error".to_string(), Value::String(self.error.clone()));
        map.insert("status_code".to_string(), Value::from(self.status_code));
        Value::Object(map)
    }

    /// Converts a failed result into [`SinglebaseError::Api`].
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Api`] carrying the failure kind, status code
    /// and message when the result is not ok.
    pub fn into_std(self) -> Result<Self, SinglebaseError> {
        match self.failure {
            None => Ok(self),
            Some(kind) => Err(SinglebaseError::Api {
                kind,
                status_code: self.status_code,
                message: self.error,
            }),
        }
    }
}

fn is_success_status(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}

impl fmt::Display for ApiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Result ok={} status={} error={:?}>",
            self.ok, self.status_code, self.error
        )
    }
}
