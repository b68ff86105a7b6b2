//! Sends operation payloads and normalizes responses into [`ApiResult`]s.

use super::common::compose_headers;
use super::error_helpers::{describe_error_chain, format_json_parse_error};
use super::loud_wire;
use crate::config::ClientConfig;
use crate::errors::FailureKind;
use crate::result::ApiResult;
use reqwest::Client as ReqwestClient;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Message for payloads without a usable `op` field.
pub(crate) const INVALID_PAYLOAD_MESSAGE: &str = "INVALID_PAYLOAD: missing 'op'";

/// Message for error responses that carry no `error` text.
pub(crate) const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error";

/// Status used for payloads rejected before sending.
pub(crate) const VALIDATION_STATUS: u16 = 400;

/// Status used when no usable response was obtained.
pub(crate) const LOCAL_FAILURE_STATUS: u16 = 500;

/// Returns the payload's operation name if it is a non-empty string.
pub(crate) fn operation_name(payload: &Value) -> Option<&str> {
    payload
        .get("op")
        .and_then(Value::as_str)
        .filter(|op| !op.is_empty())
}

/// Builds the result for a payload rejected before any request was made.
pub(crate) fn validation_failure(message: impl Into<String>) -> ApiResult {
    ApiResult::failed(FailureKind::Validation, message, VALIDATION_STATUS)
}

/// Checks a payload and assembles its headers.
///
/// Returns the operation name and final header map, or the failed result to
/// hand back without sending anything.
pub(crate) fn prepare<'p>(
    config: &ClientConfig,
    payload: &'p Value,
    extra_headers: Option<&HashMap<String, String>>,
    bearer_token: Option<&str>,
) -> Result<(&'p str, HeaderMap), ApiResult> {
    let Some(op) = operation_name(payload) else {
        warn!("Rejected payload without a valid 'op' field");
        return Err(validation_failure(INVALID_PAYLOAD_MESSAGE));
    };

    let headers = compose_headers(&config.headers, extra_headers, bearer_token).map_err(|reason| {
        warn!(op, "Rejected per-call headers: {reason}");
        validation_failure(format!("INVALID_HEADERS: {reason}"))
    })?;

    debug!(op, url = %config.api_url, "Dispatching operation");
    Ok((op, headers))
}

/// Emits the completion event for a dispatched operation.
pub(crate) fn log_outcome(op: &str, result: &ApiResult) {
    if result.is_ok() {
        debug!(op, status_code = result.status_code(), "Operation completed");
    } else {
        warn!(
            op,
            status_code = result.status_code(),
            failure = ?result.failure(),
            "Operation failed: {}",
            result.error()
        );
    }
}

/// Posts `payload` as JSON and normalizes whatever comes back.
///
/// Issues exactly one request. Transport failures (including timeouts and
/// unreadable bodies) become [`FailureKind::Transport`] results with status 500.
pub(crate) async fn post_payload(
    http_client: &ReqwestClient,
    url: &str,
    headers: HeaderMap,
    payload: &Value,
) -> ApiResult {
    let request_id = loud_wire::next_request_id();
    loud_wire::log_request(request_id, "POST", url, &headers, payload);

    let response = match http_client.post(url).headers(headers).json(payload).send().await {
        Ok(response) => response,
        Err(e) => {
            let message = describe_error_chain(&e);
            warn!(url, timeout = e.is_timeout(), "Dispatch transport failure: {message}");
            return ApiResult::failed(FailureKind::Transport, message, LOCAL_FAILURE_STATUS);
        }
    };

    let status_code = response.status().as_u16();
    loud_wire::log_response_status(request_id, status_code);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let message = describe_error_chain(&e);
            warn!(url, status_code, "Failed to read response body: {message}");
            return ApiResult::failed(FailureKind::Transport, message, LOCAL_FAILURE_STATUS);
        }
    };
    loud_wire::log_response_body(request_id, &body);

    normalize_response(status_code, &body)
}

/// Blocking counterpart of [`post_payload`].
#[cfg(feature = "blocking")]
pub(crate) fn post_payload_blocking(
    http_client: &reqwest::blocking::Client,
    url: &str,
    headers: HeaderMap,
    payload: &Value,
) -> ApiResult {
    let request_id = loud_wire::next_request_id();
    loud_wire::log_request(request_id, "POST", url, &headers, payload);

    let response = match http_client.post(url).headers(headers).json(payload).send() {
        Ok(response) => response,
        Err(e) => {
            let message = describe_error_chain(&e);
            warn!(url, timeout = e.is_timeout(), "Dispatch transport failure: {message}");
            return ApiResult::failed(FailureKind::Transport, message, LOCAL_FAILURE_STATUS);
        }
    };

    let status_code = response.status().as_u16();
    loud_wire::log_response_status(request_id, status_code);

    let body = match response.text() {
        Ok(body) => body,
        Err(e) => {
            let message = describe_error_chain(&e);
            warn!(url, status_code, "Failed to read response body: {message}");
            return ApiResult::failed(FailureKind::Transport, message, LOCAL_FAILURE_STATUS);
        }
    };
    loud_wire::log_response_body(request_id, &body);

    normalize_response(status_code, &body)
}

/// Turns a received status and body into an [`ApiResult`].
///
/// - Body that is not JSON: [`FailureKind::Parse`], status 500.
/// - Status in `[200, 300)`: success with the body's `data` and `meta` objects
///   (empty when absent or not objects).
/// - Any other status: [`FailureKind::Server`] with the body's non-empty
///   `error` string, or "Unknown Error".
pub(crate) fn normalize_response(status_code: u16, body: &str) -> ApiResult {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(status_code, "Response body is not valid JSON: {e}");
            return ApiResult::failed(
                FailureKind::Parse,
                format_json_parse_error(body, &e),
                LOCAL_FAILURE_STATUS,
            );
        }
    };

    if (200..300).contains(&status_code) {
        debug!(status_code, "Dispatch succeeded");
        return ApiResult::success(
            object_field(&parsed, "data"),
            object_field(&parsed, "meta"),
            status_code,
        );
    }

    let message = parsed
        .get("error")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_ERROR_MESSAGE);
    debug!(status_code, error = message, "Dispatch rejected by server");
    ApiResult::failed(FailureKind::Server, message, status_code)
}

fn object_field(parsed: &Value, key: &str) -> Map<String, Value> {
    match parsed.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
