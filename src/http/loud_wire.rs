//! Wire-level debugging via the `LOUD_WIRE` environment variable.
//!
//! When `LOUD_WIRE` is set to any value, dispatches and uploads are echoed to
//! stderr with pretty, colored JSON.
//!
//! ```bash
//! LOUD_WIRE=1 cargo test --test dispatch_tests
//! ```
//!
//! - Green `>>>` for outgoing requests
//! - Red `<<<` for incoming responses
//! - Timestamps and request IDs for correlation
//!
//! Credentials (`x-api-key`, `Authorization`) are masked and long strings are
//! shortened.

use super::common::API_KEY_HEADER;
use super::error_helpers::truncate_for_context;
use colored::Colorize;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::Value;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request ID counter for correlating requests with responses
static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Cached check for whether LOUD_WIRE is enabled
static ENABLED: OnceLock<bool> = OnceLock::new();

/// Strings longer than this are shortened in dumps.
const TRUNCATE_THRESHOLD: usize = 200;

/// Non-JSON bodies are cut at this many bytes.
const RAW_BODY_LIMIT: usize = 1000;

/// Check if LOUD_WIRE debugging is enabled.
///
/// Cached on first use; set `LOUD_WIRE` before the first request.
#[must_use]
pub(crate) fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Get the next request ID for correlation.
#[must_use]
pub(crate) fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Shortens every string in the tree longer than [`TRUNCATE_THRESHOLD`].
fn truncate_long_strings(value: &mut Value) {
    match value {
        Value::String(s) if s.len() > TRUNCATE_THRESHOLD => {
            *s = truncate_for_context(s, TRUNCATE_THRESHOLD);
        }
        Value::Object(map) => map.values_mut().for_each(truncate_long_strings),
        Value::Array(items) => items.iter_mut().for_each(truncate_long_strings),
        _ => {}
    }
}

/// Masks a secret, keeping only the last four characters.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Drops the query and fragment, where presigned URLs carry their signature.
fn redact_url(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn prefix(request_id: usize) -> String {
    let ts = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .dimmed();
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        ts,
        format!("[REQ#{request_id}]").cyan()
    )
}

fn print_json(prefix: &str, value: &Value) {
    let mut value = value.clone();
    truncate_long_strings(&mut value);

    let rendered = colored_json::to_colored_json_auto(&value)
        .ok()
        .or_else(|| serde_json::to_string_pretty(&value).ok());

    if let Some(rendered) = rendered {
        for line in rendered.lines() {
            eprintln!("{prefix} {line}");
        }
    }
}

/// Log an outgoing JSON request.
pub(crate) fn log_request(
    request_id: usize,
    method: &str,
    url: &str,
    headers: &HeaderMap,
    body: &Value,
) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = ">>>".green().bold();
    eprintln!("{prefix} {direction} {method} {url}");

    for (name, value) in headers {
        let text = value.to_str().unwrap_or("<binary>");
        let shown = if name.as_str() == API_KEY_HEADER || *name == AUTHORIZATION {
            mask_secret(text)
        } else {
            text.to_string()
        };
        eprintln!("{prefix} {}: {shown}", name.as_str().green());
    }

    eprintln!("{prefix} {}:", "Body".green());
    print_json(&prefix, body);
}

/// Log an incoming HTTP response status.
pub(crate) fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = "<<<".red().bold();
    let status_text = if (200..300).contains(&status) {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };

    eprintln!("{prefix} {direction} {status_text}");
}

/// Log an incoming HTTP response body.
pub(crate) fn log_response_body(request_id: usize, body: &str) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);

    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        eprintln!("{prefix} {}:", "Response".red());
        print_json(&prefix, &parsed);
    } else {
        let truncated = truncate_for_context(body, RAW_BODY_LIMIT);
        eprintln!("{prefix} {}: {truncated}", "Response".red());
    }
}

/// Log the start of a presigned upload.
pub(crate) fn log_upload_start(request_id: usize, url: &str, file_name: &str, size: u64) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = ">>>".green().bold();
    #[allow(clippy::cast_precision_loss)]
    let size_mb = size as f64 / 1_048_576.0;

    eprintln!(
        "{prefix} {direction} {} \"{file_name}\" ({size_mb:.2} MB) -> {}",
        "UPLOAD".green().bold(),
        redact_url(url)
    );
}

/// Log the outcome of a presigned upload.
pub(crate) fn log_upload_complete(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    let direction = "<<<".red().bold();
    let label = if (200..300).contains(&status) {
        "UPLOADED".green().bold()
    } else {
        "UPLOAD FAILED".red().bold()
    };

    eprintln!("{prefix} {direction} {label} {status}");
}
