//! Immutable client configuration.
//!
//! A [`ClientConfig`] is resolved once by [`ClientBuilder::build`](crate::ClientBuilder::build)
//! and shared read-only by every clone of the [`Client`](crate::Client), so
//! concurrent dispatches never coordinate.

use crate::errors::ConfigError;
use crate::http::common::{API_KEY_HEADER, base_headers, construct_endpoint_url, parse_header};
use reqwest::header::HeaderMap;
use std::fmt;
use std::time::Duration;

/// Default total timeout for a dispatch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SINGLEBASE_API_KEY";

/// Environment variable holding a full endpoint URL.
pub const API_URL_ENV: &str = "SINGLEBASE_API_URL";

/// Environment variable holding an endpoint key appended to the base URL.
pub const ENDPOINT_KEY_ENV: &str = "SINGLEBASE_ENDPOINT_KEY";

/// Resolved settings for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) api_url: String,
    /// Base headers overlaid with the client's default headers.
    pub(crate) headers: HeaderMap,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Validates raw settings and resolves the endpoint URL and header set.
    ///
    /// Empty strings count as absent. A full `api_url` takes precedence over an
    /// `endpoint_key`.
    pub(crate) fn resolve(
        api_key: String,
        api_url: Option<String>,
        endpoint_key: Option<String>,
        default_headers: &[(String, String)],
        timeout: Duration,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let api_url = match (
            api_url.filter(|u| !u.is_empty()),
            endpoint_key.filter(|k| !k.is_empty()),
        ) {
            (Some(url), _) => url,
            (None, Some(key)) => construct_endpoint_url(&key),
            (None, None) => return Err(ConfigError::MissingEndpoint),
        };

        let mut headers = base_headers(&api_key).map_err(|reason| ConfigError::InvalidHeader {
            name: API_KEY_HEADER.to_string(),
            reason,
        })?;
        for (name, value) in default_headers {
            let (header_name, header_value) =
                parse_header(name, value).map_err(|reason| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason,
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            api_url,
            headers,
            timeout,
            connect_timeout,
        })
    }

    /// The endpoint every dispatch is posted to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The headers sent with every dispatch before per-call headers are applied.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Total request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connection timeout, if one was set.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("header_names", &self.headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
