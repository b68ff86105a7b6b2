use std::fmt;
use thiserror::Error;

/// Defines errors that can occur when constructing a client or uploading files.
///
/// Remote operation outcomes from [`Client::dispatch`](crate::Client::dispatch) are
/// not reported through this type; they are folded into an [`ApiResult`](crate::ApiResult)
/// so callers have a single place to inspect. Use [`ApiResult::into_std`](crate::ApiResult::into_std)
/// to turn a failed result into [`SinglebaseError::Api`] when `?` is more convenient.
///
/// # Example: Handling a failed dispatch with `?`
///
/// ```ignore
/// match client.request(payload).send().await.into_std() {
///     Err(SinglebaseError::Api { kind: FailureKind::Server, status_code, message }) => {
///         tracing::error!("server rejected request ({status_code}): {message}");
///     }
///     Err(SinglebaseError::Api { kind, message, .. }) => {
///         tracing::warn!("request never completed ({kind}): {message}");
///     }
///     // ...
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinglebaseError {
    /// The client configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Failed to build the HTTP client.
    ///
    /// This typically only occurs in exceptional circumstances such as
    /// TLS backend initialization failures.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A presigned upload descriptor was missing its URL or carried malformed fields.
    #[error("Invalid upload descriptor: {0}")]
    InvalidDescriptor(String),
    /// The presigned upload endpoint answered with a non-2xx status.
    #[error("Upload failed (HTTP {status_code}): {message}")]
    Upload {
        /// HTTP status code returned by the upload endpoint
        status_code: u16,
        /// Human-readable message, including the status line
        message: String,
    },
    /// A dispatched operation failed.
    ///
    /// Produced only by [`ApiResult::into_std`](crate::ApiResult::into_std).
    #[error("API error ({kind}, HTTP {status_code}): {message}")]
    Api {
        /// Why the operation failed
        kind: FailureKind,
        /// Status code carried by the result (server-supplied or local sentinel)
        status_code: u16,
        /// The result's error message
        message: String,
    },
    #[error("Path lookup error: {0}")]
    Path(#[from] PathError),
}

/// Problems detected while building a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("MISSING_API_KEY")]
    MissingApiKey,
    /// Neither a full API URL nor an endpoint key was supplied.
    #[error("MISSING_ENDPOINT_KEY")]
    MissingEndpoint,
    /// A default header could not be represented as an HTTP header.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Error returned by dot-notation lookups on an [`ApiResult`](crate::ApiResult).
///
/// A missing key is never an error (the lookup yields the caller's default);
/// this is raised only when the path tries to descend into a value that is not
/// a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cannot look up `{segment}` under `{path}`: value is {found}, not an object")]
    NotTraversable {
        /// The key that could not be looked up
        segment: String,
        /// The portion of the path that resolved to the non-object value
        path: String,
        /// JSON type of the value found at `path`
        found: &'static str,
    },
}

/// Why an [`ApiResult`](crate::ApiResult) represents a failure.
///
/// Splits failures into those where the request never completed against the
/// server ([`Validation`](Self::Validation), [`Transport`](Self::Transport)) and
/// those where the server answered ([`Parse`](Self::Parse), [`Server`](Self::Server)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The payload was rejected locally; no request was sent.
    Validation,
    /// DNS, connection, TLS or timeout failure.
    Transport,
    /// The server answered with a body that is not valid JSON.
    Parse,
    /// The server answered with a status outside `[200, 300)`.
    Server,
}

impl FailureKind {
    /// Returns `true` if a response was received from the server.
    #[must_use]
    pub const fn reached_server(self) -> bool {
        matches!(self, Self::Parse | Self::Server)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(ConfigError::MissingApiKey.to_string(), "MISSING_API_KEY");
        assert_eq!(
            ConfigError::MissingEndpoint.to_string(),
            "MISSING_ENDPOINT_KEY"
        );

        let error = SinglebaseError::from(ConfigError::MissingApiKey);
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("MISSING_API_KEY"));
    }

    #[test]
    fn test_invalid_header_display() {
        let error = ConfigError::InvalidHeader {
            name: "bad header".to_string(),
            reason: "invalid HTTP header name".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("bad header"));
        assert!(display.contains("invalid HTTP header name"));
    }

    #[test]
    fn test_path_error_display() {
        let error = PathError::NotTraversable {
            segment: "value".to_string(),
            path: "user.id".to_string(),
            found: "number",
        };
        let display = error.to_string();
        assert!(display.contains("`value`"));
        assert!(display.contains("`user.id`"));
        assert!(display.contains("number"));
    }

    #[test]
    fn test_upload_error_display() {
        let error = SinglebaseError::Upload {
            status_code: 403,
            message: "upload failed with status 403 Forbidden".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("403"));
        assert!(display.contains("Forbidden"));
    }

    #[test]
    fn test_api_error_display() {
        let error = SinglebaseError::Api {
            kind: FailureKind::Server,
            status_code: 400,
            message: "Bad Request".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("server"));
        assert!(display.contains("400"));
        assert!(display.contains("Bad Request"));
    }

    #[test]
    fn test_failure_kind_reached_server() {
        assert!(!FailureKind::Validation.reached_server());
        assert!(!FailureKind::Transport.reached_server());
        assert!(FailureKind::Parse.reached_server());
        assert!(FailureKind::Server.reached_server());
    }
}
