use crate::config::{API_KEY_ENV, API_URL_ENV, ClientConfig, DEFAULT_TIMEOUT, ENDPOINT_KEY_ENV};
use crate::errors::{ConfigError, SinglebaseError};
use crate::http::dispatch;
use crate::request::DispatchRequest;
use crate::result::ApiResult;
use crate::upload::{self, PresignedUpload};
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The main client for dispatching operations to the Singlebase API.
///
/// Cloning is cheap: clones share the same immutable [`ClientConfig`] and
/// connection pools, and may dispatch concurrently.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) config: Arc<ClientConfig>,
    #[allow(clippy::struct_field_names)]
    pub(crate) http_client: ReqwestClient,
    /// Same settings minus the request timeout, for presigned uploads.
    pub(crate) upload_client: ReqwestClient,
}

/// Builder for `Client` instances.
///
/// # Example
///
/// ```
/// use singlebase_rs::Client;
/// use std::time::Duration;
///
/// let client = Client::builder("api_key")
///     .endpoint_key("my-project")
///     .header("x-tenant", "acme")
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// assert_eq!(client.config().api_url(), "https://cloud.singlebaseapis.com/api/my-project");
/// # Ok::<(), singlebase_rs::SinglebaseError>(())
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    api_key: String,
    api_url: Option<String>,
    endpoint_key: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    connect_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Sets the full endpoint URL. Takes precedence over [`endpoint_key`](Self::endpoint_key).
    #[must_use]
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the endpoint key appended to [`BASE_API_URL`](crate::BASE_API_URL).
    #[must_use]
    pub fn endpoint_key(mut self, endpoint_key: impl Into<String>) -> Self {
        self.endpoint_key = Some(endpoint_key.into());
        self
    }

    /// Adds a default header sent with every dispatch.
    ///
    /// Default headers override the SDK's base headers; per-call headers
    /// override default headers.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several default headers.
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the total request timeout for dispatches. Defaults to 10 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    ///
    /// If not set, uses reqwest's default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Config`] if the API key is empty, if neither an
    /// API URL nor an endpoint key was given, or if a default header is not a
    /// valid HTTP header. Returns [`SinglebaseError::ClientBuild`] if the HTTP
    /// client cannot be initialized.
    pub fn build(self) -> Result<Client, SinglebaseError> {
        let config = self.resolve()?;

        let build_error = |e: reqwest::Error| SinglebaseError::ClientBuild(e.to_string());
        let mut builder = ReqwestClient::builder().timeout(config.timeout);
        let mut upload_builder = ReqwestClient::builder();
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
            upload_builder = upload_builder.connect_timeout(connect_timeout);
        }
        let http_client = builder.build().map_err(build_error)?;
        let upload_client = upload_builder.build().map_err(build_error)?;

        debug!(
            api_url = %config.api_url,
            timeout = ?config.timeout,
            headers = config.headers.len(),
            "Created Singlebase client"
        );

        Ok(Client {
            config: Arc::new(config),
            http_client,
            upload_client,
        })
    }

    /// Builds a [`blocking::Client`](crate::blocking::Client) with the same settings.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    #[cfg(feature = "blocking")]
    pub fn build_blocking(self) -> Result<crate::blocking::Client, SinglebaseError> {
        crate::blocking::Client::from_config(self.resolve()?)
    }

    fn resolve(self) -> Result<ClientConfig, ConfigError> {
        ClientConfig::resolve(
            self.api_key,
            self.api_url,
            self.endpoint_key,
            &self.headers,
            self.timeout,
            self.connect_timeout,
        )
    }
}

impl Client {
    /// Creates a new builder for `Client` instances.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Your Singlebase API key.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            api_url: None,
            endpoint_key: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
        }
    }

    /// Creates a client for an endpoint key with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Config`] if either argument is empty.
    pub fn new(
        api_key: impl Into<String>,
        endpoint_key: impl Into<String>,
    ) -> Result<Self, SinglebaseError> {
        Self::builder(api_key).endpoint_key(endpoint_key).build()
    }

    /// Creates a client from `SINGLEBASE_API_KEY` plus either
    /// `SINGLEBASE_API_URL` or `SINGLEBASE_ENDPOINT_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Config`] if the variables are missing or empty.
    pub fn from_env() -> Result<Self, SinglebaseError> {
        Self::builder_from_lookup(|name| std::env::var(name).ok()).build()
    }

    /// A builder primed from `SINGLEBASE_*` variables read through `lookup`.
    pub(crate) fn builder_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientBuilder {
        let mut builder = Self::builder(lookup(API_KEY_ENV).unwrap_or_default());
        if let Some(api_url) = lookup(API_URL_ENV) {
            builder = builder.api_url(api_url);
        }
        if let Some(endpoint_key) = lookup(ENDPOINT_KEY_ENV) {
            builder = builder.endpoint_key(endpoint_key);
        }
        builder
    }

    /// The configuration shared by this client and its clones.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatches an operation payload and returns its normalized result.
    ///
    /// `payload` must be a JSON object with a non-empty string `op`; otherwise
    /// a failed result with status 400 is returned without any network call.
    /// Headers are layered base ← client defaults ← `extra_headers` ←
    /// `Authorization: Bearer <bearer_token>` (empty tokens are ignored).
    ///
    /// Every outcome, including transport failures, is reported through the
    /// returned [`ApiResult`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use singlebase_rs::Client;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::new("api-key", "my-project")?;
    ///
    /// let result = client
    ///     .dispatch(&json!({"op": "db.find", "collection": "users"}), None, None)
    ///     .await;
    ///
    /// if result.is_ok() {
    ///     println!("{}", result.get("", serde_json::Value::Null)?);
    /// } else {
    ///     eprintln!("{} ({})", result.error(), result.status_code());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn dispatch(
        &self,
        payload: &Value,
        extra_headers: Option<&HashMap<String, String>>,
        bearer_token: Option<&str>,
    ) -> ApiResult {
        let (op, headers) =
            match dispatch::prepare(&self.config, payload, extra_headers, bearer_token) {
                Ok(prepared) => prepared,
                Err(rejected) => return rejected,
            };

        let result =
            dispatch::post_payload(&self.http_client, &self.config.api_url, headers, payload).await;
        dispatch::log_outcome(op, &result);
        result
    }

    /// Starts a fluent dispatch for any serializable payload.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use singlebase_rs::Client;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::new("api-key", "my-project")?;
    ///
    /// let result = client
    ///     .request(json!({"op": "auth.me"}))
    ///     .with_header("x-request-source", "cli")
    ///     .with_bearer_token("user-session-token")
    ///     .send()
    ///     .await
    ///     .into_std()?;
    ///
    /// println!("{}", result.get("user.email", json!(null))?);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn request(&self, payload: impl Serialize) -> DispatchRequest<'_> {
        DispatchRequest::new(self, payload)
    }

    /// Uploads a local file to a presigned URL, reusing this client's connection
    /// pool. Uploads are not subject to the dispatch timeout.
    ///
    /// # Errors
    ///
    /// See [`upload_presigned_file`](crate::upload_presigned_file).
    pub async fn upload_presigned_file(
        &self,
        path: impl AsRef<Path>,
        upload: &PresignedUpload,
    ) -> Result<bool, SinglebaseError> {
        upload::upload_presigned_file(&self.upload_client, path, upload).await
    }

    /// Validates a raw presign descriptor and uploads `path` to it.
    ///
    /// # Errors
    ///
    /// See [`upload_presigned_value`](crate::upload_presigned_value).
    pub async fn upload_presigned_value(
        &self,
        path: impl AsRef<Path>,
        descriptor: &Value,
    ) -> Result<bool, SinglebaseError> {
        upload::upload_presigned_value(&self.upload_client, path, descriptor).await
    }
}
