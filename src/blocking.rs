//! Synchronous client for callers without an async runtime.
//!
//! Mirrors [`crate::Client`]: same configuration, same header layering, same
//! [`ApiResult`] normalization. Every call blocks the current thread until the
//! single HTTP request completes.
//!
//! Do not use this client from inside an async runtime; reqwest's blocking
//! client panics when driven from an async context.
//!
//! ```no_run
//! use singlebase_rs::blocking;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = blocking::Client::new("api-key", "my-project")?;
//! let result = client.dispatch(&json!({"op": "db.count", "collection": "users"}), None, None);
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::errors::SinglebaseError;
use crate::http::dispatch;
use crate::http::loud_wire;
use crate::result::ApiResult;
use crate::upload::{
    FILE_CONTENT_TYPE, FILE_FIELD, PresignedUpload, check_target, upload_file_name, upload_outcome,
};
use reqwest::blocking::Client as BlockingClient;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Blocking counterpart of [`crate::Client`].
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http_client: BlockingClient,
    upload_client: BlockingClient,
}

impl Client {
    /// Creates a client for an endpoint key with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Config`] if either argument is empty.
    pub fn new(
        api_key: impl Into<String>,
        endpoint_key: impl Into<String>,
    ) -> Result<Self, SinglebaseError> {
        crate::Client::builder(api_key)
            .endpoint_key(endpoint_key)
            .build_blocking()
    }

    /// Creates a client from the `SINGLEBASE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::Config`] if the variables are missing or empty.
    pub fn from_env() -> Result<Self, SinglebaseError> {
        crate::Client::builder_from_lookup(|name| std::env::var(name).ok()).build_blocking()
    }

    pub(crate) fn from_config(config: ClientConfig) -> Result<Self, SinglebaseError> {
        let build_error = |e: reqwest::Error| SinglebaseError::ClientBuild(e.to_string());

        // The blocking builder applies a 30 second default unless told otherwise.
        let mut builder = BlockingClient::builder().timeout(config.timeout);
        let mut upload_builder = BlockingClient::builder().timeout(None::<Duration>);
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
            upload_builder = upload_builder.connect_timeout(connect_timeout);
        }
        let http_client = builder.build().map_err(build_error)?;
        let upload_client = upload_builder.build().map_err(build_error)?;

        debug!(api_url = %config.api_url, "Created blocking Singlebase client");

        Ok(Self {
            config: Arc::new(config),
            http_client,
            upload_client,
        })
    }

    /// The configuration shared by this client and its clones.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatches an operation payload and returns its normalized result.
    ///
    /// Behaves exactly like [`crate::Client::dispatch`], blocking until done.
    pub fn dispatch(
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
            dispatch::post_payload_blocking(&self.http_client, &self.config.api_url, headers, payload);
        dispatch::log_outcome(op, &result);
        result
    }

    /// Uploads a local file to a presigned URL.
    ///
    /// Same form layout and outcomes as [`crate::upload_presigned_file`]; the
    /// file is read from disk as the request body is written.
    ///
    /// # Errors
    ///
    /// - [`SinglebaseError::InvalidDescriptor`] if the URL is empty (nothing is sent)
    /// - [`SinglebaseError::Io`] if the file cannot be opened or has no file name
    /// - [`SinglebaseError::Http`] if the request cannot be sent
    /// - [`SinglebaseError::Upload`] on a non-2xx status
    pub fn upload_presigned_file(
        &self,
        path: impl AsRef<Path>,
        upload: &PresignedUpload,
    ) -> Result<bool, SinglebaseError> {
        let path = path.as_ref();
        check_target(upload)?;
        let file_name = upload_file_name(path)?;

        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            file = %path.display(),
            size = file_size,
            fields = upload.fields.len(),
            "Uploading file to presigned URL"
        );

        let request_id = loud_wire::next_request_id();
        loud_wire::log_upload_start(request_id, &upload.url, &file_name, file_size);

        let file_part = Part::reader_with_length(file, file_size)
            .file_name(file_name)
            .mime_str(FILE_CONTENT_TYPE)?;

        let form = upload
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
            .part(FILE_FIELD, file_part);

        let response = self.upload_client.post(&upload.url).multipart(form).send()?;

        let status = response.status();
        loud_wire::log_upload_complete(request_id, status.as_u16());

        let body = if status.is_success() {
            String::new()
        } else {
            response.text().unwrap_or_default()
        };
        upload_outcome(status, &body)
    }

    /// Validates a raw presign descriptor and uploads `path` to it.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::InvalidDescriptor`] for a malformed descriptor
    /// (nothing is sent), otherwise the errors of [`upload_presigned_file`](Self::upload_presigned_file).
    pub fn upload_presigned_value(
        &self,
        path: impl AsRef<Path>,
        descriptor: &Value,
    ) -> Result<bool, SinglebaseError> {
        let upload = PresignedUpload::from_value(descriptor)?;
        self.upload_presigned_file(path, &upload)
    }
}
