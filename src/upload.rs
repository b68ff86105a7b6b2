//! Presigned file uploads.
//!
//! A presign operation dispatched through the [`Client`](crate::Client) returns
//! a URL and a set of form fields. The file is then posted straight to that URL
//! as `multipart/form-data`, with no further authorization.
//!
//! # Example
//!
//! ```no_run
//! use singlebase_rs::{Client, PresignedUpload};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("api-key", "my-project")?;
//!
//! let presign = client
//!     .request(json!({"op": "file.presign_upload", "filename": "report.pdf"}))
//!     .send()
//!     .await
//!     .into_std()?;
//!
//! let upload = PresignedUpload::from_value(&presign.get("", json!(null))?)?;
//! client.upload_presigned_file("report.pdf", &upload).await?;
//! # Ok(())
//! # }
//! ```

use crate::errors::SinglebaseError;
use crate::http::error_helpers::body_preview;
use crate::http::loud_wire;
use reqwest::Client as ReqwestClient;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Form field name that carries the file content.
pub const FILE_FIELD: &str = "file";

/// Content type declared for the file part.
pub(crate) const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// A presigned upload target: where to post and which form fields to include.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    /// Upload URL
    pub url: String,
    /// Form fields required by the storage service, sent before the file
    pub fields: BTreeMap<String, String>,
}

impl PresignedUpload {
    /// Creates a descriptor from its parts.
    #[must_use]
    pub fn new(url: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            url: url.into(),
            fields,
        }
    }

    /// Validates a raw descriptor such as the `data` of a presign response.
    ///
    /// # Errors
    ///
    /// Returns [`SinglebaseError::InvalidDescriptor`] if `url` is missing, empty
    /// or not a string, or if `fields` is missing, not an object, or holds a
    /// non-string value.
    pub fn from_value(value: &Value) -> Result<Self, SinglebaseError> {
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SinglebaseError::InvalidDescriptor("missing upload URL".to_string()))?;

        let raw_fields = value
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| SinglebaseError::InvalidDescriptor("missing fields".to_string()))?;

        let fields = raw_fields
            .iter()
            .map(|(name, value)| {
                value
                    .as_str()
                    .map(|v| (name.clone(), v.to_string()))
                    .ok_or_else(|| {
                        SinglebaseError::InvalidDescriptor(format!(
                            "field `{name}` is not a string"
                        ))
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self::new(url, fields))
    }
}

/// Rejects a descriptor without a URL before any file is touched.
pub(crate) fn check_target(upload: &PresignedUpload) -> Result<(), SinglebaseError> {
    if upload.url.is_empty() {
        return Err(SinglebaseError::InvalidDescriptor(
            "missing upload URL".to_string(),
        ));
    }
    Ok(())
}

/// The name the file part is sent under: the path's base name.
pub(crate) fn upload_file_name(path: &Path) -> Result<String, SinglebaseError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SinglebaseError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path has no file name: {}", path.display()),
            ))
        })
}

/// Maps an upload response status to the call's outcome.
pub(crate) fn upload_outcome(status: StatusCode, body: &str) -> Result<bool, SinglebaseError> {
    if status.is_success() {
        debug!(status = status.as_u16(), "Presigned upload completed");
        return Ok(true);
    }

    warn!(status = status.as_u16(), "Presigned upload rejected");
    Err(SinglebaseError::Upload {
        status_code: status.as_u16(),
        message: format!(
            "upload failed with status {status}: {}",
            body_preview(body)
        ),
    })
}

/// Uploads a local file to a presigned URL.
///
/// Sends one `multipart/form-data` POST holding every descriptor field followed
/// by the file under the `file` field, named after the path's base name. The
/// file is streamed from disk rather than read into memory. No timeout is
/// applied beyond whatever `http_client` was built with.
///
/// Returns `Ok(true)` when the storage service answers with a 2xx status.
/// [`Client::upload_presigned_file`](crate::Client::upload_presigned_file) calls
/// this with the client's shared connection pool.
///
/// # Errors
///
/// - [`SinglebaseError::InvalidDescriptor`] if the URL is empty (nothing is sent)
/// - [`SinglebaseError::Io`] if the file cannot be opened or has no file name
/// - [`SinglebaseError::Http`] if the request cannot be sent
/// - [`SinglebaseError::Upload`] on a non-2xx status; the message includes the status
pub async fn upload_presigned_file(
    http_client: &ReqwestClient,
    path: impl AsRef<Path>,
    upload: &PresignedUpload,
) -> Result<bool, SinglebaseError> {
    let path = path.as_ref();
    check_target(upload)?;
    let file_name = upload_file_name(path)?;

    let file = tokio::fs::File::open(path).await?;
    let file_size = file.metadata().await?.len();

    debug!(
        file = %path.display(),
        size = file_size,
        fields = upload.fields.len(),
        "Uploading file to presigned URL"
    );

    let request_id = loud_wire::next_request_id();
    loud_wire::log_upload_start(request_id, &upload.url, &file_name, file_size);

    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    let file_part = Part::stream_with_length(body, file_size)
        .file_name(file_name)
        .mime_str(FILE_CONTENT_TYPE)?;

    let form = upload
        .fields
        .iter()
        .fold(Form::new(), |form, (name, value)| {
            form.text(name.clone(), value.clone())
        })
        .part(FILE_FIELD, file_part);

    let response = http_client
        .post(&upload.url)
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    loud_wire::log_upload_complete(request_id, status.as_u16());

    let body = if status.is_success() {
        String::new()
    } else {
        response.text().await.unwrap_or_default()
    };
    upload_outcome(status, &body)
}

/// Validates a raw descriptor and uploads `path` to it.
///
/// # Errors
///
/// Returns [`SinglebaseError::InvalidDescriptor`] for a malformed descriptor
/// (nothing is sent), otherwise the errors of [`upload_presigned_file`].
pub async fn upload_presigned_value(
    http_client: &ReqwestClient,
    path: impl AsRef<Path>,
    descriptor: &Value,
) -> Result<bool, SinglebaseError> {
    let upload = PresignedUpload::from_value(descriptor)?;
    upload_presigned_file(http_client, path, &upload).await
}
