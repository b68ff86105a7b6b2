//! # singlebase-rs
//!
//! A Rust client library for the Singlebase Cloud API.
//!
//! Every operation is a JSON payload naming an `op`, posted to your project's
//! endpoint. The outcome always comes back as an [`ApiResult`]: success,
//! server rejection, unreadable response and network failure all share the
//! same `ok` / `error` / `status_code` surface, with [`FailureKind`] telling
//! them apart. Files are uploaded separately through presigned URLs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use singlebase_rs::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("your-api-key", "your-endpoint-key")?;
//!
//!     let result = client
//!         .request(json!({"op": "db.find_one", "collection": "articles", "slug": "hello"}))
//!         .send()
//!         .await;
//!
//!     if result.is_ok() {
//!         let title = result.get("document.title", json!("untitled"))?;
//!         println!("{title}");
//!     } else {
//!         eprintln!("{}", result);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Without an async runtime, use [`blocking::Client`] (the default `blocking`
//! feature), which offers the same operations as plain blocking calls.
//!
//! ## Debugging
//!
//! Set `LOUD_WIRE=1` to print every request and response to stderr. Use any
//! `tracing` subscriber to see the crate's debug and warning events.

#[cfg(feature = "blocking")]
pub mod blocking;
mod client;
mod config;
mod errors;
mod http;
pub mod json_ext;
mod path;
mod request;
mod result;
mod upload;


pub use client::{Client, ClientBuilder};
pub use config::{API_KEY_ENV, API_URL_ENV, ClientConfig, DEFAULT_TIMEOUT, ENDPOINT_KEY_ENV};
pub use errors::{ConfigError, FailureKind, PathError, SinglebaseError};
pub use http::common::{
    API_KEY_HEADER, BASE_API_URL, SDK_CLIENT_HEADER, SDK_CLIENT_ID, construct_endpoint_url,
};
pub use request::DispatchRequest;
pub use result::ApiResult;
pub use upload::{FILE_FIELD, PresignedUpload, upload_presigned_file, upload_presigned_value};
