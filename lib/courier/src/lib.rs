//! HTTP fetch helper with normalized errors and outcome listeners.
//!
//! Every call resolves to the decoded payload or a [`FetchError`] with a
//! stable `code`, a human `message` and the raw `payload`. Success and
//! failure listeners registered on a [`ResponseEvents`] bus observe every
//! outcome, which suits cross-cutting reactions such as toasts or logging
//! out on `Unauthenticated`.
//!
//! # Example
//!
//! ```no_run
//! use courier::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(HyperClient::new(), "https://api.example.com")?;
//! fetcher.events().on_failure(|error, _head| {
//!     tracing::warn!(code = error.code(), message = error.message(), "request failed");
//! });
//!
//! let avatar = FileField::new("me.png", std::fs::read("me.png")?);
//! fetcher
//!     .post_form("/me/avatar", &fields! { "avatar" => avatar, "public" => true })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
mod fetcher;
pub mod prelude;

pub use client::{HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connector::https_connector;
pub use fetcher::{FetchResult, Fetcher};

// Re-export core types
pub use courier_core::{
    ContentType, EncodeMode, EncodedFields, EncodedValue, Error, ErrorCode, FailureListener,
    FailureModifier, FetchError, FieldValue, Fields, FileField, Form, HttpClient, Identity,
    ListenerRegistry, Method, Part, Request, RequestBuilder, Response, ResponseBody,
    ResponseEvents, ResponseHead, ResponseProcessor, Result, Scalar, SuccessListener,
    SuccessModifier, Suspending, encode, encode_component, encode_fields, fields, from_json,
    to_form_data, to_json, to_query_string,
};

// Re-export http types for status codes and headers
pub use courier_core::{HeaderMap, StatusCode, header};

pub use url;
