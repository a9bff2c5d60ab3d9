//! Response normalization, listener fan-out and payload encoding.
//!
//! This crate is transport-free; the `courier` crate plugs it onto hyper.
//!
//! - [`ResponseProcessor`] - turns a response into a payload or a [`FetchError`]
//! - [`ResponseEvents`] - success/failure listener registries injected into the processor
//! - [`SuccessModifier`] / [`FailureModifier`] - caller hooks run before listeners
//! - [`FieldValue`] and [`Fields`] - values accepted by the encoder
//! - [`to_query_string`] / [`to_form_data`] - flatten nested fields
//! - [`Response`] / [`ResponseBody`] - buffered response and the decoding contract
//! - [`Request`] and [`HttpClient`] - what a transport receives and implements
//! - [`Error`] and [`Result`] - transport and serialization errors

mod body;
mod client;
mod encode;
mod error;
mod listener;
mod multipart;
pub mod prelude;
mod processor;
mod request;
mod response;
mod value;

pub use body::{ContentType, from_json, from_value, to_json};
pub use client::HttpClient;
pub use encode::{
    EncodeMode, EncodedFields, EncodedValue, encode, encode_component, encode_fields,
    to_form_data, to_query_string,
};
pub use error::{Error, ErrorCode, FetchError, Result};
pub use listener::{FailureListener, ListenerRegistry, ResponseEvents, SuccessListener};
pub use multipart::{Form, Part};
pub use processor::{FailureModifier, Identity, ResponseProcessor, Suspending, SuccessModifier};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBody, ResponseHead};
pub use value::{FieldValue, Fields, FileField, Scalar};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, Method, StatusCode, header};
