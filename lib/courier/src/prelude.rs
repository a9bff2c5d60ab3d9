//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types, functions, and macros
//! for easy glob importing:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    ClientConfig, ErrorCode, FetchError, FetchResult, Fetcher, FieldValue, Fields, FileField,
    HttpClient, HyperClient, Identity, Method, Request, ResponseEvents, ResponseHead, StatusCode,
    Suspending, fields, header, to_form_data, to_query_string,
};
pub use serde::{Deserialize, Serialize};
