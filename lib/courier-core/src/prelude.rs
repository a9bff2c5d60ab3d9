//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    ErrorCode, FetchError, FieldValue, Fields, FileField, Identity, ResponseBody, ResponseEvents,
    ResponseHead, ResponseProcessor, Suspending, fields, to_form_data, to_query_string,
};
