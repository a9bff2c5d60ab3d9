//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Multipart form content type (`multipart/form-data`).
    FormData,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormData => "multipart/form-data",
        }
    }

    /// Returns `true` if a `Content-Type` header value denotes this type.
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    #[must_use]
    pub fn matches(&self, header: &str) -> bool {
        header.starts_with(self.as_str())
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
///
/// let bytes = to_json(&serde_json::json!({"name": "Alice"})).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Convert an already decoded payload into a typed value, keeping the path
/// of the failing field in the error.
pub fn from_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
