//! Error types for courier.
//!
//! Two families live here:
//! - [`Error`]: transport and serialization failures (no usable response).
//! - [`FetchError`]: the normalized `{code, message, payload}` shape every
//!   failed request ends up as, built by the [`ResponseProcessor`](crate::ResponseProcessor).

use derive_more::{Display, Error, From};
use serde_json::Value;

// ============================================================================
// Error Codes
// ============================================================================

/// Status-derived error codes.
///
/// Server-supplied codes always take precedence; these are the fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorCode {
    /// 400 Bad Request.
    #[display("Invalid")]
    Invalid,
    /// 401 Unauthorized (missing or bad credentials).
    #[display("Unauthenticated")]
    Unauthenticated,
    /// 403 Forbidden.
    #[display("Unauthorized")]
    Unauthorized,
    /// 404 Not Found.
    #[display("NotFound")]
    NotFound,
    /// Anything else, including failures without a response.
    #[display("Unknown")]
    Unknown,
}

impl ErrorCode {
    /// Code for a non-success HTTP status.
    #[must_use]
    pub const fn for_status(status: u16) -> Self {
        match status {
            400 => Self::Invalid,
            401 => Self::Unauthenticated,
            403 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Unknown,
        }
    }

    /// The wire representation of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Unauthenticated => "Unauthenticated",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "NotFound",
            Self::Unknown => "Unknown",
        }
    }

    /// Message used when the server did not send one.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid Request",
            Self::Unauthenticated => "Unauthenticated",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "Not Found",
            Self::Unknown => "Unknown error",
        }
    }
}

// ============================================================================
// Structured Error
// ============================================================================

/// Normalized failure of a request.
///
/// Once built the error is never mutated in place; the `with_*` methods
/// consume it and return a new value, which is what failure modifiers use.
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("{code}: {message}")]
pub struct FetchError {
    code: String,
    message: String,
    #[error(not(source))]
    payload: Value,
}

impl FetchError {
    /// Create a structured error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>, payload: Value) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            payload,
        }
    }

    /// Create an error from a known code, using its default message.
    #[must_use]
    pub fn from_code(code: ErrorCode, payload: Value) -> Self {
        Self::new(code.as_str(), code.default_message(), payload)
    }

    /// The generic error used when nothing better is known.
    #[must_use]
    pub fn unknown() -> Self {
        Self::from_code(ErrorCode::Unknown, Value::Null)
    }

    /// The error for a success response whose body could not be decoded.
    ///
    /// Code and message are both `Unknown error`.
    #[must_use]
    pub fn undecodable() -> Self {
        let message = ErrorCode::Unknown.default_message();
        Self::new(message, message, Value::Null)
    }

    /// Error code (`NotFound`, `Invalid`, or a server-supplied code).
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Decoded body of the failed response, or the raw error.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns `true` if the code matches the given taxonomy entry.
    #[must_use]
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }

    /// Replace the code.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..self
        }
    }

    /// Replace the message.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_payload(self, payload: Value) -> Self {
        Self { payload, ..self }
    }

    /// Consume into (code, message, payload).
    #[must_use]
    pub fn into_parts(self) -> (String, String, Value) {
        (self.code, self.message, self.payload)
    }

    /// Try to decode the payload into a typed value.
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_value(self.payload.clone())
    }
}

// ============================================================================
// Transport Error
// ============================================================================

/// Transport and serialization errors.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Response body could not be read.
    #[display("body error: {_0}")]
    #[from(skip)]
    Body(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a body error.
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Error-like value handed to
    /// [`ResponseProcessor::process_error`](crate::ResponseProcessor::process_error)
    /// when a request produced no response at all.
    #[must_use]
    pub fn to_raw_error(&self) -> Value {
        serde_json::json!({ "message": self.to_string() })
    }
}
