//! HTTP response types.
//!
//! [`ResponseHead`] is what modifiers and listeners see; [`ResponseBody`] is
//! the decoding side the [`ResponseProcessor`](crate::ResponseProcessor)
//! consumes. [`Response`] is the buffered implementation of both.

use std::future::Future;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::Value;

use crate::Result;

/// Status and headers of a received response.
///
/// Header lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHead {
    status: u16,
    headers: HeaderMap,
}

impl ResponseHead {
    /// Creates a response head.
    #[must_use]
    pub const fn new(status: u16, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Placeholder for failures that never produced a response.
    ///
    /// Status is `0` and there are no headers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// HTTP status code, `0` for the empty placeholder.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by name, if present and valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 304 Not Modified.
    #[must_use]
    pub const fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    /// Returns `true` for the [`ResponseHead::empty`] placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == 0 && self.headers.is_empty()
    }
}

/// A response whose body can be decoded once.
///
/// Decoding consumes the response; callers keep a clone of the
/// [`head`](ResponseBody::head) if they need it afterwards.
pub trait ResponseBody: Send {
    /// Status and headers.
    fn head(&self) -> &ResponseHead;

    /// Decode the body as JSON.
    fn json(self) -> impl Future<Output = Result<Value>> + Send;

    /// Read the body as UTF-8 text.
    fn text(self) -> impl Future<Output = Result<String>> + Send;
}

// ============================================================================
// Buffered Response
// ============================================================================

/// HTTP response with status, headers, and a fully read body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    head: ResponseHead,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub const fn new(status: u16, headers: HeaderMap, body: B) -> Self {
        Self {
            head: ResponseHead::new(status, headers),
            body,
        }
    }

    /// Creates a response from an existing head.
    #[must_use]
    pub const fn from_parts(head: ResponseHead, body: B) -> Self {
        Self { head, body }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.head.status()
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into (head, body).
    #[must_use]
    pub fn into_parts(self) -> (ResponseHead, B) {
        (self.head, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.head.is_ok()
    }
}

impl Response<Bytes> {
    /// The body as text, invalid UTF-8 sequences replaced by `U+FFFD`.
    #[must_use]
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseBody for Response<Bytes> {
    fn head(&self) -> &ResponseHead {
        &self.head
    }

    async fn json(self) -> Result<Value> {
        crate::from_json(&self.body)
    }

    async fn text(self) -> Result<String> {
        Ok(self.text_lossy())
    }
}
