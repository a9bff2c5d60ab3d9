//! HTTP request building.
//!
//! # Example
//!
//! ```
//! use courier_core::{Request, fields};
//! use http::Method;
//!
//! let request = Request::builder(Method::GET, "https://api.example.com/users".parse().unwrap())
//!     .query(&fields! { "page" => 2, "filter" => fields! { "role" => "admin" } })
//!     .expect("query")
//!     .build();
//!
//! assert_eq!(
//!     request.url().as_str(),
//!     "https://api.example.com/users?page=2&filter[role]=admin"
//! );
//! ```

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use crate::{ContentType, Error, Fields, Result, to_form_data, to_query_string};

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a header from text.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::try_from(name).map_err(|e| Error::invalid_request(e.to_string()))?;
        let value =
            HeaderValue::try_from(value).map_err(|e| Error::invalid_request(e.to_string()))?;
        Ok(self.header(name, value))
    }

    /// Appends nested fields to the URL query string.
    ///
    /// Files are not representable in a URL and are left out.
    pub fn query(mut self, fields: &Fields) -> Result<Self> {
        let encoded = to_query_string(fields)?;
        if encoded.is_empty() {
            return Ok(self);
        }
        let query = match self.url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        };
        self.url.set_query(Some(&query));
        Ok(self)
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static(ContentType::Json.as_str()))
            .body(body))
    }

    /// Set a multipart form body built from nested fields.
    pub fn form_data(self, fields: &Fields) -> Result<Self> {
        let (content_type, body) = to_form_data(fields)?.into_body();
        let content_type =
            HeaderValue::try_from(content_type).map_err(|e| Error::invalid_request(e.to_string()))?;
        Ok(self.header(CONTENT_TYPE, content_type).body(body))
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}
