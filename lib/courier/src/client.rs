//! HTTP client implementation using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use courier_core::{Error, Request, Response, Result};
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;
use tracing::trace;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;

/// Future type for the Tower [`Service`] implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// HTTP client using hyper-util with connection pooling and TLS.
///
/// Cloning is cheap and clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use courier::HyperClient;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(10))
///     .user_agent("profile-app/1.0")
///     .build();
/// # let _ = client;
/// ```
#[derive(Clone)]
pub struct HyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
    user_agent: Option<HeaderValue>,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let connector = https_connector(config.http2);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        // An unrepresentable user agent is skipped rather than failing every request.
        let user_agent = HeaderValue::try_from(config.user_agent.as_str()).ok();

        Self {
            inner,
            config,
            user_agent,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a hyper request, filling in configured headers the request left unset.
    fn build_hyper_request(&self, request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, mut headers, body) = request.into_parts();

        for (name, value) in &self.config.default_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        if let Some(user_agent) = &self.user_agent
            && !headers.contains_key(USER_AGENT)
        {
            headers.insert(USER_AGENT, user_agent.clone());
        }

        let body = body.map_or_else(Full::default, Full::new);
        let mut http_request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *http_request.headers_mut() = headers;

        Ok(http_request)
    }

    async fn send(&self, request: Request) -> Result<Response<Bytes>> {
        let hyper_request = self.build_hyper_request(request)?;
        trace!(method = %hyper_request.method(), uri = %hyper_request.uri(), "sending request");

        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::body(e.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, parts.headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        if err.is_connect() {
            return Error::connection(format!("connect failed: {err}"));
        }
        Error::connection(err.to_string())
    }

    /// Headers sent when the request does not set them.
    #[must_use]
    pub fn default_headers(&self) -> HeaderMap {
        let mut headers = self.config.default_headers.clone();
        if let Some(user_agent) = &self.user_agent {
            headers.entry(USER_AGENT).or_insert_with(|| user_agent.clone());
        }
        headers
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl courier_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.send(request).await
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

impl Service<Request> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.send(request).await })
    }
}

/// Builder for [`HyperClient`].
#[derive(Debug, Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
}

impl HyperClientBuilder {
    /// Set the request timeout, body read included.
    #[must_use]
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Allow or forbid HTTP/2.
    #[must_use]
    pub fn http2(mut self, enabled: bool) -> Self {
        self.config = self.config.http2(enabled);
        self
    }

    /// Set the `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn default_header(
        mut self,
        name: http::HeaderName,
        value: HeaderValue,
    ) -> Self {
        self.config = self.config.default_header(name, value);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        HyperClient::with_config(self.config.build())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;
    use http::header::{ACCEPT, AUTHORIZATION};
    use url::Url;

    use super::*;

    fn request() -> Request {
        Request::builder(
            Method::GET,
            Url::parse("https://api.example.com/me").expect("url"),
        )
        .header(ACCEPT, HeaderValue::from_static("text/plain"))
        .build()
    }

    #[tokio::test]
    async fn client_default() {
        let client = HyperClient::new();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn client_builder() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .http2(false)
            .build();

        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().pool_idle_per_host, 16);
        assert!(!client.config().http2);
    }

    #[tokio::test]
    async fn configured_headers_do_not_override_request_headers() {
        let client = HyperClient::builder()
            .user_agent("profile-app/1.0")
            .default_header(ACCEPT, HeaderValue::from_static("application/json"))
            .default_header(AUTHORIZATION, HeaderValue::from_static("Bearer t"))
            .build();

        let hyper_request = client.build_hyper_request(request()).expect("request");
        let headers = hyper_request.headers();

        assert_eq!(headers.get(ACCEPT), Some(&HeaderValue::from_static("text/plain")));
        assert_eq!(
            headers.get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer t"))
        );
        assert_eq!(
            headers.get(USER_AGENT),
            Some(&HeaderValue::from_static("profile-app/1.0"))
        );
        assert_eq!(hyper_request.uri(), "https://api.example.com/me");
    }

    #[tokio::test]
    async fn default_headers_include_user_agent() {
        let client = HyperClient::new();
        let headers = client.default_headers();
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .expect("user agent");
        assert!(user_agent.starts_with("courier/"));
    }

    #[tokio::test]
    async fn client_is_debug() {
        let client = HyperClient::new();
        let debug = format!("{client:?}");
        assert!(debug.contains("HyperClient"));
    }
}
