//! Base-URL client running every outcome through a [`ResponseProcessor`].
//!
//! [`Fetcher`] is the piece applications hold on to: it builds the request,
//! hands it to any [`HttpClient`], and resolves to the decoded payload or a
//! [`FetchError`]. Failures to even obtain a response (bad URL, connection
//! refused, timeout) go through
//! [`ResponseProcessor::process_error`], so failure listeners see them too.

use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, info_span, warn};
use url::Url;

use courier_core::{
    Error, FailureModifier, FetchError, Fields, HttpClient, Identity, Method, Request,
    ResponseEvents, ResponseProcessor, Result, SuccessModifier,
};

/// Outcome of a [`Fetcher`] call.
pub type FetchResult<T = Value> = std::result::Result<T, FetchError>;

/// HTTP client bound to a base URL and a listener bus.
///
/// # Example
///
/// ```no_run
/// use courier::{Fetcher, HyperClient, ResponseEvents, fields};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let events = ResponseEvents::new();
/// events.on_failure(|error, head| {
///     if head.status() == 401 {
///         tracing::info!(code = error.code(), "session expired");
///     }
/// });
///
/// let fetcher = Fetcher::with_events(HyperClient::new(), "https://api.example.com", events)?;
/// let users = fetcher.get("/users", &fields! { "page" => 2 }).await?;
/// # let _ = users;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher<C> {
    client: C,
    base_url: Url,
    processor: ResponseProcessor,
}

impl<C> Fetcher<C> {
    /// Create a fetcher with its own, empty listener bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(client: C, base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_events(client, base_url, ResponseEvents::new())
    }

    /// Create a fetcher reporting to an existing listener bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn with_events(
        client: C,
        base_url: impl AsRef<str>,
        events: ResponseEvents,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self::with_url(client, base_url, events))
    }

    /// Create a fetcher from a pre-parsed URL.
    #[must_use]
    pub const fn with_url(client: C, base_url: Url, events: ResponseEvents) -> Self {
        Self {
            client,
            base_url,
            processor: ResponseProcessor::new(events),
        }
    }

    /// Base URL paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The listener bus.
    #[must_use]
    pub const fn events(&self) -> &ResponseEvents {
        self.processor.events()
    }

    /// The processor outcomes go through.
    #[must_use]
    pub const fn processor(&self) -> &ResponseProcessor {
        &self.processor
    }

    /// The underlying HTTP client.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.client
    }

    /// Append `path` to the base URL.
    ///
    /// Unlike [`Url::join`], the last segment of the base is kept:
    /// `https://host/api` + `users` is `https://host/api/users`. A query on
    /// the base is kept and a query in `path` is appended to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path (`mailto:` and the
    /// like).
    pub fn url(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Ok(self.base_url.clone());
        }
        if self.base_url.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "base URL cannot carry a path: {}",
                self.base_url
            )));
        }

        let (path, fragment) = path
            .split_once('#')
            .map_or((path, None), |(path, fragment)| (path, Some(fragment)));
        let (path, query) = path
            .split_once('?')
            .map_or((path, None), |(path, query)| (path, Some(query)));

        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);

        if let Some(query) = query.filter(|query| !query.is_empty()) {
            let merged = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                _ => query.to_string(),
            };
            url.set_query(Some(&merged));
        }
        url.set_fragment(fragment);

        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<courier_core::RequestBuilder> {
        Ok(Request::builder(method, self.url(path)?))
    }
}

impl<C: HttpClient> Fetcher<C> {
    // ------------------------------------------------------------------------
    // Plain calls
    // ------------------------------------------------------------------------

    /// `GET path?query`. Files in `query` are left out.
    pub async fn get(&self, path: &str, query: &Fields) -> FetchResult {
        self.get_with(path, query, &Identity, &Identity).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> FetchResult {
        self.delete_with(path, &Identity, &Identity).await
    }

    /// `POST path` with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> FetchResult {
        self.post_json_with(path, body, &Identity, &Identity).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> FetchResult {
        self.put_json_with(path, body, &Identity, &Identity).await
    }

    /// `POST path` with a `multipart/form-data` body.
    pub async fn post_form(&self, path: &str, fields: &Fields) -> FetchResult {
        self.post_form_with(path, fields, &Identity, &Identity).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request) -> FetchResult {
        self.send_with(Ok(request), &Identity, &Identity).await
    }

    // ------------------------------------------------------------------------
    // Calls with modifiers
    // ------------------------------------------------------------------------

    /// [`get`](Self::get) with modifiers.
    pub async fn get_with<S, F>(
        &self,
        path: &str,
        query: &Fields,
        on_success: &S,
        on_failure: &F,
    ) -> FetchResult
    where
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = self
            .request(Method::GET, path)
            .and_then(|builder| builder.query(query))
            .map(courier_core::RequestBuilder::build);
        self.send_with(request, on_success, on_failure).await
    }

    /// [`delete`](Self::delete) with modifiers.
    pub async fn delete_with<S, F>(&self, path: &str, on_success: &S, on_failure: &F) -> FetchResult
    where
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = self
            .request(Method::DELETE, path)
            .map(courier_core::RequestBuilder::build);
        self.send_with(request, on_success, on_failure).await
    }

    /// [`post_json`](Self::post_json) with modifiers.
    pub async fn post_json_with<T, S, F>(
        &self,
        path: &str,
        body: &T,
        on_success: &S,
        on_failure: &F,
    ) -> FetchResult
    where
        T: Serialize + ?Sized,
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = self
            .request(Method::POST, path)
            .and_then(|builder| builder.json(body))
            .map(courier_core::RequestBuilder::build);
        self.send_with(request, on_success, on_failure).await
    }

    /// [`put_json`](Self::put_json) with modifiers.
    pub async fn put_json_with<T, S, F>(
        &self,
        path: &str,
        body: &T,
        on_success: &S,
        on_failure: &F,
    ) -> FetchResult
    where
        T: Serialize + ?Sized,
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = self
            .request(Method::PUT, path)
            .and_then(|builder| builder.json(body))
            .map(courier_core::RequestBuilder::build);
        self.send_with(request, on_success, on_failure).await
    }

    /// [`post_form`](Self::post_form) with modifiers.
    pub async fn post_form_with<S, F>(
        &self,
        path: &str,
        fields: &Fields,
        on_success: &S,
        on_failure: &F,
    ) -> FetchResult
    where
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = self
            .request(Method::POST, path)
            .and_then(|builder| builder.form_data(fields))
            .map(courier_core::RequestBuilder::build);
        self.send_with(request, on_success, on_failure).await
    }

    /// Send a request, or report why it could not be built.
    ///
    /// A request that could not be built, sent, or answered is normalized
    /// through [`ResponseProcessor::process_error`] with
    /// `{"message": <cause>}` as the raw error.
    pub async fn send_with<S, F>(
        &self,
        request: Result<Request>,
        on_success: &S,
        on_failure: &F,
    ) -> FetchResult
    where
        S: SuccessModifier,
        F: FailureModifier,
    {
        let request = match request {
            Ok(request) => request,
            Err(err) => return Err(self.fail(&err, on_failure).await),
        };

        let span = info_span!("fetch", method = %request.method(), url = %request.url());
        async move {
            match self.client.execute(request).await {
                Ok(response) => {
                    self.processor
                        .process_response(response, on_success, on_failure)
                        .await
                }
                Err(err) => Err(self.fail(&err, on_failure).await),
            }
        }
        .instrument(span)
        .await
    }

    async fn fail<F: FailureModifier>(&self, err: &Error, on_failure: &F) -> FetchError {
        warn!(error = %err, timeout = err.is_timeout(), "no response");
        self.processor
            .process_error(&err.to_raw_error(), on_failure)
            .await
    }
}
