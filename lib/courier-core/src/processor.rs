//! Response classification and error normalization.
//!
//! [`ResponseProcessor::process_response`] turns a received response into
//! either the decoded payload or a [`FetchError`]:
//!
//! 1. The body is read according to `Content-Type`: none means `null`,
//!    `application/json` is decoded, anything else becomes `{"text": ...}`.
//! 2. `2xx` and `304` take the success path, everything else the failure path.
//! 3. The matching modifier runs, then the matching listeners, then the
//!    outcome is returned.
//!
//! A success body that cannot be read yields [`FetchError::undecodable`]
//! (code and message `Unknown error`) without notifying anyone. A failure body that
//! cannot be read is treated as `{}`.

use std::future::Future;
use std::num::FpCategory;

use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::{ContentType, ErrorCode, FetchError, ResponseBody, ResponseEvents, ResponseHead, Result};

// ============================================================================
// Modifiers
// ============================================================================

/// Transforms a successful payload before listeners and caller see it.
///
/// Implemented for closures `Fn(Value, &ResponseHead) -> Value`, for
/// [`Identity`], and for [`Suspending`] async closures.
pub trait SuccessModifier: Send + Sync {
    /// Produce the payload to hand out.
    fn modify(&self, payload: Value, head: &ResponseHead) -> impl Future<Output = Value> + Send;
}

/// Transforms a structured error before listeners and caller see it.
///
/// Implemented for closures `Fn(FetchError, &ResponseHead) -> FetchError`,
/// for [`Identity`], and for [`Suspending`] async closures.
pub trait FailureModifier: Send + Sync {
    /// Produce the error to hand out.
    fn modify(
        &self,
        error: FetchError,
        head: &ResponseHead,
    ) -> impl Future<Output = FetchError> + Send;
}

/// Modifier that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl SuccessModifier for Identity {
    async fn modify(&self, payload: Value, _head: &ResponseHead) -> Value {
        payload
    }
}

impl FailureModifier for Identity {
    async fn modify(&self, error: FetchError, _head: &ResponseHead) -> FetchError {
        error
    }
}

impl<F> SuccessModifier for F
where
    F: Fn(Value, &ResponseHead) -> Value + Send + Sync,
{
    fn modify(&self, payload: Value, head: &ResponseHead) -> impl Future<Output = Value> + Send {
        std::future::ready(self(payload, head))
    }
}

impl<F> FailureModifier for F
where
    F: Fn(FetchError, &ResponseHead) -> FetchError + Send + Sync,
{
    fn modify(
        &self,
        error: FetchError,
        head: &ResponseHead,
    ) -> impl Future<Output = FetchError> + Send {
        std::future::ready(self(error, head))
    }
}

/// Adapter for modifiers that need to await something.
///
/// The closure receives an owned copy of the response head.
///
/// # Example
///
/// ```
/// use courier_core::{ResponseHead, Suspending};
/// use serde_json::Value;
///
/// let unwrap_data = Suspending(|payload: Value, _head: ResponseHead| async move {
///     payload.get("data").cloned().unwrap_or(Value::Null)
/// });
/// # let _ = unwrap_data;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Suspending<F>(pub F);

impl<F, Fut> SuccessModifier for Suspending<F>
where
    F: Fn(Value, ResponseHead) -> Fut + Send + Sync,
    Fut: Future<Output = Value> + Send,
{
    fn modify(&self, payload: Value, head: &ResponseHead) -> impl Future<Output = Value> + Send {
        (self.0)(payload, head.clone())
    }
}

impl<F, Fut> FailureModifier for Suspending<F>
where
    F: Fn(FetchError, ResponseHead) -> Fut + Send + Sync,
    Fut: Future<Output = FetchError> + Send,
{
    fn modify(
        &self,
        error: FetchError,
        head: &ResponseHead,
    ) -> impl Future<Output = FetchError> + Send {
        (self.0)(error, head.clone())
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Classifies responses and fans outcomes out to a [`ResponseEvents`] bus.
#[derive(Debug, Clone, Default)]
pub struct ResponseProcessor {
    events: ResponseEvents,
}

impl ResponseProcessor {
    /// Create a processor notifying the given bus.
    #[must_use]
    pub const fn new(events: ResponseEvents) -> Self {
        Self { events }
    }

    /// The bus outcomes are reported to.
    #[must_use]
    pub const fn events(&self) -> &ResponseEvents {
        &self.events
    }

    /// [`process_response`](Self::process_response) without modifiers.
    pub async fn process<R: ResponseBody>(&self, response: R) -> std::result::Result<Value, FetchError> {
        self.process_response(response, &Identity, &Identity).await
    }

    /// Classify `response` and produce its payload or its structured error.
    pub async fn process_response<R, S, F>(
        &self,
        response: R,
        on_success: &S,
        on_failure: &F,
    ) -> std::result::Result<Value, FetchError>
    where
        R: ResponseBody,
        S: SuccessModifier,
        F: FailureModifier,
    {
        let head = response.head().clone();
        let content = read_content(response).await;

        if head.is_ok() || head.is_not_modified() {
            let payload = match content {
                Ok(payload) => payload,
                Err(err) => {
                    error!(status = head.status(), error = %err, "failed to read response body");
                    return Err(FetchError::undecodable());
                }
            };

            let payload = on_success.modify(payload, &head).await;
            debug!(status = head.status(), "request succeeded");
            self.events.notify_success(&payload, &head);
            return Ok(payload);
        }

        let payload = match content {
            Ok(Value::Null) => Value::Object(Map::new()),
            Ok(payload) => payload,
            Err(err) => {
                debug!(status = head.status(), error = %err, "unreadable error body");
                Value::Object(Map::new())
            }
        };

        let fetch_error = normalize(payload, ErrorCode::for_status(head.status()));
        let fetch_error = on_failure.modify(fetch_error, &head).await;
        debug!(
            status = head.status(),
            code = fetch_error.code(),
            "request failed"
        );
        self.events.notify_failure(&fetch_error, &head);
        Err(fetch_error)
    }

    /// Normalize a failure that produced no response at all.
    ///
    /// Listeners receive [`ResponseHead::empty`]. The error is returned, not
    /// raised: the caller decides whether to propagate it.
    pub async fn process_error<F: FailureModifier>(&self, raw: &Value, on_failure: &F) -> FetchError {
        let head = ResponseHead::empty();
        let fetch_error = normalize(raw.clone(), ErrorCode::Unknown);
        let fetch_error = on_failure.modify(fetch_error, &head).await;
        debug!(code = fetch_error.code(), "request failed without response");
        self.events.notify_failure(&fetch_error, &head);
        fetch_error
    }

    /// [`process_error`](Self::process_error) without modifier.
    pub async fn normalize_error(&self, raw: &Value) -> FetchError {
        self.process_error(raw, &Identity).await
    }
}

async fn read_content<R: ResponseBody>(response: R) -> Result<Value> {
    let is_json = match response.head().content_type() {
        None => return Ok(Value::Null),
        Some(content_type) => ContentType::Json.matches(content_type),
    };

    if is_json {
        response.json().await
    } else {
        let text = response.text().await?;
        Ok(json!({ "text": text }))
    }
}

/// Build the structured error, preferring fields of `payload` over the
/// defaults of `fallback`.
fn normalize(payload: Value, fallback: ErrorCode) -> FetchError {
    let code = truthy_text(payload.get("code"))
        .unwrap_or_else(|| fallback.as_str().to_string());
    let message = truthy_text(payload.get("message"))
        .or_else(|| truthy_text(payload.get("error")))
        .unwrap_or_else(|| fallback.default_message().to_string());
    FetchError::new(code, message, payload)
}

/// Text of a field, if the field is present and not empty, zero, false or null.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number)
            if number
                .as_f64()
                .is_some_and(|n| n.classify() == FpCategory::Zero) =>
        {
            None
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, header::CONTENT_TYPE};

    use super::*;
    use crate::{Error, Response};

    fn response(status: u16, content_type: Option<&'static str>, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Response::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    fn json_response(status: u16, body: &'static str) -> Response {
        response(status, Some("application/json; charset=utf-8"), body)
    }

    /// A response whose body read fails mid-way.
    struct BrokenBody {
        head: ResponseHead,
    }

    impl ResponseBody for BrokenBody {
        fn head(&self) -> &ResponseHead {
            &self.head
        }

        async fn json(self) -> Result<Value> {
            Err(Error::connection("connection reset"))
        }

        async fn text(self) -> Result<String> {
            Err(Error::connection("connection reset"))
        }
    }

    fn broken(status: u16) -> BrokenBody {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        BrokenBody {
            head: ResponseHead::new(status, headers),
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Processor whose listeners write `success:<n>:<payload>` / `failure:<n>:<code>`.
    fn observed_processor(listeners: usize) -> (ResponseProcessor, Log) {
        let events = ResponseEvents::new();
        let log: Log = Arc::default();
        for n in 0..listeners {
            let success_log = Arc::clone(&log);
            events.on_success(move |payload, head| {
                success_log
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("success:{n}:{payload}:{}", head.status()));
            });
            let failure_log = Arc::clone(&log);
            events.on_failure(move |error, head| {
                failure_log
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("failure:{n}:{}:{}", error.code(), head.status()));
            });
        }
        (ResponseProcessor::new(events), log)
    }

    #[tokio::test]
    async fn success_resolves_payload_and_notifies_in_order() {
        let (processor, log) = observed_processor(3);

        let payload = processor
            .process(json_response(200, r#"{"a":1}"#))
            .await
            .expect("success");

        assert_eq!(payload, json!({"a": 1}));
        assert_eq!(
            entries(&log),
            [
                r#"success:0:{"a":1}:200"#,
                r#"success:1:{"a":1}:200"#,
                r#"success:2:{"a":1}:200"#,
            ]
        );
    }

    #[tokio::test]
    async fn not_modified_is_a_success() {
        let (processor, log) = observed_processor(1);

        let payload = processor
            .process(response(304, None, ""))
            .await
            .expect("success");

        assert!(payload.is_null());
        assert_eq!(entries(&log), ["success:0:null:304"]);
    }

    #[tokio::test]
    async fn non_json_body_is_wrapped_as_text() {
        let processor = ResponseProcessor::default();

        let payload = processor
            .process(response(200, Some("text/html"), "<p>hi</p>"))
            .await
            .expect("success");

        assert_eq!(payload, json!({"text": "<p>hi</p>"}));
    }

    #[tokio::test]
    async fn missing_content_type_resolves_to_null_without_reading_body() {
        let processor = ResponseProcessor::default();
        let payload = processor
            .process(response(200, None, "not json at all"))
            .await
            .expect("success");
        assert!(payload.is_null());
    }

    #[tokio::test]
    async fn not_found_uses_status_defaults() {
        let (processor, log) = observed_processor(2);

        let result = processor.process(json_response(404, "{}")).await;

        let_assert!(Err(err) = result);
        check!(err.code() == "NotFound");
        check!(err.message() == "Not Found");
        check!(err.payload() == &json!({}));
        assert_eq!(entries(&log), ["failure:0:NotFound:404", "failure:1:NotFound:404"]);
    }

    #[tokio::test]
    async fn status_defaults_table() {
        let processor = ResponseProcessor::default();
        let cases = [
            (400, "Invalid", "Invalid Request"),
            (401, "Unauthenticated", "Unauthenticated"),
            (403, "Unauthorized", "Unauthorized"),
            (404, "NotFound", "Not Found"),
            (409, "Unknown", "Unknown error"),
            (500, "Unknown", "Unknown error"),
            (302, "Unknown", "Unknown error"),
        ];

        for (status, code, message) in cases {
            let err = processor
                .process(json_response(status, "{}"))
                .await
                .expect_err("failure");
            assert_eq!((err.code(), err.message()), (code, message), "status {status}");
        }
    }

    #[tokio::test]
    async fn server_code_and_message_take_precedence() {
        let processor = ResponseProcessor::default();

        let err = processor
            .process(json_response(
                400,
                r#"{"code":"EmailTaken","message":"Email already used","field":"email"}"#,
            ))
            .await
            .expect_err("failure");

        assert_eq!(err.code(), "EmailTaken");
        assert_eq!(err.message(), "Email already used");
        assert_eq!(err.payload()["field"], "email");
    }

    #[tokio::test]
    async fn error_field_is_used_when_message_is_missing_or_empty() {
        let processor = ResponseProcessor::default();

        let err = processor
            .process(json_response(401, r#"{"message":"","error":"token expired"}"#))
            .await
            .expect_err("failure");

        assert_eq!(err.code(), "Unauthenticated");
        assert_eq!(err.message(), "token expired");
    }

    #[tokio::test]
    async fn falsy_code_falls_back_to_default() {
        let processor = ResponseProcessor::default();

        let err = processor
            .process(json_response(403, r#"{"code":0,"message":null}"#))
            .await
            .expect_err("failure");
        assert_eq!((err.code(), err.message()), ("Unauthorized", "Unauthorized"));

        let err = processor
            .process(json_response(500, r#"{"code":42}"#))
            .await
            .expect_err("failure");
        assert_eq!(err.code(), "42");
    }

    #[tokio::test]
    async fn text_error_body_keeps_status_defaults() {
        let processor = ResponseProcessor::default();

        let err = processor
            .process(response(404, Some("text/plain"), "nothing here"))
            .await
            .expect_err("failure");

        assert!(err.is(ErrorCode::NotFound));
        assert_eq!(err.payload(), &json!({"text": "nothing here"}));
    }

    #[tokio::test]
    async fn unreadable_error_body_degrades_to_empty_payload() {
        let (processor, log) = observed_processor(1);

        let err = processor
            .process(json_response(404, "<html>oops</html>"))
            .await
            .expect_err("failure");
        assert_eq!((err.code(), err.message()), ("NotFound", "Not Found"));
        assert_eq!(err.payload(), &json!({}));

        let err = processor.process(response(400, None, "")).await.expect_err("failure");
        assert!(err.is(ErrorCode::Invalid));
        assert_eq!(err.payload(), &json!({}));

        assert_eq!(entries(&log), ["failure:0:NotFound:404", "failure:0:Invalid:400"]);
    }

    #[tokio::test]
    async fn unreadable_success_body_is_unknown_and_silent() {
        let (processor, log) = observed_processor(2);

        let err = processor
            .process(json_response(200, "not json"))
            .await
            .expect_err("failure");
        assert_eq!(err, FetchError::undecodable());
        assert_eq!((err.code(), err.message()), ("Unknown error", "Unknown error"));
        assert_eq!(err.payload(), &Value::Null);

        let err = processor.process(broken(200)).await.expect_err("failure");
        assert_eq!((err.code(), err.message()), ("Unknown error", "Unknown error"));

        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_text_is_decoded_lossily() {
        let (processor, log) = observed_processor(1);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let ok = Response::new(200, headers.clone(), Bytes::from_static(&[b'h', b'i', 0xFF]));
        let payload = processor.process(ok).await.expect("success");
        assert_eq!(payload, json!({"text": "hi\u{FFFD}"}));

        let missing = Response::new(404, headers, Bytes::from_static(&[b'h', b'i', 0xFF]));
        let err = processor.process(missing).await.expect_err("failure");
        assert!(err.is(ErrorCode::NotFound));
        assert_eq!(err.payload(), &json!({"text": "hi\u{FFFD}"}));

        let success = format!("success:0:{}:200", json!({"text": "hi\u{FFFD}"}));
        assert_eq!(entries(&log), [success.as_str(), "failure:0:NotFound:404"]);
    }

    #[tokio::test]
    async fn broken_error_body_still_notifies() {
        let (processor, log) = observed_processor(1);

        let err = processor.process(broken(401)).await.expect_err("failure");
        assert!(err.is(ErrorCode::Unauthenticated));
        assert_eq!(entries(&log), ["failure:0:Unauthenticated:401"]);
    }

    #[tokio::test]
    async fn modifiers_run_before_listeners() {
        let (processor, log) = observed_processor(1);

        let unwrap = |payload: Value, _: &ResponseHead| payload["data"].clone();
        let payload = processor
            .process_response(json_response(200, r#"{"data":[1,2]}"#), &unwrap, &Identity)
            .await
            .expect("success");
        assert_eq!(payload, json!([1, 2]));

        let rename = |error: FetchError, head: &ResponseHead| {
            error.with_code(format!("Http{}", head.status()))
        };
        let err = processor
            .process_response(json_response(418, "{}"), &Identity, &rename)
            .await
            .expect_err("failure");
        assert_eq!(err.code(), "Http418");
        assert_eq!(err.message(), "Unknown error");

        assert_eq!(entries(&log), ["success:0:[1,2]:200", "failure:0:Http418:418"]);
    }

    #[tokio::test]
    async fn suspending_modifiers_are_awaited() {
        let processor = ResponseProcessor::default();

        let on_success = Suspending(|payload: Value, head: ResponseHead| async move {
            tokio::task::yield_now().await;
            json!({ "status": head.status(), "body": payload })
        });
        let payload = processor
            .process_response(json_response(201, "true"), &on_success, &Identity)
            .await
            .expect("success");
        assert_eq!(payload, json!({"status": 201, "body": true}));

        let on_failure = Suspending(|error: FetchError, _head: ResponseHead| async move {
            tokio::task::yield_now().await;
            error.with_message("try again later")
        });
        let err = processor
            .process_response(json_response(503, "{}"), &Identity, &on_failure)
            .await
            .expect_err("failure");
        assert_eq!(err.message(), "try again later");
    }

    #[tokio::test]
    async fn process_error_returns_structured_error() {
        let (processor, log) = observed_processor(1);
        let raw = json!({"code": "X", "message": "Y"});

        let err = processor.normalize_error(&raw).await;

        assert_eq!(err, FetchError::new("X", "Y", raw.clone()));
        assert_eq!(entries(&log), ["failure:0:X:0"]);
    }

    #[tokio::test]
    async fn process_error_defaults_and_modifier() {
        let processor = ResponseProcessor::default();

        let err = processor.normalize_error(&json!({})).await;
        assert_eq!((err.code(), err.message()), ("Unknown", "Unknown error"));

        let err = processor.normalize_error(&json!({"error": "offline"})).await;
        assert_eq!((err.code(), err.message()), ("Unknown", "offline"));

        let seen_empty_head = |error: FetchError, head: &ResponseHead| {
            error.with_payload(json!({ "empty_head": head.is_empty() }))
        };
        let err = processor.process_error(&json!({}), &seen_empty_head).await;
        assert_eq!(err.payload(), &json!({"empty_head": true}));
    }

    #[test]
    fn truthiness() {
        assert_eq!(truthy_text(None), None);
        assert_eq!(truthy_text(Some(&json!(null))), None);
        assert_eq!(truthy_text(Some(&json!(false))), None);
        assert_eq!(truthy_text(Some(&json!(""))), None);
        assert_eq!(truthy_text(Some(&json!(0))), None);
        assert_eq!(truthy_text(Some(&json!(0.0))), None);
        assert_eq!(truthy_text(Some(&json!("x"))).as_deref(), Some("x"));
        assert_eq!(truthy_text(Some(&json!(true))).as_deref(), Some("true"));
        assert_eq!(truthy_text(Some(&json!(-1.5))).as_deref(), Some("-1.5"));
        assert_eq!(
            truthy_text(Some(&json!({"k": 1}))).as_deref(),
            Some(r#"{"k":1}"#)
        );
    }
}
