//! Outcome listeners.
//!
//! A [`ResponseEvents`] bus holds two ordered registries, one for successes
//! and one for failures. It is handed to the
//! [`ResponseProcessor`](crate::ResponseProcessor) at construction; clones
//! share the same registries, so observers (toasts, logging, session expiry)
//! can subscribe on any clone.
//!
//! Listeners are identified by their [`Arc`]: unregistering compares pointers.
//!
//! # Example
//!
//! ```
//! use courier_core::ResponseEvents;
//!
//! let events = ResponseEvents::new();
//! let handle = events.on_failure(|error, _head| {
//!     tracing::warn!(code = error.code(), "request failed");
//! });
//!
//! assert_eq!(events.failure_listeners().len(), 1);
//! assert!(events.unregister_failure_listener(&handle));
//! assert!(events.failure_listeners().is_empty());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::trace;

use crate::{FetchError, ResponseHead};

/// Listener notified with the final payload of a successful response.
pub type SuccessListener = dyn Fn(&Value, &ResponseHead) + Send + Sync;

/// Listener notified with the final error of a failed request.
pub type FailureListener = dyn Fn(&FetchError, &ResponseHead) + Send + Sync;

/// Ordered set of listener handles.
pub struct ListenerRegistry<L: ?Sized> {
    listeners: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<L>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a listener. The same handle may be registered more than once.
    pub fn register(&self, listener: Arc<L>) {
        self.lock().push(listener);
    }

    /// Remove the first registration of `listener`.
    ///
    /// Returns `false` (and does nothing) if it was not registered.
    pub fn unregister(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.lock();
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Listeners in registration order, as of now.
    ///
    /// Changes made while the snapshot is being walked only apply to the
    /// next snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.lock().clone()
    }
}

#[derive(Default)]
struct Registries {
    success: ListenerRegistry<SuccessListener>,
    failure: ListenerRegistry<FailureListener>,
}

/// Success and failure listener registries, shared between clones.
#[derive(Clone, Default)]
pub struct ResponseEvents {
    inner: Arc<Registries>,
}

impl fmt::Debug for ResponseEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEvents")
            .field("success", &self.inner.success)
            .field("failure", &self.inner.failure)
            .finish()
    }
}

impl ResponseEvents {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The success registry.
    #[must_use]
    pub fn success_listeners(&self) -> &ListenerRegistry<SuccessListener> {
        &self.inner.success
    }

    /// The failure registry.
    #[must_use]
    pub fn failure_listeners(&self) -> &ListenerRegistry<FailureListener> {
        &self.inner.failure
    }

    // ------------------------------------------------------------------------
    // Success
    // ------------------------------------------------------------------------

    /// Register a success listener handle.
    pub fn register_success_listener(&self, listener: Arc<SuccessListener>) {
        self.inner.success.register(listener);
    }

    /// Wrap and register a closure, returning the handle to unregister it.
    pub fn on_success<F>(&self, listener: F) -> Arc<SuccessListener>
    where
        F: Fn(&Value, &ResponseHead) + Send + Sync + 'static,
    {
        let listener: Arc<SuccessListener> = Arc::new(listener);
        self.register_success_listener(Arc::clone(&listener));
        listener
    }

    /// Unregister a success listener; no-op if absent.
    pub fn unregister_success_listener(&self, listener: &Arc<SuccessListener>) -> bool {
        self.inner.success.unregister(listener)
    }

    /// Remove all success listeners.
    pub fn clear_success_listeners(&self) {
        self.inner.success.clear();
    }

    /// Call every success listener, in registration order.
    pub fn notify_success(&self, payload: &Value, head: &ResponseHead) {
        let listeners = self.inner.success.snapshot();
        trace!(count = listeners.len(), "notifying success listeners");
        for listener in listeners {
            listener(payload, head);
        }
    }

    // ------------------------------------------------------------------------
    // Failure
    // ------------------------------------------------------------------------

    /// Register a failure listener handle.
    pub fn register_failure_listener(&self, listener: Arc<FailureListener>) {
        self.inner.failure.register(listener);
    }

    /// Wrap and register a closure, returning the handle to unregister it.
    pub fn on_failure<F>(&self, listener: F) -> Arc<FailureListener>
    where
        F: Fn(&FetchError, &ResponseHead) + Send + Sync + 'static,
    {
        let listener: Arc<FailureListener> = Arc::new(listener);
        self.register_failure_listener(Arc::clone(&listener));
        listener
    }

    /// Unregister a failure listener; no-op if absent.
    pub fn unregister_failure_listener(&self, listener: &Arc<FailureListener>) -> bool {
        self.inner.failure.unregister(listener)
    }

    /// Remove all failure listeners.
    pub fn clear_failure_listeners(&self) {
        self.inner.failure.clear();
    }

    /// Call every failure listener, in registration order.
    pub fn notify_failure(&self, error: &FetchError, head: &ResponseHead) {
        let listeners = self.inner.failure.snapshot();
        trace!(count = listeners.len(), code = error.code(), "notifying failure listeners");
        for listener in listeners {
            listener(error, head);
        }
    }
}
