//! Transport abstraction.
//!
//! [`HttpClient`] is the only thing the `Fetcher` needs from a transport; the
//! `courier` crate implements it on hyper, tests implement it in memory.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// Any status code is a successful execution; only failures to obtain a
    /// response are errors:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Invalid request
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
