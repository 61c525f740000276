//! Pluggable transport that executes `HttpRequest` values.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// A request that did not produce any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("transport failure: {0}")]
    Other(String),
}

/// Trait for pluggable HTTP backends.
///
/// Non-2xx statuses are data, not errors: implementations must return them
/// as `Ok(HttpResponse)` and leave interpretation to `SnapCarClient`.
pub trait HttpTransport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
