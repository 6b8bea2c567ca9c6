//! The transport seam.
//!
//! The client consumes an async transport as a given capability: one logical
//! exchange in, one completion out. An exchange that produces any HTTP status
//! is a successful completion; [`TransportError`] is reserved for
//! connection-level failures (refused, reset, DNS, timeout), which the retry
//! layer never retries. Timeouts, pooling, and TLS all live behind this
//! trait.

pub mod hypertransport;

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

pub use crate::base::error::TransportError;
pub use hypertransport::HyperTransport;

/// One outgoing exchange handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

/// Completion signal of one exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// URL the response was ultimately served from (post-redirect).
    pub effective_url: Url,
    pub request_time: Duration,
}

/// Asynchronous HTTP transport primitive.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>>;
}
