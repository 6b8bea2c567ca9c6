//! Default transport over hyper's pooled legacy client.
//!
//! Plain HTTP only. Deployments that need TLS or proxying provide their own
//! [`Transport`] implementation; the retry and cookie layers above are
//! transport-agnostic.

use std::time::Instant;

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::base::error::TransportError;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Pooled plain-HTTP transport.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Transport for HyperTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let started = Instant::now();

            let mut outgoing = http::Request::builder()
                .method(request.method)
                .uri(request.url.as_str())
                .body(Full::new(request.body.unwrap_or_default()))
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            *outgoing.headers_mut() = request.headers;

            let exchange = client.request(outgoing);
            let response = match request.timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| TransportError::Timeout)?,
                None => exchange.await,
            }
            .map_err(|e| TransportError::Connection(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?
                .to_bytes();

            Ok(TransportResponse {
                status: parts.status,
                headers: parts.headers,
                body,
                effective_url: request.url,
                request_time: started.elapsed(),
            })
        })
    }
}
