//! Caller-facing response type.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use url::Url;

use crate::base::error::FetchError;
use crate::transport::TransportResponse;

/// A completed fetch: status, headers, raw body, and the decoded JSON value
/// when the response declared `application/json`.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    json: Option<serde_json::Value>,
    effective_url: Url,
    request_time: Duration,
}

impl Response {
    pub(crate) fn from_transport(
        response: TransportResponse,
        json: Option<serde_json::Value>,
    ) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            json,
            effective_url: response.effective_url,
            request_time: response.request_time,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded as UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The JSON value decoded alongside the response, when applicable.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }

    /// Deserialize the raw body into a typed value.
    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(FetchError::Decode)
    }

    /// URL the response was ultimately served from.
    pub fn effective_url(&self) -> &Url {
        &self.effective_url
    }

    /// Wall-clock duration of the exchange that produced this response.
    pub fn request_time(&self) -> Duration {
        self.request_time
    }
}
