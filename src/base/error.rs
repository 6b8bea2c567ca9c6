use http::StatusCode;
use thiserror::Error;

use crate::http::Response;

/// Errors surfaced to direct callers of [`CookieJar::clear`].
///
/// Cookie *parsing* never raises past the jar boundary; malformed input is
/// logged and dropped. Only `clear` reports failure to its caller.
///
/// [`CookieJar::clear`]: crate::cookies::CookieJar::clear
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CookieError {
    /// A narrower scope argument was given without the wider ones,
    /// e.g. `name` without `domain` and `path`.
    #[error("invalid clear scope: {0}")]
    InvalidScope(&'static str),
    /// No cookie exists under the targeted key.
    #[error("no matching cookie")]
    NotFound,
}

/// Connection-level transport failures.
///
/// An HTTP exchange that completes with *any* status code is not a transport
/// error; those surface as [`FetchError::Protocol`]. Transport errors are
/// never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
}

/// Terminal outcome of a [`Client::fetch`] call.
///
/// [`Client::fetch`]: crate::client::Client::fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request URL failed to parse. Raised before any network I/O.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Unsupported request body shape. Raised before any network I/O.
    #[error("unsupported request body: {0}")]
    UnsupportedBody(&'static str),

    /// The exchange completed with an error status. Carries the response so
    /// callers can still inspect headers and body.
    #[error("http error {status} fetching {url}", status = .response.status(), url = .response.effective_url())]
    Protocol { response: Response },

    /// Connection-level failure from the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response declared `application/json` but the body did not decode.
    #[error("invalid json in response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// Status code for protocol errors, `None` otherwise.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Protocol { response } => Some(response.status()),
            _ => None,
        }
    }
}
