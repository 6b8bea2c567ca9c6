//! Typed request-body shapes and their wire encoding.

use bytes::Bytes;

use crate::base::error::FetchError;

/// Request body for an outgoing fetch.
///
/// Exactly four shapes are recognized; each carries a default `Content-Type`
/// applied only when the caller did not set one explicitly.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, ...).
    #[default]
    None,
    /// UTF-8 text, sent as `text/plain; charset=utf-8`.
    Text(String),
    /// Raw bytes, sent as `octet/binary`.
    Bytes(Bytes),
    /// A JSON mapping, encoded as UTF-8 `application/json`.
    Json(serde_json::Value),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Text(s)
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(v: serde_json::Value) -> Self {
        RequestBody::Json(v)
    }
}

impl RequestBody {
    /// Encode into wire bytes plus the default `Content-Type`, if any.
    ///
    /// Fails fast, before any network I/O, when the shape is unsupported:
    /// JSON bodies must be mappings.
    pub(crate) fn encode(&self) -> Result<(Option<Bytes>, Option<&'static str>), FetchError> {
        match self {
            RequestBody::None => Ok((None, None)),
            RequestBody::Text(text) => Ok((
                Some(Bytes::from(text.clone().into_bytes())),
                Some("text/plain; charset=utf-8"),
            )),
            RequestBody::Bytes(bytes) => Ok((Some(bytes.clone()), Some("octet/binary"))),
            RequestBody::Json(value) => {
                if !value.is_object() {
                    return Err(FetchError::UnsupportedBody("json body must be a mapping"));
                }
                let bytes = serde_json::to_vec(value)
                    .map_err(|_| FetchError::UnsupportedBody("unserializable json body"))?;
                Ok((
                    Some(Bytes::from(bytes)),
                    Some("application/json; charset=utf-8"),
                ))
            }
        }
    }
}
