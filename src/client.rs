//! HTTP client with builder pattern and bounded retries.
//!
//! One [`Client::fetch`] call is one logical request: matching cookies are
//! attached, the transport runs the exchange, response cookies are captured,
//! and HTTP error statuses up to 500 are retried against a decrementing
//! budget. The call resolves exactly once, with a [`Response`] or a
//! [`FetchError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use squall::Client;
//!
//! let client = Client::builder().retries(2).build();
//!
//! let resp = client.get("http://api.internal/v1/things")
//!     .query("limit", "10")
//!     .send()
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use http::{header, HeaderMap, HeaderValue, Method};
use tracing::{debug, info, warn};
use url::Url;

use crate::base::error::FetchError;
use crate::cookies::CookieJar;
use crate::http::{RequestBody, Response};
use crate::transport::{HyperTransport, Transport, TransportRequest, TransportResponse};

/// Retry budget used when neither the call nor the builder sets one.
const DEFAULT_RETRIES: u32 = 3;

/// HTTP client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client. Cloning is
/// cheap; clones share the transport and the cookie jar.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    cookies: Arc<CookieJar>,
    default_retries: u32,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The cookie jar shared by every request through this client.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a PATCH request.
    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start building a request with a custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::None,
            retries: None,
        }
    }

    /// Execute one logical request.
    ///
    /// `retries` overrides the client default; `None` uses it. The returned
    /// future resolves exactly once with either the response or a typed
    /// error.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        headers: HeaderMap,
        retries: Option<u32>,
    ) -> Result<Response, FetchError> {
        let url = Url::parse(url)?;
        self.fetch_url(method, url, body, headers, retries).await
    }

    async fn fetch_url(
        &self,
        method: Method,
        url: Url,
        body: RequestBody,
        headers: HeaderMap,
        retries: Option<u32>,
    ) -> Result<Response, FetchError> {
        let budget = retries.unwrap_or(self.default_retries);
        // Unsupported body shapes fail here, before any network attempt.
        let (body_bytes, default_content_type) = body.encode()?;

        let mut base_headers = self.default_headers.clone();
        base_headers.extend(headers);
        if let Some(content_type) = default_content_type {
            if !base_headers.contains_key(header::CONTENT_TYPE) {
                base_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        let mut remaining = budget;
        loop {
            let mut request = TransportRequest {
                method: method.clone(),
                url: url.clone(),
                headers: base_headers.clone(),
                body: body_bytes.clone(),
                timeout: self.timeout,
            };
            // Cookies are re-attached fresh on every attempt; the jar may
            // have changed since the last one.
            self.cookies.add_cookies(&mut request);

            match self.transport.send(request).await {
                Ok(response) => {
                    // Capture cookies from every completed exchange,
                    // including attempts that get retried below.
                    self.cookies.extract_cookies(&response);

                    let status = response.status;
                    if status.is_client_error() || status.is_server_error() {
                        if status.as_u16() <= 500 && remaining > 0 {
                            remaining -= 1;
                            debug!(%status, %url, remaining, "retrying after http error");
                            continue;
                        }
                        info!(
                            %status,
                            %url,
                            time = ?response.request_time,
                            retries_spent = budget - remaining,
                            "http request failed"
                        );
                        return Err(FetchError::Protocol {
                            response: Response::from_transport(response, None),
                        });
                    }

                    let json = decode_json(&response)?;
                    info!(
                        %status,
                        %url,
                        time = ?response.request_time,
                        retries_spent = budget - remaining,
                        "http request complete"
                    );
                    return Ok(Response::from_transport(response, json));
                }
                // Connection-level errors are terminal, never retried.
                Err(error) => {
                    warn!(%url, %error, "transport error");
                    return Err(error.into());
                }
            }
        }
    }
}

/// Decode the body as JSON when the response declares `application/json` and
/// the body is non-empty. A `charset` parameter on the content type is
/// accepted but not honored: the body is always decoded as UTF-8, JSON's
/// interchange encoding. A declared-but-broken JSON body is a terminal
/// decode error.
fn decode_json(response: &TransportResponse) -> Result<Option<serde_json::Value>, FetchError> {
    let content_type = response
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime != "application/json" || response.body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&response.body)
        .map(Some)
        .map_err(FetchError::Decode)
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    cookie_jar: Option<Arc<CookieJar>>,
    retries: Option<u32>,
    default_headers: HeaderMap,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Set the transport. Defaults to the plain-HTTP [`HyperTransport`].
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share a cookie jar with other clients.
    pub fn cookie_jar(mut self, jar: Arc<CookieJar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Default retry budget for calls that do not set their own.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Header sent on every request unless overridden per call.
    pub fn default_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.default_headers.insert(key, val);
        }
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Per-attempt timeout handed to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let mut headers = self.default_headers;
        if !headers.contains_key(header::USER_AGENT) {
            let agent = self
                .user_agent
                .unwrap_or_else(|| concat!("squall/", env!("CARGO_PKG_VERSION")).to_string());
            if let Ok(value) = HeaderValue::from_str(&agent) {
                headers.insert(header::USER_AGENT, value);
            }
        }

        Client {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HyperTransport::new())),
            cookies: self.cookie_jar.unwrap_or_default(),
            default_retries: self.retries.unwrap_or(DEFAULT_RETRIES),
            default_headers: headers,
            timeout: self.timeout,
        }
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    retries: Option<u32>,
}

impl RequestBuilder {
    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Append a query argument to the URL.
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body from any serializable value.
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(value) = serde_json::to_value(json) {
            self.body = RequestBody::Json(value);
        }
        self
    }

    /// Override the client's retry budget for this request.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response, FetchError> {
        let mut url = Url::parse(&self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        self.client
            .fetch_url(self.method, url, self.body, self.headers, self.retries)
            .await
    }
}
