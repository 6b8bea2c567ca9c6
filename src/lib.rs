//! # squall
//!
//! An asynchronous HTTP fetch client with cookie-jar semantics and bounded
//! retries, built for service-to-service calls.
//!
//! `squall` keeps one shared [`CookieJar`] per client: cookies set by any
//! response are attached to every subsequent matching request, with RFC
//! 6265-style domain/path matching, expiry, and longest-path-first `Cookie`
//! header ordering. Each fetch retries HTTP error statuses up to 500 against
//! a bounded budget, decodes JSON bodies when the response declares them,
//! and resolves exactly once with a typed outcome.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use squall::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder().retries(2).build();
//!     let response = client
//!         .post("http://api.internal/v1/things")
//!         .json(&json!({"name": "thing"}))
//!         .send()
//!         .await
//!         .unwrap();
//!     println!("status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy
//! - [`cookies`] - Cookie jar, parsing, and request/response integration
//! - [`http`] - Request body shapes and the caller-facing response
//! - [`transport`] - The async transport seam and the default hyper transport
//! - [`client`] - Client, builders, and the retry loop
//!
//! The transport is a pluggable collaborator: the default implementation
//! speaks plain HTTP over hyper's pooled client, and anything with TLS,
//! proxies, or custom pooling plugs in behind the [`transport::Transport`]
//! trait.

pub mod base;
pub mod client;
pub mod cookies;
pub mod http;
pub mod transport;

pub use base::{CookieError, FetchError, TransportError};
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use cookies::{Cookie, CookieJar};
pub use http::{RequestBody, Response};
