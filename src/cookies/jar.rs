//! In-memory cookie jar keyed by (domain, path, name).
//!
//! The store is a three-level map owned by one `CookieJar` behind a single
//! mutex, so every `add_cookies` pass works against one consistent snapshot.
//! Concurrent calls may interleave reads and writes in either order; last
//! write wins.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use http::header::{COOKIE, SET_COOKIE};
use http::HeaderValue;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

use crate::base::error::CookieError;
use crate::cookies::cookie::Cookie;
use crate::cookies::parse::{self, CookieTuple};
use crate::transport::{TransportRequest, TransportResponse};

type Store = HashMap<String, HashMap<String, HashMap<String, Cookie>>>;

/// Shared cookie store for an HTTP client.
#[derive(Default)]
pub struct CookieJar {
    inner: Mutex<Store>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse every `Set-Cookie` occurrence on a response into cookies.
    ///
    /// Best effort: malformed cookies are logged and skipped, and a cookie
    /// whose expiry is already in the past deletes any stored counterpart
    /// instead of yielding one. Never fails.
    pub fn parse_cookies(&self, response: &TransportResponse) -> Vec<Cookie> {
        let now = unix_now();
        let mut cookies = Vec::new();

        for value in response.headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                warn!("ignoring undecodable set-cookie header");
                continue;
            };
            let pairs = parse::split_set_cookie(raw);
            if pairs.is_empty() {
                continue;
            }
            match parse::normalize(&pairs, now) {
                Ok(tuple) => {
                    if let Some(cookie) =
                        self.cookie_from_tuple(tuple, &response.effective_url, now)
                    {
                        cookies.push(cookie);
                    }
                }
                Err(reject) => warn!(header = raw, %reject, "dropping malformed cookie"),
            }
        }

        cookies
    }

    /// Resolve a normalized tuple into a [`Cookie`], filling defaults from
    /// the response's effective URL.
    fn cookie_from_tuple(
        &self,
        tuple: CookieTuple,
        effective_url: &Url,
        now: i64,
    ) -> Option<Cookie> {
        let version = match tuple.version {
            Some(v) => match v.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    debug!(value = %v, "invalid version attribute, ignoring cookie");
                    return None;
                }
            },
            None => None,
        };

        let (path, path_specified) = match tuple.path {
            Some(p) if !p.is_empty() => (p, true),
            _ => (default_path(effective_url, version), false),
        };

        let domain_specified = tuple.domain.is_some();
        let mut domain_initial_dot = false;
        let domain = match tuple.domain {
            Some(d) => {
                domain_initial_dot = d.starts_with('.');
                if domain_initial_dot {
                    d
                } else {
                    format!(".{d}")
                }
            }
            None => effective_request_host(effective_url).1,
        };

        let (port, port_specified) = match tuple.port {
            None => (None, false),
            // Port attribute without a value pins the cookie to the port the
            // response actually arrived on.
            Some(None) => (Some(request_port(effective_url)), true),
            Some(Some(raw)) => match raw.trim().parse::<u16>() {
                Ok(p) => (Some(p), true),
                Err(_) => {
                    warn!(value = %raw, "invalid port attribute, ignoring");
                    (None, false)
                }
            },
        };

        let (expires, discard) = match tuple.expires {
            None => (None, true),
            Some(e) if e <= now => {
                // Expiry date in the past is a request to delete the cookie.
                debug!(%domain, %path, name = %tuple.name, "expiry in the past, deleting cookie");
                let _ = self.clear(Some(&domain), Some(&path), Some(&tuple.name));
                return None;
            }
            Some(e) => (Some(e), tuple.discard),
        };

        Some(Cookie {
            name: tuple.name,
            value: tuple.value,
            domain,
            domain_specified,
            domain_initial_dot,
            path,
            path_specified,
            port,
            port_specified,
            secure: tuple.secure,
            expires,
            discard,
            version,
            comment: tuple.comment,
            comment_url: tuple.comment_url,
            rest: tuple.rest,
        })
    }

    /// Upsert a cookie at (domain, path, name) without any policy checks;
    /// validation already happened during normalization.
    pub fn set_cookie(&self, cookie: Cookie) {
        let mut store = self.store();
        store
            .entry(cookie.domain.clone())
            .or_default()
            .entry(cookie.path.clone())
            .or_default()
            .insert(cookie.name.clone(), cookie);
    }

    /// Parse a response's cookies and store each of them.
    pub fn extract_cookies(&self, response: &TransportResponse) {
        for cookie in self.parse_cookies(response) {
            self.set_cookie(cookie);
        }
    }

    /// Clear cookies by scope.
    ///
    /// No arguments clears everything; `domain` clears one domain; `domain` +
    /// `path` clears that path; all three clear exactly one cookie. `name`
    /// requires both `domain` and `path`, and `path` requires `domain`. Fails
    /// with [`CookieError::NotFound`] when the targeted key does not exist.
    pub fn clear(
        &self,
        domain: Option<&str>,
        path: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), CookieError> {
        debug!(?domain, ?path, ?name, "clearing cookies");
        let mut store = self.store();
        Self::clear_locked(&mut store, domain, path, name)
    }

    fn clear_locked(
        store: &mut Store,
        domain: Option<&str>,
        path: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), CookieError> {
        match (domain, path, name) {
            (Some(domain), Some(path), Some(name)) => store
                .get_mut(domain)
                .and_then(|paths| paths.get_mut(path))
                .and_then(|names| names.remove(name))
                .map(|_| ())
                .ok_or(CookieError::NotFound),
            (_, _, Some(_)) => Err(CookieError::InvalidScope(
                "domain and path are required to clear a cookie by name",
            )),
            (Some(domain), Some(path), None) => store
                .get_mut(domain)
                .and_then(|paths| paths.remove(path))
                .map(|_| ())
                .ok_or(CookieError::NotFound),
            (None, Some(_), None) => Err(CookieError::InvalidScope(
                "domain is required to clear cookies by path",
            )),
            (Some(domain), None, None) => store
                .remove(domain)
                .map(|_| ())
                .ok_or(CookieError::NotFound),
            (None, None, None) => {
                store.clear();
                Ok(())
            }
        }
    }

    /// Attach every stored cookie matching the request to its `Cookie`
    /// header, longest path first, appending to any pre-existing value.
    ///
    /// Cookies found expired are excluded from the header and purged only
    /// after it is built.
    pub fn add_cookies(&self, request: &mut TransportRequest) {
        let now = unix_now();
        let req_secure = request.url.scheme() == "https";
        let req_port = request_port(&request.url);
        let req_path = request.url.path().to_string();
        let (req_host, erhn) = effective_request_host(&request.url);

        let mut store = self.store();
        let mut matched: Vec<Cookie> = Vec::new();
        let mut expired: Vec<(String, String, String)> = Vec::new();

        for (domain, paths) in store.iter() {
            if !domain_match(domain, &req_host, &erhn) {
                continue;
            }
            for (path, names) in paths.iter() {
                if !req_path.starts_with(path.as_str()) {
                    continue;
                }
                for cookie in names.values() {
                    if cookie.is_expired(now) {
                        expired.push((
                            cookie.domain.clone(),
                            cookie.path.clone(),
                            cookie.name.clone(),
                        ));
                        continue;
                    }
                    if cookie.secure && !req_secure {
                        continue;
                    }
                    if cookie.port_specified && cookie.port != Some(req_port) {
                        continue;
                    }
                    matched.push(cookie.clone());
                }
            }
        }

        if !matched.is_empty() {
            // Longest path first, per Cookie header precedence convention.
            matched.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
            let serialized = matched
                .iter()
                .map(Cookie::header_pair)
                .collect::<Vec<_>>()
                .join("; ");

            let mut value = request
                .headers
                .get(COOKIE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            if !value.is_empty() && !value.ends_with("; ") {
                value.push_str("; ");
            }
            value.push_str(&serialized);

            match HeaderValue::from_str(&value) {
                Ok(header) => {
                    request.headers.insert(COOKIE, header);
                }
                Err(_) => warn!("cookie header contains invalid characters, leaving request unchanged"),
            }
        }

        // Purge after the header is built so the pass above saw a consistent
        // snapshot.
        for (domain, path, name) in expired {
            debug!(%domain, %path, %name, "purging expired cookie");
            let _ = Self::clear_locked(&mut store, Some(&domain), Some(&path), Some(&name));
        }
    }

    /// Total number of stored cookies.
    pub fn len(&self) -> usize {
        self.store()
            .values()
            .flat_map(|paths| paths.values())
            .map(|names| names.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn request_host(url: &Url) -> String {
    url.host_str().unwrap_or("").to_ascii_lowercase()
}

/// Request host and effective request host name, both lowercased.
///
/// The effective form appends `.local` when the host has no dot and is not
/// an IPv4 literal (RFC 2965 convention).
fn effective_request_host(url: &Url) -> (String, String) {
    let host = request_host(url);
    let erhn = if !host.contains('.') && host.parse::<Ipv4Addr>().is_err() {
        format!("{host}.local")
    } else {
        host.clone()
    };
    (host, erhn)
}

fn request_port(url: &Url) -> u16 {
    url.port_or_known_default().unwrap_or(80)
}

/// Liberal domain check: the stored domain is compared as a suffix of the
/// dot-prefixed request host and of the dot-prefixed effective request host.
fn domain_match(domain: &str, req_host: &str, erhn: &str) -> bool {
    with_leading_dot(req_host).ends_with(domain) || with_leading_dot(erhn).ends_with(domain)
}

fn with_leading_dot(host: &str) -> String {
    if host.starts_with('.') {
        host.to_string()
    } else {
        format!(".{host}")
    }
}

/// Default cookie path: the effective URL's path truncated at the last `/`.
/// Version 0 cookies drop the slash as well; anything else keeps it.
fn default_path(url: &Url, version: Option<u32>) -> String {
    let path = url.path();
    let truncated = match path.rfind('/') {
        Some(i) if version == Some(0) => &path[..i],
        Some(i) => &path[..=i],
        None => path,
    };
    if truncated.is_empty() {
        "/".to_string()
    } else {
        truncated.to_string()
    }
}
