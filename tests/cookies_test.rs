use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use squall::transport::{TransportRequest, TransportResponse};
use squall::{Cookie, CookieError, CookieJar};
use time::OffsetDateTime;
use url::Url;

fn response(url: &str, set_cookies: &[&str]) -> TransportResponse {
    let mut headers = HeaderMap::new();
    for value in set_cookies {
        headers.append(SET_COOKIE, HeaderValue::from_str(value).unwrap());
    }
    TransportResponse {
        status: StatusCode::OK,
        headers,
        body: Bytes::new(),
        effective_url: Url::parse(url).unwrap(),
        request_time: Duration::ZERO,
    }
}

fn request(url: &str) -> TransportRequest {
    TransportRequest {
        method: Method::GET,
        url: Url::parse(url).unwrap(),
        headers: HeaderMap::new(),
        body: None,
        timeout: None,
    }
}

fn cookie_header(request: &TransportRequest) -> Option<&str> {
    request.headers.get(COOKIE).map(|v| v.to_str().unwrap())
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[test]
fn max_age_wins_over_expires() {
    let jar = CookieJar::new();
    let cookies = jar.parse_cookies(&response(
        "https://x.com/",
        &["a=1; Expires=Wed, 09 Jun 2021 10:18:14 GMT; Max-Age=60"],
    ));
    assert_eq!(cookies.len(), 1);

    let expires = cookies[0].expires.unwrap();
    let expected = now() + 60;
    assert!((expires - expected).abs() <= 1, "expires {expires} vs {expected}");
}

#[test]
fn empty_domain_attribute_drops_cookie() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["a=1; domain="]));
    assert!(jar.is_empty());
}

#[test]
fn same_key_overwrites_atomically() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["a=first; Path=/"]));
    jar.extract_cookies(&response("https://x.com/", &["a=second; Path=/"]));
    assert_eq!(jar.len(), 1);

    let mut req = request("https://x.com/");
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("a=second"));
}

#[test]
fn appends_to_existing_cookie_header_with_separator() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["b=2; Path=/"]));

    let mut req = request("https://x.com/");
    req.headers.insert(COOKIE, HeaderValue::from_static("a=1"));
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("a=1; b=2"));
}

#[test]
fn past_expiry_is_never_stored() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response(
        "https://x.com/",
        &["a=1; Expires=Thu, 01 Jan 1970 00:00:01 GMT"],
    ));
    assert!(jar.is_empty());
}

#[test]
fn past_expiry_deletes_existing_cookie() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["a=1; Path=/"]));
    assert_eq!(jar.len(), 1);

    // A re-set with an expiry in the past is a deletion request for the same
    // (domain, path, name).
    jar.extract_cookies(&response(
        "https://x.com/",
        &["a=gone; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT"],
    ));
    assert!(jar.is_empty());
}

#[test]
fn default_path_depends_on_version() {
    let jar = CookieJar::new();

    let v0 = jar.parse_cookies(&response("https://x.com/a/b/c", &["a=1"]));
    assert_eq!(v0[0].path, "/a/b");
    assert!(!v0[0].path_specified);

    let v1 = jar.parse_cookies(&response("https://x.com/a/b/c", &["a=1; Version=1"]));
    assert_eq!(v1[0].path, "/a/b/");
}

#[test]
fn clear_validates_scope_and_absence() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["a=1"]));

    assert_eq!(
        jar.clear(Some("d"), Some("p"), Some("n")),
        Err(CookieError::NotFound)
    );
    assert!(matches!(
        jar.clear(None, None, Some("n")),
        Err(CookieError::InvalidScope(_))
    ));

    jar.clear(None, None, None).unwrap();
    assert!(jar.is_empty());
}

#[test]
fn stale_cookies_are_excluded_and_purged_on_match() {
    let jar = CookieJar::new();
    jar.set_cookie(Cookie {
        name: "stale".to_string(),
        value: Some("1".to_string()),
        domain: "x.com".to_string(),
        domain_specified: false,
        domain_initial_dot: false,
        path: "/".to_string(),
        path_specified: false,
        port: None,
        port_specified: false,
        secure: false,
        expires: Some(now() - 10),
        discard: false,
        version: Some(0),
        comment: None,
        comment_url: None,
        rest: HashMap::new(),
    });
    jar.extract_cookies(&response("https://x.com/", &["fresh=1"]));
    assert_eq!(jar.len(), 2);

    let mut req = request("https://x.com/");
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("fresh=1"));
    // the stale cookie was purged after the header was built
    assert_eq!(jar.len(), 1);
}

#[test]
fn dotless_host_matches_through_effective_host() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("http://intranet/app/", &["a=1; Path=/"]));
    assert_eq!(jar.len(), 1);

    let mut req = request("http://intranet/app/page");
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("a=1"));
}

#[test]
fn bare_name_cookie_serializes_without_equals() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response("https://x.com/", &["flag; Path=/"]));
    assert_eq!(jar.len(), 1);

    let mut req = request("https://x.com/");
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("flag"));
}

#[test]
fn malformed_cookie_does_not_poison_the_batch() {
    let jar = CookieJar::new();
    jar.extract_cookies(&response(
        "https://x.com/",
        &["bad=1; Max-Age=soon", "good=2; Path=/"],
    ));
    assert_eq!(jar.len(), 1);

    let mut req = request("https://x.com/");
    jar.add_cookies(&mut req);
    assert_eq!(cookie_header(&req), Some("good=2"));
}
