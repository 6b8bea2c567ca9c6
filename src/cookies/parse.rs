//! `Set-Cookie` header splitting and attribute normalization.
//!
//! Parsing is best-effort: a malformed attribute set rejects that single
//! cookie (with a reason), never the whole batch. The normalizer is a
//! validation function returning a tagged result, consumed by a filter step
//! in the jar.

use std::collections::HashMap;

use time::macros::format_description;
use time::PrimitiveDateTime;

/// Standard attributes that carry a value.
const VALUE_ATTRS: &[&str] = &[
    "version",
    "expires",
    "max-age",
    "domain",
    "path",
    "port",
    "comment",
    "commenturl",
];

/// Attributes that default to true when present without a value.
const BOOLEAN_ATTRS: &[&str] = &["discard", "secure"];

/// Attributes allowed to appear without a value.
const VALUELESS_OK: &[&str] = &["port", "comment", "commenturl"];

/// Normalized cookie information extracted from one `Set-Cookie` header.
///
/// `expires` is already absolute epoch seconds: `max-age` takes precedence
/// over `expires` and is converted to `now + max-age` at normalization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CookieTuple {
    pub name: String,
    pub value: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Outer: `port` attribute present. Inner: its value, if any.
    pub port: Option<Option<String>>,
    pub expires: Option<i64>,
    pub version: Option<String>,
    pub secure: bool,
    pub discard: bool,
    pub comment: Option<String>,
    pub comment_url: Option<String>,
    pub rest: HashMap<String, Option<String>>,
}

/// Why a single cookie was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CookieReject {
    MissingDomainValue,
    InvalidMaxAge,
    MissingAttrValue(String),
}

impl std::fmt::Display for CookieReject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookieReject::MissingDomainValue => write!(f, "missing value for domain attribute"),
            CookieReject::InvalidMaxAge => {
                write!(f, "missing or non-numeric value for max-age attribute")
            }
            CookieReject::MissingAttrValue(attr) => {
                write!(f, "missing value for {attr} attribute")
            }
        }
    }
}

fn is_value_attr(name: &str) -> bool {
    VALUE_ATTRS.contains(&name)
}

fn is_boolean_attr(name: &str) -> bool {
    BOOLEAN_ATTRS.contains(&name)
}

fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

/// Split one `Set-Cookie` header value into (name, value) pairs.
///
/// The first pair is the cookie name and value; the remainder are attributes.
/// Known attribute names are folded to lowercase, unknown ones keep their
/// case. A `version=0` attribute is appended when none was present.
pub(crate) fn split_set_cookie(header: &str) -> Vec<(String, Option<String>)> {
    let mut pairs: Vec<(String, Option<String>)> = Vec::new();
    let mut version_seen = false;

    for (index, segment) in header.split(';').enumerate() {
        let segment = segment.trim_end();
        if segment.is_empty() {
            continue;
        }

        let (mut key, value) = match segment.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), Some(v.trim().to_string())),
            None => (segment.trim_start().to_string(), None),
        };

        if index != 0 {
            let folded = key.to_ascii_lowercase();
            if is_value_attr(&folded) || is_boolean_attr(&folded) {
                key = folded;
            }
            if key == "version" {
                version_seen = true;
            }
        }

        pairs.push((key, value));
    }

    if !pairs.is_empty() && !version_seen {
        pairs.push(("version".to_string(), Some("0".to_string())));
    }

    pairs
}

/// Normalize one cookie's attribute pairs into a [`CookieTuple`].
///
/// Only the first occurrence of an attribute is significant. `now` is the
/// epoch second used to resolve `max-age` into an absolute expiry.
pub(crate) fn normalize(
    pairs: &[(String, Option<String>)],
    now: i64,
) -> Result<CookieTuple, CookieReject> {
    let (name, value) = pairs
        .first()
        .map(|(k, v)| (k.clone(), v.clone()))
        .unwrap_or_default();

    let mut tuple = CookieTuple {
        name,
        value,
        domain: None,
        path: None,
        port: None,
        expires: None,
        version: None,
        secure: false,
        discard: false,
        comment: None,
        comment_url: None,
        rest: HashMap::new(),
    };

    // Marks standard attributes already stored; only the first value counts.
    let mut seen: Vec<&'static str> = Vec::new();
    let mut max_age_set = false;

    for (key, value) in pairs.get(1..).unwrap_or(&[]) {
        let folded = key.to_ascii_lowercase();
        let known = is_value_attr(&folded) || is_boolean_attr(&folded);
        if !known {
            tuple.rest.insert(key.clone(), value.clone());
            continue;
        }

        let key = folded.as_str();
        if seen.contains(&canonical(key)) {
            continue;
        }

        match key {
            "domain" => {
                // An absent or empty domain value invalidates the cookie.
                let domain = value.as_deref().unwrap_or("");
                if domain.is_empty() {
                    return Err(CookieReject::MissingDomainValue);
                }
                tuple.domain = Some(domain.to_ascii_lowercase());
                seen.push("domain");
            }
            "expires" => {
                if max_age_set {
                    continue;
                }
                let Some(v) = value else {
                    continue; // no expiry date: session cookie
                };
                match parse_http_date(strip_quotes(v)) {
                    Some(epoch) => {
                        tuple.expires = Some(epoch);
                        seen.push("expires");
                    }
                    None => {
                        tracing::debug!(value = %v, "unparseable expires date, treating as session cookie");
                    }
                }
            }
            "max-age" => {
                max_age_set = true;
                let seconds = value
                    .as_deref()
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .ok_or(CookieReject::InvalidMaxAge)?;
                // Max-Age wins over Expires regardless of attribute order.
                tuple.expires = Some(now + seconds);
            }
            "secure" => {
                tuple.secure = truthy(value);
                seen.push("secure");
            }
            "discard" => {
                tuple.discard = truthy(value);
                seen.push("discard");
            }
            "path" | "port" | "version" | "comment" | "commenturl" => {
                if value.is_none() && !VALUELESS_OK.contains(&key) {
                    return Err(CookieReject::MissingAttrValue(key.to_string()));
                }
                match key {
                    "path" => tuple.path = value.clone(),
                    "port" => tuple.port = Some(value.clone()),
                    "version" => {
                        tuple.version = value.as_deref().map(|v| strip_quotes(v).to_string())
                    }
                    "comment" => tuple.comment = value.clone(),
                    _ => tuple.comment_url = value.clone(),
                }
                seen.push(canonical(key));
            }
            _ => {}
        }
    }

    Ok(tuple)
}

/// Map an attribute name to the static key used in the seen list.
fn canonical(key: &str) -> &'static str {
    match key {
        "domain" => "domain",
        "expires" => "expires",
        "max-age" => "max-age",
        "path" => "path",
        "port" => "port",
        "version" => "version",
        "comment" => "comment",
        "commenturl" => "commenturl",
        "secure" => "secure",
        "discard" => "discard",
        _ => "",
    }
}

/// Boolean attribute truthiness: present without a value is true, an explicit
/// value is true unless empty.
fn truthy(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(v) => !v.is_empty(),
    }
}

/// Parse an HTTP cookie expiry date to epoch seconds.
///
/// Accepts RFC 1123 (`Wed, 09 Jun 2021 10:18:14 GMT`), the dashed Netscape
/// variant (`Wed, 09-Jun-2021 10:18:14 GMT`, short or long weekday), and
/// asctime (`Wed Jun  9 10:18:14 2021`).
pub(crate) fn parse_http_date(value: &str) -> Option<i64> {
    let rfc1123 = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    let netscape = format_description!(
        "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
    );
    let netscape_long = format_description!(
        "[weekday repr:long], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
    );
    let asctime = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
    );

    for format in [rfc1123, netscape, netscape_long, asctime] {
        if let Ok(datetime) = PrimitiveDateTime::parse(value, format) {
            return Some(datetime.assume_utc().unix_timestamp());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(header: &str) -> Vec<(String, Option<String>)> {
        split_set_cookie(header)
    }

    #[test]
    fn split_basic() {
        let p = pairs("session=abc123; Path=/; Secure");
        assert_eq!(p[0], ("session".to_string(), Some("abc123".to_string())));
        assert_eq!(p[1], ("path".to_string(), Some("/".to_string())));
        assert_eq!(p[2], ("secure".to_string(), None));
        // implicit version for Netscape-style cookies
        assert_eq!(p[3], ("version".to_string(), Some("0".to_string())));
    }

    #[test]
    fn split_preserves_unknown_attr_case() {
        let p = pairs("a=1; HttpOnly; SameSite=Lax");
        assert!(p.iter().any(|(k, _)| k == "HttpOnly"));
        assert!(p.iter().any(|(k, _)| k == "SameSite"));
    }

    #[test]
    fn split_keeps_explicit_version() {
        let p = pairs("a=1; Version=1");
        let versions: Vec<_> = p.iter().filter(|(k, _)| k == "version").collect();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].1.as_deref(), Some("1"));
    }

    #[test]
    fn normalize_boolean_defaults() {
        let t = normalize(&pairs("a=1; Secure; Discard"), 0).unwrap();
        assert!(t.secure);
        assert!(t.discard);
    }

    #[test]
    fn normalize_rejects_valueless_or_empty_domain() {
        let err = normalize(&pairs("a=1; Domain"), 0).unwrap_err();
        assert_eq!(err, CookieReject::MissingDomainValue);
        let err = normalize(&pairs("a=1; Domain="), 0).unwrap_err();
        assert_eq!(err, CookieReject::MissingDomainValue);
    }

    #[test]
    fn normalize_lowercases_domain() {
        let t = normalize(&pairs("a=1; Domain=.Example.COM"), 0).unwrap();
        assert_eq!(t.domain.as_deref(), Some(".example.com"));
    }

    #[test]
    fn normalize_rejects_bad_max_age() {
        let err = normalize(&pairs("a=1; Max-Age=soon"), 0).unwrap_err();
        assert_eq!(err, CookieReject::InvalidMaxAge);
        let err = normalize(&pairs("a=1; Max-Age"), 0).unwrap_err();
        assert_eq!(err, CookieReject::InvalidMaxAge);
    }

    #[test]
    fn max_age_beats_expires_in_either_order() {
        let now = 1_000_000;
        let t = normalize(
            &pairs("a=1; Max-Age=60; Expires=Wed, 09 Jun 2021 10:18:14 GMT"),
            now,
        )
        .unwrap();
        assert_eq!(t.expires, Some(now + 60));

        let t = normalize(
            &pairs("a=1; Expires=Wed, 09 Jun 2021 10:18:14 GMT; Max-Age=60"),
            now,
        )
        .unwrap();
        assert_eq!(t.expires, Some(now + 60));
    }

    #[test]
    fn first_attribute_occurrence_wins() {
        let t = normalize(&pairs("a=1; Path=/one; Path=/two"), 0).unwrap();
        assert_eq!(t.path.as_deref(), Some("/one"));
    }

    #[test]
    fn first_boolean_occurrence_wins() {
        let t = normalize(&pairs("a=1; Secure; Secure="), 0).unwrap();
        assert!(t.secure);
        let t = normalize(&pairs("a=1; Discard; Discard="), 0).unwrap();
        assert!(t.discard);
    }

    #[test]
    fn unparseable_expires_means_session() {
        let t = normalize(&pairs("a=1; Expires=whenever"), 0).unwrap();
        assert_eq!(t.expires, None);
    }

    #[test]
    fn port_without_value_is_recorded_as_present() {
        let t = normalize(&pairs("a=1; Port"), 0).unwrap();
        assert_eq!(t.port, Some(None));
        let t = normalize(&pairs("a=1; Port=8080"), 0).unwrap();
        assert_eq!(t.port, Some(Some("8080".to_string())));
    }

    #[test]
    fn rejects_valueless_value_attr() {
        let err = normalize(&pairs("a=1; Path"), 0).unwrap_err();
        assert_eq!(err, CookieReject::MissingAttrValue("path".to_string()));
    }

    #[test]
    fn unknown_attrs_land_in_rest() {
        let t = normalize(&pairs("a=1; SameSite=Lax; HttpOnly"), 0).unwrap();
        assert_eq!(t.rest.get("SameSite"), Some(&Some("Lax".to_string())));
        assert_eq!(t.rest.get("HttpOnly"), Some(&None));
    }

    #[test]
    fn parse_rfc1123_date() {
        assert_eq!(
            parse_http_date("Wed, 09 Jun 2021 10:18:14 GMT"),
            Some(1623233894)
        );
    }

    #[test]
    fn parse_netscape_dashed_date() {
        assert_eq!(
            parse_http_date("Wed, 09-Jun-2021 10:18:14 GMT"),
            Some(1623233894)
        );
    }

    #[test]
    fn parse_asctime_date() {
        assert_eq!(
            parse_http_date("Wed Jun  9 10:18:14 2021"),
            Some(1623233894)
        );
    }

    #[test]
    fn parse_quoted_expires() {
        let now = 0;
        let t = normalize(
            &pairs("a=1; Expires=\"Wed, 09 Jun 2021 10:18:14 GMT\""),
            now,
        )
        .unwrap();
        assert_eq!(t.expires, Some(1623233894));
    }

    #[test]
    fn garbage_date_is_none() {
        assert_eq!(parse_http_date("not a date"), None);
    }
}
