use std::collections::HashMap;

/// A single stored cookie.
///
/// Uniquely identified by (domain, path, name); re-setting the same key
/// replaces the prior value. `expires` is epoch seconds; `None` means a
/// session cookie (`discard` is set when built from a header without an
/// expiry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: Option<String>,
    pub domain: String,
    pub domain_specified: bool,
    pub domain_initial_dot: bool,
    pub path: String,
    pub path_specified: bool,
    pub port: Option<u16>,
    pub port_specified: bool,
    pub secure: bool,
    pub expires: Option<i64>,
    pub discard: bool,
    pub version: Option<u32>,
    pub comment: Option<String>,
    pub comment_url: Option<String>,
    /// Unrecognized attributes, original case preserved.
    pub rest: HashMap<String, Option<String>>,
}

impl Cookie {
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires, Some(expires) if expires <= now)
    }

    /// Serialized form for a `Cookie` request header.
    pub fn header_pair(&self) -> String {
        match &self.value {
            Some(value) => format!("{}={}", self.name, value),
            None => self.name.clone(),
        }
    }
}
