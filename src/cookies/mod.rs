//! Cookie storage and `Set-Cookie` handling.
//!
//! The jar implements the subset of RFC 6265/2965 behavior needed for
//! service-to-service calls: parse `Set-Cookie` headers best-effort, file
//! cookies under (domain, path, name), and serialize the matching ones onto
//! outgoing requests, longest path first.

pub mod cookie;
pub mod jar;
mod parse;

pub use cookie::Cookie;
pub use jar::CookieJar;
