pub mod error;

pub use error::{CookieError, FetchError, TransportError};
