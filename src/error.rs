//! Error types
//!
//! Every fallible jar operation returns [`CookieError`] synchronously.

use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CookieError {
    /// The cookie was already expired (or carried a negative max-age) when inserted.
    #[error("cookie '{name}' is invalid")]
    InvalidRecord { name: String },

    #[error("cookie '{name}' not found")]
    NotFound { name: String },

    #[error("index {index} out of range for jar of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A cookie with this name exists but is no longer valid.
    #[error("cookie '{name}' is present but no longer valid")]
    InvalidButPresent { name: String },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    #[error("cookie '{name}' cannot be sent as a header value")]
    HeaderValue {
        name: String,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("cookie jar must be created inside a Tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, CookieError>;
