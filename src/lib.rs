//! requester - HTTP client helpers
//!
//! The centerpiece is [`CookieJar`]: a concurrent, insertion-ordered cookie
//! store whose background sweeper counts down, evicts and notifies, and which
//! can read cookies off responses and write them onto outgoing requests.

pub mod cookies;
pub mod error;
pub mod metrics;

pub use cookies::{
    Cookie, CookieBackend, CookieJar, CookieTable, ExternalCookie, JarConfig, MemoryBackend,
    SameSite, SharedTable, SweepReport, TableBackend,
};
pub use error::{CookieError, Result};
pub use metrics::JarMetrics;
