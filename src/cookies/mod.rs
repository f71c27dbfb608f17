//! Cookie Jar
//!
//! TTL cookie store with a background sweeper, storage backends and
//! HTTP ingest/export.

mod backend;
mod config;
mod cookie;
mod export;
mod ingest;
mod jar;
mod sweeper;

pub use backend::{CookieBackend, CookieTable, MemoryBackend, SharedTable, TableBackend};
pub use config::JarConfig;
pub use cookie::{Cookie, SameSite, MAX_AGE_NOT_SET};
pub use ingest::ExternalCookie;
pub use jar::{CookieJar, Hook};
pub use sweeper::SweepReport;
