//! Storage Backends
//!
//! A jar is built with one backend that observes every structural change.
//! The in-memory backend observes nothing; the table backend mirrors each
//! change into an external cookie table addressed by name.

use dashmap::DashMap;
use std::sync::Arc;

use super::Cookie;

/// Side channel invoked by the jar for every insert and removal.
///
/// Calls happen while the jar's guard is held, so implementations must not
/// call back into the jar.
pub trait CookieBackend: Send + Sync {
    /// A cookie was appended to the jar
    fn mirror_insert(&self, cookie: &Cookie);

    /// A cookie with this name was removed from the jar
    fn mirror_remove(&self, name: &str);
}

/// Default backend: cookies live only in the jar
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl CookieBackend for MemoryBackend {
    fn mirror_insert(&self, _cookie: &Cookie) {}

    fn mirror_remove(&self, _name: &str) {}
}

/// An external, name-addressed cookie table (e.g. a browser's cookie string)
pub trait CookieTable: Send + Sync {
    fn write(&self, name: &str, value: &str);

    fn read(&self, name: &str) -> Option<String>;
}

/// Backend writing `name=value` on insert and `name=` on removal
pub struct TableBackend<T: CookieTable> {
    table: T,
}

impl<T: CookieTable> TableBackend<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }
}

impl<T: CookieTable> CookieBackend for TableBackend<T> {
    fn mirror_insert(&self, cookie: &Cookie) {
        self.table.write(&cookie.name, &cookie.value);
    }

    fn mirror_remove(&self, name: &str) {
        self.table.write(name, "");
    }
}

/// In-process cookie table shared between the jar and its readers
#[derive(Debug, Clone, Default)]
pub struct SharedTable {
    inner: Arc<DashMap<String, String>>,
}

impl SharedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names ever written (cleared names keep an empty value)
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Render the table as a `document.cookie`-style string, sorted by name
    pub fn to_cookie_string(&self) -> String {
        let mut pairs: Vec<_> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieTable for SharedTable {
    fn write(&self, name: &str, value: &str) {
        self.inner.insert(name.to_string(), value.to_string());
    }

    fn read(&self, name: &str) -> Option<String> {
        self.inner.get(name).map(|v| v.value().clone())
    }
}
