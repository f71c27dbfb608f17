//! Cookie Jar
//!
//! Insertion-ordered cookie store guarded by a single mutex, with a
//! background sweeper that ages, evicts and notifies.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::trace;

use super::backend::{CookieBackend, MemoryBackend};
use super::sweeper::{SweepReport, Sweeper};
use super::{Cookie, JarConfig};
use crate::error::{CookieError, Result};
use crate::metrics::JarMetrics;

/// Callback invoked by the sweeper with a snapshot of the affected cookie
pub type Hook = Arc<dyn Fn(&Cookie) + Send + Sync>;

pub(super) struct Hooks {
    pub(super) on_expire: Option<Hook>,
    pub(super) on_near_expiry: Option<Hook>,
    pub(super) near_expiry_threshold: Duration,
}

/// State shared between jar handles and the sweeper task
pub(super) struct JarInner {
    pub(super) cookies: Mutex<Vec<Cookie>>,
    pub(super) hooks: RwLock<Hooks>,
    pub(super) backend: Arc<dyn CookieBackend>,
    pub(super) metrics: JarMetrics,
}

impl JarInner {
    fn new(near_expiry_threshold: Duration, backend: Arc<dyn CookieBackend>) -> Self {
        Self {
            cookies: Mutex::new(Vec::new()),
            hooks: RwLock::new(Hooks {
                on_expire: None,
                on_near_expiry: None,
                near_expiry_threshold,
            }),
            backend,
            metrics: JarMetrics::new(),
        }
    }

    /// `(name, value)` of every valid cookie passing the name filter, in store order
    pub(super) fn valid_pairs(&self, names: &[&str]) -> Vec<(String, String)> {
        let cookies = self.cookies.lock();
        cookies
            .iter()
            .filter(|c| c.is_valid() && matches_filter(names, &c.name))
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }
}

fn matches_filter(names: &[&str], name: &str) -> bool {
    names.is_empty() || names.contains(&name)
}

/// Thread-safe TTL cookie jar
///
/// Clones share the same cookies, hooks and sweeper. The sweeper stops when
/// [`stop`](Self::stop) is called or the last clone is dropped.
#[derive(Clone)]
pub struct CookieJar {
    inner: Arc<JarInner>,
    pub(super) shutdown: CancellationToken,
    _guard: Arc<DropGuard>,
}

impl CookieJar {
    /// Create an in-memory jar with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(JarConfig::default())
    }

    /// Create an in-memory jar
    pub fn with_config(config: JarConfig) -> Result<Self> {
        Self::with_backend(config, MemoryBackend)
    }

    /// Create a jar whose mutations are mirrored into `backend`.
    ///
    /// Must be called from within a Tokio runtime; the sweeper is spawned on it.
    pub fn with_backend<B>(config: JarConfig, backend: B) -> Result<Self>
    where
        B: CookieBackend + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| CookieError::NoRuntime)?;
        let inner = Arc::new(JarInner::new(
            config.near_expiry_threshold,
            Arc::new(backend),
        ));
        let shutdown = CancellationToken::new();

        Sweeper::spawn(
            &runtime,
            inner.clone(),
            config.sweep_interval,
            shutdown.clone(),
        );

        Ok(Self {
            inner,
            _guard: Arc::new(shutdown.clone().drop_guard()),
            shutdown,
        })
    }

    /// Insert a cookie, rejecting it if it is already invalid
    pub fn insert(&self, cookie: Cookie) -> Result<()> {
        if !cookie.is_valid() {
            return Err(CookieError::InvalidRecord { name: cookie.name });
        }

        let mut cookies = self.inner.cookies.lock();
        self.inner.backend.mirror_insert(&cookie);
        trace!(cookie = %cookie.name, "Inserted cookie");
        cookies.push(cookie);
        self.inner.metrics.record_insert();
        Ok(())
    }

    /// Remove the first cookie with this name
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut cookies = self.inner.cookies.lock();
        let index = cookies
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| CookieError::NotFound {
                name: name.to_string(),
            })?;
        self.remove_locked(&mut cookies, index);
        Ok(())
    }

    /// Remove the cookie at `index` in insertion order
    pub fn remove_at(&self, index: usize) -> Result<()> {
        let mut cookies = self.inner.cookies.lock();
        if index >= cookies.len() {
            return Err(CookieError::IndexOutOfRange {
                index,
                len: cookies.len(),
            });
        }
        self.remove_locked(&mut cookies, index);
        Ok(())
    }

    fn remove_locked(&self, cookies: &mut Vec<Cookie>, index: usize) {
        let removed = cookies.remove(index);
        self.inner.backend.mirror_remove(&removed.name);
        self.inner.metrics.record_removal();
        trace!(cookie = %removed.name, "Removed cookie");
    }

    /// Get the first cookie with this name, provided it is still valid
    pub fn get(&self, name: &str) -> Result<Cookie> {
        let cookies = self.inner.cookies.lock();
        let cookie = cookies
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CookieError::NotFound {
                name: name.to_string(),
            })?;

        if !cookie.is_valid() {
            return Err(CookieError::InvalidButPresent {
                name: name.to_string(),
            });
        }
        Ok(cookie.clone())
    }

    /// Snapshot of every cookie, valid or not, in insertion order
    pub fn all(&self) -> Vec<Cookie> {
        self.inner.cookies.lock().clone()
    }

    /// Name to value map of valid cookies. An empty `names` selects all.
    pub fn as_map(&self, names: &[&str]) -> BTreeMap<String, String> {
        self.inner.valid_pairs(names).into_iter().collect()
    }

    /// [`as_map`](Self::as_map) encoded as a JSON object
    pub fn as_json(&self, names: &[&str]) -> Result<Bytes> {
        let json = serde_json::to_vec(&self.as_map(names))?;
        Ok(Bytes::from(json))
    }

    /// Number of cookies held (including invalid ones not yet swept)
    pub fn len(&self) -> usize {
        self.inner.cookies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &JarMetrics {
        &self.inner.metrics
    }

    pub(super) fn inner(&self) -> &JarInner {
        &self.inner
    }

    /// Called once with each cookie the sweeper evicts.
    ///
    /// A hook that captures a clone of this jar keeps the sweeper alive until [`stop`](Self::stop).
    pub fn set_on_expire<F>(&self, hook: F)
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.inner.hooks.write().on_expire = Some(Arc::new(hook));
    }

    /// Called once per cookie when its remaining lifetime drops within the threshold
    pub fn set_on_near_expiry<F>(&self, hook: F)
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.inner.hooks.write().on_near_expiry = Some(Arc::new(hook));
    }

    pub fn clear_hooks(&self) {
        let mut hooks = self.inner.hooks.write();
        hooks.on_expire = None;
        hooks.on_near_expiry = None;
    }

    pub fn set_near_expiry_threshold(&self, threshold: Duration) {
        self.inner.hooks.write().near_expiry_threshold = threshold;
    }

    pub fn near_expiry_threshold(&self) -> Duration {
        self.inner.hooks.read().near_expiry_threshold
    }

    /// Run one sweep pass now, independent of the background schedule
    pub fn sweep(&self) -> SweepReport {
        self.inner.sweep()
    }

    /// Stop the background sweeper. Safe to call any number of times.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("cookies", &self.len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
