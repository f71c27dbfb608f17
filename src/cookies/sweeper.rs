//! Cookie Sweeper
//!
//! Background task that periodically ages cookies, evicts expired ones and
//! fires the jar's notification hooks.

use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::cookie::MAX_AGE_NOT_SET;
use super::jar::{Hook, JarInner};
use super::Cookie;

/// Outcome of a single sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Cookies evicted this pass
    pub expired: usize,
    /// Cookies that crossed the near-expiry threshold this pass
    pub notified: usize,
    /// Cookies left in the jar afterwards
    pub remaining: usize,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.expired == 0 && self.notified == 0
    }
}

impl JarInner {
    /// Age every cookie by one tick.
    ///
    /// Structural changes happen under the cookie mutex; hooks run after it is
    /// released, on snapshots taken while it was held.
    pub(super) fn sweep(&self) -> SweepReport {
        let (on_expire, on_near_expiry, threshold) = {
            let hooks = self.hooks.read();
            (
                hooks.on_expire.clone(),
                hooks.on_near_expiry.clone(),
                hooks.near_expiry_threshold,
            )
        };

        let now = Utc::now();
        let mut expired = Vec::new();
        let mut near_expiry = Vec::new();

        let remaining = {
            let mut cookies = self.cookies.lock();
            cookies.retain_mut(|cookie| {
                if !cookie.is_valid_at(now) || cookie.countdown_exhausted() {
                    self.backend.mirror_remove(&cookie.name);
                    expired.push(cookie.clone());
                    return false;
                }

                if cookie.max_age > MAX_AGE_NOT_SET {
                    cookie.max_age -= 1;
                }

                if !cookie.near_expiry_notified && cookie.is_near_expiry_at(now, threshold) {
                    cookie.near_expiry_notified = true;
                    near_expiry.push(cookie.clone());
                }
                true
            });
            cookies.len()
        };

        self.metrics.record_sweep(expired.len(), near_expiry.len());

        if let Some(hook) = &on_expire {
            for cookie in &expired {
                self.run_hook("on_expire", hook, cookie);
            }
        }
        if let Some(hook) = &on_near_expiry {
            for cookie in &near_expiry {
                self.run_hook("on_near_expiry", hook, cookie);
            }
        }

        SweepReport {
            expired: expired.len(),
            notified: near_expiry.len(),
            remaining,
        }
    }

    fn run_hook(&self, kind: &'static str, hook: &Hook, cookie: &Cookie) {
        if panic::catch_unwind(AssertUnwindSafe(|| (**hook)(cookie))).is_err() {
            self.metrics.record_hook_panic();
            error!(hook = kind, cookie = %cookie.name, "Cookie hook panicked, sweeper continues");
        }
    }
}

/// Background sweep task owned by a jar
pub(super) struct Sweeper {
    jar: Arc<JarInner>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl Sweeper {
    /// Run the sweeper until cancelled (should be spawned as a task)
    pub(super) async fn run(self) {
        // First pass one full interval after start
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "Cookie sweeper started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.jar.sweep();
                    if !report.is_idle() {
                        debug!(
                            expired = report.expired,
                            notified = report.notified,
                            remaining = report.remaining,
                            "Swept cookie jar"
                        );
                    }
                }
            }
        }

        info!("Cookie sweeper stopped");
    }

    /// Spawn the sweeper as a background task on `runtime`
    pub(super) fn spawn(
        runtime: &Handle,
        jar: Arc<JarInner>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let sweeper = Self {
            jar,
            // tokio intervals reject a zero period
            interval: interval.max(Duration::from_millis(1)),
            shutdown,
        };
        runtime.spawn(sweeper.run())
    }
}

#[cfg(test)]
mod tests {
    use crate::cookies::{Cookie, CookieJar, CookieTable, JarConfig, SharedTable, TableBackend};
    use crate::error::CookieError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn long_lived(name: &str) -> Cookie {
        Cookie::new(name, "v").expires_in(Duration::from_secs(3600))
    }

    /// A jar whose background task is already stopped, driven by hand
    fn manual_jar() -> CookieJar {
        let jar = CookieJar::new().unwrap();
        jar.stop();
        jar
    }

    #[tokio::test]
    async fn test_countdown_then_evict() {
        let jar = manual_jar();
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        jar.set_on_expire(move |c| sink.lock().unwrap().push(c.clone()));

        jar.insert(long_lived("testing_jar").with_max_age(2)).unwrap();

        let report = jar.sweep();
        assert_eq!(report.expired, 0);
        assert_eq!(jar.get("testing_jar").unwrap().max_age, 1);

        let report = jar.sweep();
        assert_eq!(report.expired, 1);
        assert_eq!(report.remaining, 0);
        assert!(matches!(
            jar.get("testing_jar"),
            Err(CookieError::NotFound { .. })
        ));

        let expired = expired.lock().unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "testing_jar");
        assert_eq!(expired[0].max_age, 1);
        assert_eq!(jar.metrics().evictions(), 1);
    }

    #[tokio::test]
    async fn test_no_countdown_is_not_decremented() {
        let jar = manual_jar();
        jar.insert(long_lived("session")).unwrap();
        for _ in 0..5 {
            jar.sweep();
        }
        assert_eq!(jar.get("session").unwrap().max_age, 0);
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_evicted() {
        let jar = manual_jar();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        jar.set_on_expire(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        jar.insert(
            Cookie::new("short", "v").with_expires_at(Utc::now() + chrono::Duration::milliseconds(50)),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(80));

        assert_eq!(jar.sweep().expired, 1);
        assert!(jar.is_empty());
        jar.sweep();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_near_expiry_fires_once() {
        let jar = manual_jar();
        jar.set_near_expiry_threshold(Duration::from_secs(10));
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        jar.set_on_near_expiry(move |c| {
            assert!(c.near_expiry_notified);
            hits.fetch_add(1, Ordering::SeqCst);
        });

        jar.insert(long_lived("far").with_max_age(100)).unwrap();
        jar.insert(long_lived("near").with_max_age(8)).unwrap();
        jar.insert(
            Cookie::new("clock", "v").with_expires_at(Utc::now() + chrono::Duration::seconds(5)),
        )
        .unwrap();

        assert_eq!(jar.sweep().notified, 2);
        for _ in 0..3 {
            assert_eq!(jar.sweep().notified, 0);
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(jar.get("near").unwrap().near_expiry_notified);
        assert!(!jar.get("far").unwrap().near_expiry_notified);
        assert_eq!(jar.get("near").unwrap().max_age, 4);
    }

    #[tokio::test]
    async fn test_hook_panic_is_isolated() {
        let jar = manual_jar();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        jar.set_on_expire(move |c| {
            hits.fetch_add(1, Ordering::SeqCst);
            if c.name == "boom" {
                panic!("hook failure");
            }
        });

        jar.insert(long_lived("boom").with_max_age(1)).unwrap();
        jar.insert(long_lived("fine").with_max_age(1)).unwrap();

        let report = jar.sweep();
        assert_eq!(report.expired, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(jar.metrics().hook_panics(), 1);
    }

    #[tokio::test]
    async fn test_hook_can_use_jar() {
        let jar = manual_jar();
        let handle = jar.clone();
        jar.set_on_expire(move |c| {
            handle
                .insert(long_lived(&format!("{}-renewed", c.name)))
                .unwrap();
        });

        jar.insert(long_lived("token").with_max_age(1)).unwrap();
        jar.sweep();
        assert!(jar.get("token-renewed").is_ok());
    }

    #[tokio::test]
    async fn test_eviction_is_mirrored() {
        let table = SharedTable::new();
        let jar =
            CookieJar::with_backend(JarConfig::default(), TableBackend::new(table.clone())).unwrap();
        jar.stop();

        jar.insert(long_lived("a").with_max_age(1)).unwrap();
        assert_eq!(table.read("a").as_deref(), Some("v"));
        jar.sweep();
        assert_eq!(table.read("a").as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_ticks() {
        let jar = CookieJar::new().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        jar.set_on_expire(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        jar.insert(long_lived("ticking").with_max_age(2)).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(jar.get("ticking").unwrap().max_age, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(
            jar.get("ticking"),
            Err(CookieError::NotFound { .. })
        ));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_sweeping() {
        let jar = CookieJar::new().unwrap();
        jar.insert(long_lived("kept").with_max_age(1)).unwrap();

        jar.stop();
        jar.stop();
        assert!(jar.is_stopped());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let kept = jar.get("kept").unwrap();
        assert_eq!(kept.max_age, 1);
        assert_eq!(jar.metrics().sweeps(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_survives_near_expiry_panic() {
        let jar = CookieJar::new().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        jar.set_on_near_expiry(|_| panic!("near-expiry hook failure"));
        jar.set_on_expire(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        jar.insert(long_lived("flaky").with_max_age(3)).unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(jar.metrics().hook_panics(), 1);
        assert_eq!(jar.metrics().sweeps(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(jar.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_stops_sweeper() {
        let jar = CookieJar::new().unwrap();
        let clone = jar.clone();
        let token = clone.shutdown.clone();

        drop(jar);
        assert!(!token.is_cancelled());
        drop(clone);
        assert!(token.is_cancelled());
    }
}
