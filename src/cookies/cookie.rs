//! Cookie Records
//!
//! A named value with its own expiry state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Max-age value meaning "no countdown, rely on the expiry timestamp"
pub const MAX_AGE_NOT_SET: i64 = 0;

/// SameSite attribute of a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SameSite {
    #[default]
    Default,
    Lax,
    Strict,
    None,
}

/// A single cookie held by a [`CookieJar`](super::CookieJar)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,

    /// Absolute expiry. `None` is a session cookie with no wall-clock expiry.
    pub expires_at: Option<DateTime<Utc>>,

    /// 0 = not set, < 0 = delete now, > 0 = seconds left (one per sweep tick)
    pub max_age: i64,

    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub raw: Option<String>,

    /// Latched once the near-expiry hook has been fired for this cookie
    pub near_expiry_notified: bool,
}

impl Cookie {
    /// Create a session cookie with no countdown
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: String::new(),
            domain: String::new(),
            expires_at: None,
            max_age: MAX_AGE_NOT_SET,
            secure: false,
            http_only: false,
            same_site: SameSite::Default,
            raw: None,
            near_expiry_notified: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expire `ttl` from now
    pub fn expires_in(self, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.with_expires_at(expires_at)
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Check whether the cookie may still be handed out
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let unexpired = self.expires_at.map(|t| t > now).unwrap_or(true);
        unexpired && self.max_age >= MAX_AGE_NOT_SET
    }

    /// Wall-clock time left before `expires_at`, `None` for session cookies
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|t| (t - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether either the countdown or the expiry timestamp falls within `threshold`.
    ///
    /// Without a countdown only `expires_at` is consulted.
    pub fn is_near_expiry_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let by_countdown =
            self.max_age > MAX_AGE_NOT_SET && (self.max_age as u64) <= threshold.as_secs();
        let by_clock = self
            .remaining_at(now)
            .map(|left| left <= threshold)
            .unwrap_or(false);
        by_countdown || by_clock
    }

    /// The sweep tick that would bring the countdown to zero evicts instead
    pub(crate) fn countdown_exhausted(&self) -> bool {
        self.max_age - 1 == MAX_AGE_NOT_SET
    }
}

/// Canonical `name=value` fragment, unescaped
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
