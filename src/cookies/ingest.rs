//! Cookie Ingest
//!
//! Adapts cookies received on HTTP responses into jar cookies.

use chrono::{DateTime, Utc};
use std::time::{Duration, SystemTime};

use super::{Cookie, CookieJar, SameSite};
use crate::error::Result;

/// A cookie defined outside this crate, typically parsed from a `Set-Cookie` header
pub trait ExternalCookie {
    fn name(&self) -> &str;
    fn value(&self) -> &str;
    fn path(&self) -> Option<&str>;
    fn domain(&self) -> Option<&str>;
    fn expires(&self) -> Option<SystemTime>;

    /// The `Max-Age` attribute if one was sent
    fn max_age(&self) -> Option<Duration>;
    fn secure(&self) -> bool;
    fn http_only(&self) -> bool;
    fn same_site(&self) -> SameSite;

    fn raw(&self) -> Option<&str> {
        None
    }

    /// Convert into a jar cookie.
    ///
    /// An absent `Max-Age` means no countdown; `Max-Age=0` means delete now.
    fn to_cookie(&self) -> Cookie {
        let max_age = match self.max_age() {
            None => 0,
            Some(age) if age.as_secs() == 0 => -1,
            Some(age) => i64::try_from(age.as_secs()).unwrap_or(i64::MAX),
        };

        Cookie {
            name: self.name().to_string(),
            value: self.value().to_string(),
            path: self.path().unwrap_or_default().to_string(),
            domain: self.domain().unwrap_or_default().to_string(),
            expires_at: self.expires().map(DateTime::<Utc>::from),
            max_age,
            secure: self.secure(),
            http_only: self.http_only(),
            same_site: self.same_site(),
            raw: self.raw().map(str::to_string),
            near_expiry_notified: false,
        }
    }
}

impl ExternalCookie for reqwest::cookie::Cookie<'_> {
    fn name(&self) -> &str {
        reqwest::cookie::Cookie::name(self)
    }

    fn value(&self) -> &str {
        reqwest::cookie::Cookie::value(self)
    }

    fn path(&self) -> Option<&str> {
        reqwest::cookie::Cookie::path(self)
    }

    fn domain(&self) -> Option<&str> {
        reqwest::cookie::Cookie::domain(self)
    }

    fn expires(&self) -> Option<SystemTime> {
        reqwest::cookie::Cookie::expires(self)
    }

    fn max_age(&self) -> Option<Duration> {
        reqwest::cookie::Cookie::max_age(self)
    }

    fn secure(&self) -> bool {
        reqwest::cookie::Cookie::secure(self)
    }

    fn http_only(&self) -> bool {
        reqwest::cookie::Cookie::http_only(self)
    }

    /// reqwest only reports `Lax` and `Strict`, so `SameSite=None` maps to
    /// [`SameSite::Default`].
    fn same_site(&self) -> SameSite {
        if self.same_site_strict() {
            SameSite::Strict
        } else if self.same_site_lax() {
            SameSite::Lax
        } else {
            SameSite::Default
        }
    }
}

impl CookieJar {
    /// Insert a cookie received from an HTTP response
    pub fn insert_external<C: ExternalCookie + ?Sized>(&self, cookie: &C) -> Result<()> {
        self.insert(cookie.to_cookie())
    }

    /// Insert every cookie in order, stopping at the first rejected one.
    ///
    /// ```no_run
    /// # async fn demo(jar: requester::CookieJar) -> anyhow::Result<()> {
    /// let response = reqwest::get("https://example.com/login").await?;
    /// jar.insert_external_all(response.cookies())?;
    /// # Ok(()) }
    /// ```
    pub fn insert_external_all<I>(&self, cookies: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ExternalCookie,
    {
        for cookie in cookies {
            self.insert_external(&cookie)?;
        }
        Ok(())
    }
}
