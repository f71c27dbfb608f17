//! Cookie Export
//!
//! Writes valid jar cookies onto outgoing requests as a `Cookie` header,
//! a form body or a JSON body.

use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Body, Request};
use tracing::trace;

use super::CookieJar;
use crate::error::{CookieError, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

impl CookieJar {
    /// Append `name=value` pairs of valid cookies to the request's `Cookie` header.
    ///
    /// Pairs follow store order and extend any header already present.
    pub fn export_to_header(&self, request: &mut Request, names: &[&str]) -> Result<()> {
        let pairs = self.inner().valid_pairs(names);
        if pairs.is_empty() {
            return Ok(());
        }

        let mut header = request
            .headers()
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        for (name, value) in &pairs {
            let pair = format!("{}={}", name, value);
            HeaderValue::from_str(&pair).map_err(|source| CookieError::HeaderValue {
                name: name.clone(),
                source,
            })?;
            if !header.is_empty() {
                header.push_str("; ");
            }
            header.push_str(&pair);
        }

        let value = HeaderValue::from_str(&header).map_err(|source| CookieError::HeaderValue {
            name: COOKIE.to_string(),
            source,
        })?;
        request.headers_mut().insert(COOKIE, value);
        trace!(count = pairs.len(), "Exported cookies to header");
        Ok(())
    }

    /// Replace the request body with the form-encoded [`as_map`](Self::as_map)
    pub fn export_to_form_body(&self, request: &mut Request, names: &[&str]) -> Result<()> {
        let form = serde_urlencoded::to_string(self.as_map(names))?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        *request.body_mut() = Some(Body::from(form));
        Ok(())
    }

    /// Replace the request body with the JSON-encoded [`as_map`](Self::as_map)
    pub fn export_to_json_body(&self, request: &mut Request, names: &[&str]) -> Result<()> {
        let json = self.as_json(names)?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        *request.body_mut() = Some(Body::from(json));
        Ok(())
    }
}
