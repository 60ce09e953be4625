//! Client configuration, read once at construction.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

pub const BASE_URL_VAR: &str = "API_BASE_URL";
pub const TIMEOUT_VAR: &str = "REQUEST_TIMEOUT";
pub const ORIGIN_VAR: &str = "API_ORIGIN";

/// Immutable connection settings shared by every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and host that a relative `base_url` resolves against.
    pub origin: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `API_BASE_URL`, `REQUEST_TIMEOUT` (milliseconds) and `API_ORIGIN`
    /// from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base_url = lookup(BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let origin = lookup(ORIGIN_VAR).filter(|v| !v.trim().is_empty());
        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!(value = %raw, "invalid {TIMEOUT_VAR}, using default of {DEFAULT_TIMEOUT_MS}ms");
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };
        Self {
            origin,
            base_url,
            timeout,
        }
    }

    /// Join origin, base address and `path` into the request target.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        // An absolute base address already names its origin.
        let origin = match self.origin.as_deref() {
            Some(origin) if !base.contains("://") => origin.trim_end_matches('/'),
            _ => "",
        };
        let base = if !origin.is_empty() && !base.is_empty() && !base.starts_with('/') {
            format!("/{base}")
        } else {
            base.to_string()
        };
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{origin}{base}")
        } else {
            format!("{origin}{base}/{path}")
        }
    }
}
