//! Client and polling configuration.
//!
//! # Design
//! Settings that would otherwise be process-wide (domain, token, locale) live
//! in an explicit `Config` value owned by `SnapCarClient`. Requests capture the
//! token at build time, so changing it only affects requests built afterwards.

use std::time::Duration;

use crate::types::Locale;

/// Production API domain.
pub const DEFAULT_BASE_DOMAIN: &str = "https://api.snapcar.com/public";

/// Locale used for text selection when none is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Delay between two dispatch polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Connection settings shared by every request of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_domain: String,
    pub token: Option<String>,
    pub locale: String,
    pub fallback_locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            token: None,
            locale: DEFAULT_LOCALE.to_string(),
            fallback_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl Config {
    /// Read `SNAPCAR_BASE_DOMAIN`, `SNAPCAR_TOKEN` and `SNAPCAR_LOCALE`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(domain) = std::env::var("SNAPCAR_BASE_DOMAIN") {
            config = config.with_base_domain(&domain);
        }
        if let Ok(token) = std::env::var("SNAPCAR_TOKEN") {
            config = config.with_token(token);
        }
        if let Ok(locale) = std::env::var("SNAPCAR_LOCALE") {
            config = config.with_locale(&locale);
        }
        config
    }

    pub fn with_base_domain(mut self, domain: &str) -> Self {
        self.base_domain = domain.trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    pub fn with_fallback_locale(mut self, locale: &str) -> Self {
        self.fallback_locale = locale.to_string();
        self
    }

    pub fn text_locale(&self) -> Locale<'_> {
        Locale {
            preferred: &self.locale,
            fallback: &self.fallback_locale,
        }
    }
}

/// Bounds of the dispatch polling loop.
///
/// The defaults poll every three seconds, forever, and shrug off refresh
/// failures. Set `max_attempts` or `max_consecutive_failures` to make the
/// loop give up with `Error::PollingExhausted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            max_consecutive_failures: None,
        }
    }
}

impl PollingConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_max_consecutive_failures(mut self, failures: u32) -> Self {
        self.max_consecutive_failures = Some(failures);
        self
    }
}
