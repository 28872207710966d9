use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Url;
use serde::Deserialize;

/// Tracking API used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Period between polling ticks (5 s).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Upper bound on a single tracking request, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Path segments in front of the tracking id: `/api/v1/track/{id}`.
pub const TRACK_PATH_SEGMENTS: [&str; 3] = ["api", "v1", "track"];

/// What to do when a tick fires while the previous tick's fetch is still out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOverlap {
    /// Let fetches overlap; only responses carrying the live session token
    /// are applied, in arrival order.
    #[default]
    Concurrent,
    /// Skip the tick entirely if this session already has a fetch in flight.
    SkipIfInFlight,
}

/// Top-level configuration for the tracking poller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Base URL of the tracking service, without the `/api/v1/track` suffix.
    pub base_url: String,
    /// Polling period in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    pub tick_overlap: TickOverlap,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            tick_overlap: TickOverlap::Concurrent,
        }
    }
}

impl PollerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON config document; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| anyhow!("invalid poller config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parsed base URL. Fails for relative or non-hierarchical URLs.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|e| anyhow!("invalid base url {:?}: {}", self.base_url, e))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("base url {:?} cannot carry a path", self.base_url));
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(anyhow!("request_timeout_ms must be > 0"));
        }
        self.parsed_base_url()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.tick_overlap, TickOverlap::Concurrent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PollerConfig::from_json(
            r#"{"base_url": "https://track.example.com", "tick_overlap": "skip_if_in_flight"}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://track.example.com");
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.tick_overlap, TickOverlap::SkipIfInFlight);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PollerConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let config = PollerConfig::new("not a url");
        assert!(config.validate().is_err());

        let config = PollerConfig::new("mailto:ops@example.com");
        assert!(config.validate().is_err());

        assert!(PollerConfig::from_json(r#"{"request_timeout_ms": 0}"#).is_err());
    }
}
