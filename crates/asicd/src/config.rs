//! Daemon configuration.

use std::time::Duration;

/// The environment variable overriding the tie-break seed.
pub const APPLY_SEED_ENV: &str = "ASICD_APPLY_SEED";
/// The environment variable overriding the counter poll interval (seconds).
pub const POLL_INTERVAL_ENV: &str = "ASICD_POLL_INTERVAL_SECS";
/// The environment variable overriding the switch index.
pub const SWITCH_INDEX_ENV: &str = "ASICD_SWITCH_INDEX";

/// Configuration for the consumer daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Index of the switch this daemon drives.
    pub switch_index: u8,
    /// Seed for the reconciliation tie-break; fixed seeds give
    /// reproducible apply runs.
    pub apply_seed: u64,
    /// Counter polling interval.
    pub poll_interval: Duration,
    /// Optional NATS URL override (defaults to `NATS_URL` env or
    /// localhost).
    pub nats_url: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            switch_index: 0,
            apply_seed: 0,
            poll_interval: Duration::from_secs(10),
            nats_url: None,
        }
    }
}

impl DaemonConfig {
    /// Build a config from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(seed) = std::env::var(APPLY_SEED_ENV) {
            if let Ok(seed) = seed.parse() {
                config.apply_seed = seed;
            }
        }
        if let Ok(secs) = std::env::var(POLL_INTERVAL_ENV) {
            if let Ok(secs) = secs.parse() {
                config.poll_interval = Duration::from_secs(secs);
            }
        }
        if let Ok(index) = std::env::var(SWITCH_INDEX_ENV) {
            if let Ok(index) = index.parse() {
                config.switch_index = index;
            }
        }
        config
    }

    /// Override the NATS URL.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    /// Override the apply seed.
    #[must_use]
    pub fn with_apply_seed(mut self, seed: u64) -> Self {
        self.apply_seed = seed;
        self
    }
}
