//! Connection configuration.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::constants::{DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_HEARTBEAT_PERIOD, DEFAULT_POLL_INTERVAL};

/// Environment variable holding the address of the scale to connect to.
pub const ADDRESS_ENV: &str = "ACAIA_ADDRESS";
/// Environment variable overriding the discovery timeout, in seconds.
pub const DISCOVERY_TIMEOUT_ENV: &str = "ACAIA_DISCOVERY_TIMEOUT_SECS";

/// Settings for finding and talking to a scale.
///
/// ```
/// use std::time::Duration;
/// use acaia_ble::ScaleConfig;
///
/// let config = ScaleConfig::default()
///     .target_address("AA:BB:CC:DD:EE:FF")
///     .discovery_timeout(Duration::from_secs(20));
/// assert_eq!(config.target_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Only connect to the scale with this address. Any matching scale
    /// otherwise.
    pub target_address: Option<String>,
    /// How long discovery waits for a scale before giving up.
    pub discovery_timeout: Duration,
    /// Delay between two polls of the scan results when nothing new was seen.
    pub poll_interval: Duration,
    /// Keep-alive period for Acaia scales.
    pub heartbeat_period: Duration,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            target_address: None,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
        }
    }
}

impl ScaleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ACAIA_ADDRESS` and
    /// `ACAIA_DISCOVERY_TIMEOUT_SECS` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(address) = lookup(ADDRESS_ENV).filter(|a| !a.trim().is_empty()) {
            config.target_address = Some(address.trim().to_string());
        }

        if let Some(raw) = lookup(DISCOVERY_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.discovery_timeout = Duration::from_secs(secs),
                Err(_) => warn!("ignoring invalid {}={:?}", DISCOVERY_TIMEOUT_ENV, raw),
            }
        }

        config
    }

    #[must_use]
    pub fn target_address(mut self, address: impl Into<String>) -> Self {
        self.target_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }
}
