//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::client::OfflineAction;
use crate::error::ConfigError;

/// Tunables for session retention and the browser client.
///
/// Durations deserialize from milliseconds:
///
/// ```json
/// { "retention_ms": 60000, "heartbeat_interval_ms": 1000, "offline_action": "disable-forms" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a disconnected session's state is kept for a reconnect.
    /// A longer window survives flakier networks at the cost of memory held
    /// for clients that never return.
    #[serde(rename = "retention_ms", deserialize_with = "millis")]
    pub retention: Duration,

    /// Time between eviction sweeps. Should not exceed `retention`.
    #[serde(rename = "sweep_interval_ms", deserialize_with = "millis")]
    pub sweep_interval: Duration,

    /// How often the client sends a heartbeat. Must be shorter than
    /// `retention`, or idle but connected clients get evicted.
    #[serde(rename = "heartbeat_interval_ms", deserialize_with = "millis")]
    pub heartbeat_interval: Duration,

    /// How long the client waits before reconnecting.
    #[serde(rename = "reconnect_interval_ms", deserialize_with = "millis")]
    pub reconnect_interval: Duration,

    /// What the page does while disconnected.
    pub offline_action: OfflineAction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(1),
            offline_action: OfflineAction::default(),
        }
    }
}

impl Config {
    /// Set how long a disconnected session is kept.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set how often the sweeper runs.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set how often the client sends a heartbeat.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set how long the client waits between reconnect attempts.
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set what the page does while disconnected.
    pub fn with_offline_action(mut self, action: OfflineAction) -> Self {
        self.offline_action = action;
        self
    }

    /// Check the relationships between the intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("retention", self.retention),
            ("sweep_interval", self.sweep_interval),
            ("heartbeat_interval", self.heartbeat_interval),
            ("reconnect_interval", self.reconnect_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Zero(name));
            }
        }

        if self.heartbeat_interval >= self.retention {
            return Err(ConfigError::HeartbeatTooSlow {
                heartbeat_ms: self.heartbeat_interval.as_millis(),
                retention_ms: self.retention.as_millis(),
            });
        }

        if self.sweep_interval > self.retention {
            warn!(
                sweep_ms = self.sweep_interval.as_millis() as u64,
                retention_ms = self.retention.as_millis() as u64,
                "sweep interval exceeds retention window; sessions may outlive it"
            );
        }

        Ok(())
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
