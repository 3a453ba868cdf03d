//! Progress store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retention of progress entries held for the HTTP bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How long a terminal entry stays queryable (default: 3600).
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// How often expired entries are swept (default: 60).
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_eviction_interval_secs() -> u64 {
    60
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

impl ProgressConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs.max(1))
    }
}
