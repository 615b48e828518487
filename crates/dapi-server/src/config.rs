//! Server configuration.

use dapi_feed::FreshnessWindow;
use serde::{Deserialize, Serialize};

/// Tunables of the update pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Oldest accepted update timestamp relative to now (seconds). Default: 3600.
    #[serde(default = "default_max_timestamp_age_secs")]
    pub max_timestamp_age_secs: u32,
    /// Furthest accepted update timestamp ahead of now (seconds). Default: 900.
    #[serde(default = "default_max_timestamp_lead_secs")]
    pub max_timestamp_lead_secs: u32,
}

fn default_max_timestamp_age_secs() -> u32 {
    3600
}

fn default_max_timestamp_lead_secs() -> u32 {
    900
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_timestamp_age_secs: default_max_timestamp_age_secs(),
            max_timestamp_lead_secs: default_max_timestamp_lead_secs(),
        }
    }
}

impl ServerConfig {
    pub fn freshness_window(&self) -> FreshnessWindow {
        FreshnessWindow {
            max_age_secs: self.max_timestamp_age_secs,
            max_lead_secs: self.max_timestamp_lead_secs,
        }
    }
}
