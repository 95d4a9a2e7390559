//! Store configuration.

use serde::{Deserialize, Serialize};
use tracking_core::SiteIdConfig;

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database URL (e.g. "sqlite://tracking.db" or "sqlite::memory:").
    #[serde(default = "default_url")]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Public site identifier generation settings.
    #[serde(default)]
    pub site_ids: SiteIdConfig,
}

fn default_url() -> String {
    "sqlite://tracking.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            site_ids: SiteIdConfig::default(),
        }
    }
}

impl StoreConfig {
    /// In-memory database for tests. A single connection keeps every
    /// query on the same in-memory instance.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Self::default()
        }
    }
}
