use serde::{Deserialize, Serialize};

/// Configuration for the closure engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Safety bound on layered-rebuild iterations before it is treated as an
    /// internal-consistency failure. Default: 1000.
    pub safety_bound: Option<u32>,
    /// Run the store in WAL mode. Default: true.
    pub wal_mode: Option<bool>,
    /// Number of pooled read connections. Default: 4.
    pub read_pool_size: Option<usize>,
}

impl EngineConfig {
    /// Returns the effective safety bound, defaulting to 1000 layers.
    pub fn effective_safety_bound(&self) -> u32 {
        self.safety_bound.unwrap_or(1000)
    }

    /// Returns whether WAL mode is enabled, defaulting to true.
    pub fn effective_wal_mode(&self) -> bool {
        self.wal_mode.unwrap_or(true)
    }

    /// Returns the effective read-pool size, defaulting to 4.
    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(4)
    }

    /// Parses a config from a TOML document. Missing fields fall back to
    /// their `effective_*()` defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
