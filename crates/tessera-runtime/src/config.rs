//! Runtime configuration

use serde::{Deserialize, Serialize};

/// Runtime configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of root component ids (`s0`, `s1`, ...)
    pub id_prefix: String,

    /// Register delegated root listeners for event bindings
    pub delegate_events: bool,

    /// Flush rounds `tick` runs before giving up on a component that keeps
    /// re-queueing itself
    pub max_flush_rounds: usize,

    /// Observe every container the runtime renders into
    pub record_mutations: bool,
}

impl Config {
    /// Load from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_prefix: "s".to_string(),
            delegate_events: true,
            max_flush_rounds: 100,
            record_mutations: false,
        }
    }
}
