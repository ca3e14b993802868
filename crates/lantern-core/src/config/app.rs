//! Server identity configuration.

use serde::{Deserialize, Serialize};

/// Host server settings that plugins may observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Instance name shown in plugin listings and logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL prefix used when building links (`"/"` by default).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_url: default_base_url(),
        }
    }
}

fn default_name() -> String {
    "lantern".to_string()
}

fn default_base_url() -> String {
    "/".to_string()
}
