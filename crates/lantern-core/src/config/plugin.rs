//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Whether the built-in default plugins are registered at bootstrap.
    #[serde(default = "default_true")]
    pub load_defaults: bool,
    /// Plugin names that are skipped at bootstrap, built-in or not.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Optional path to the JSON metadata document holding plugin settings.
    #[serde(default)]
    pub metadata_path: Option<String>,
}

impl PluginsConfig {
    /// Returns whether a plugin with this name may be registered.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            load_defaults: true,
            disabled: Vec::new(),
            metadata_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}
