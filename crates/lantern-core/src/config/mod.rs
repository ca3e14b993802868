//! Application configuration schemas.
//!
//! The process configuration is deserialized via the `config` crate from
//! TOML files plus `LANTERN__*` environment variables. Plugin settings live
//! in a separate JSON [`Metadata`] document because they are scoped to
//! databases and tables.

pub mod app;
pub mod logging;
pub mod metadata;
pub mod plugin;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::logging::LoggingConfig;
use self::plugin::PluginsConfig;

pub use self::metadata::Metadata;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server identity settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Plugin system settings.
    #[serde(default)]
    pub plugins: PluginsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `LANTERN__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LANTERN")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("plugins.disabled")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let config = AppConfig::load("no-such-env").expect("defaults load");
        assert_eq!(config.server.name, "lantern");
        assert!(config.plugins.load_defaults);
        assert!(config.plugins.is_enabled("anything"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_disabled_plugins() {
        let plugins = PluginsConfig {
            disabled: vec!["lantern.default_menu_links".to_string()],
            ..PluginsConfig::default()
        };
        assert!(!plugins.is_enabled("lantern.default_menu_links"));
        assert!(plugins.is_enabled("lantern.default_permissions"));
    }
}
