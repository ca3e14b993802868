//! Host context: the process-scoped handle passed to hooks as `host`.

use parking_lot::RwLock;
use serde_json::{Map, Value};

use lantern_core::config::Metadata;

/// The host handle plugins receive as their `host` argument.
///
/// Gives access to metadata (and with it per-plugin configuration), the
/// list of attached databases and a small scratch area plugins can use to
/// share state across hook calls.
#[derive(Debug, Default)]
pub struct PluginContext {
    metadata: Metadata,
    databases: Vec<String>,
    state: RwLock<Map<String, Value>>,
}

impl PluginContext {
    /// Creates a context over the given metadata.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            databases: Vec::new(),
            state: RwLock::new(Map::new()),
        }
    }

    /// Sets the attached database names.
    pub fn with_databases<I, S>(mut self, databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.databases = databases.into_iter().map(Into::into).collect();
        self
    }

    /// Configuration for `plugin`, narrowest scope first.
    ///
    /// Returns `None` when no scope configures the plugin.
    pub fn plugin_config(
        &self,
        plugin: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> Option<Value> {
        self.metadata.plugin_config(plugin, database, table)
    }

    /// The loaded metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Attached database names.
    pub fn databases(&self) -> &[String] {
        &self.databases
    }

    /// Stores a scratch value.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state.write().insert(key.into(), value);
    }

    /// Reads a scratch value.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.state.read().get(key).cloned()
    }
}
