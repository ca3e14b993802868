//! Instance metadata: scoped plugin settings and canned queries.
//!
//! Plugin configuration can be set at three scopes: the root of the
//! document, a database, or a table inside a database. Lookups walk from the
//! narrowest scope outwards and the first scope that mentions the plugin
//! wins entirely; scopes are never merged.
//!
//! Values may use `{"$env": "NAME"}` or `{"$file": "path"}` indirection.
//! Indirection is resolved only when a plugin asks for its configuration;
//! the serialized metadata keeps the unresolved form so secrets are never
//! exposed through introspection.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AppError;
use crate::result::AppResult;

/// Root metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Root-scoped plugin settings keyed by plugin name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    /// Per-database metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub databases: BTreeMap<String, DatabaseMetadata>,
    /// Any other keys (title, license, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata for one database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Database-scoped plugin settings.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    /// Per-table metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, TableMetadata>,
    /// Canned queries configured for this database.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub queries: Map<String, Value>,
    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table-scoped plugin settings.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Builds metadata from an already-parsed JSON document.
    pub fn from_json(value: Value) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::configuration(format!("Invalid metadata document: {e}")))
    }

    /// Loads metadata from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!(
                "Failed to read metadata '{}': {e}",
                path.display()
            ))
        })?;
        let value: Value = serde_json::from_str(&raw)?;
        Self::from_json(value)
    }

    /// Returns the configuration for `plugin`, resolved from the narrowest
    /// scope that defines it.
    ///
    /// Table scope is only consulted when both `database` and `table` are
    /// given. Returns `None` when no scope mentions the plugin.
    pub fn plugin_config(
        &self,
        plugin: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> Option<Value> {
        let db_meta = database.and_then(|db| self.databases.get(db));

        let table_scoped = db_meta
            .zip(table)
            .and_then(|(db, t)| db.tables.get(t))
            .and_then(|t| t.plugins.get(plugin));
        let db_scoped = db_meta.and_then(|db| db.plugins.get(plugin));
        let root_scoped = self.plugins.get(plugin);

        let raw = table_scoped.or(db_scoped).or(root_scoped)?;
        debug!(plugin = %plugin, database = ?database, table = ?table, "Resolved plugin config");
        Some(resolve_secrets(raw))
    }

    /// Returns the canned queries configured for `database`.
    pub fn queries(&self, database: &str) -> Map<String, Value> {
        self.databases
            .get(database)
            .map(|db| db.queries.clone())
            .unwrap_or_default()
    }

    /// Serializes the metadata for introspection endpoints.
    ///
    /// Secret indirections are kept in their unresolved form.
    pub fn to_public_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Resolves `$env` / `$file` indirections anywhere inside `value`.
///
/// Only single-key objects are treated as indirections. A missing variable
/// or unreadable file resolves to `null`.
pub fn resolve_secrets(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.len() == 1 => {
            if let Some(Value::String(name)) = map.get("$env") {
                return std::env::var(name).map(Value::String).unwrap_or(Value::Null);
            }
            if let Some(Value::String(path)) = map.get("$file") {
                return std::fs::read_to_string(path)
                    .map(Value::String)
                    .unwrap_or(Value::Null);
            }
            resolve_object(map)
        }
        Value::Object(map) => resolve_object(map),
        Value::Array(items) => Value::Array(items.iter().map(resolve_secrets).collect()),
        other => other.clone(),
    }
}

fn resolve_object(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), resolve_secrets(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Metadata {
        Metadata::from_json(json!({
            "title": "Fixtures",
            "plugins": {
                "name-of-plugin": {"depth": "root"},
                "env-plugin": {"foo": {"$env": "LANTERN_TEST_FOO_ENV"}},
                "env-plugin-list": [{"in_a_list": {"$env": "LANTERN_TEST_FOO_ENV"}}]
            },
            "databases": {
                "fixtures": {
                    "plugins": {"name-of-plugin": {"depth": "database"}},
                    "tables": {
                        "sortable": {"plugins": {"name-of-plugin": {"depth": "table"}}}
                    },
                    "queries": {"magic": "select 1"}
                }
            }
        }))
        .expect("valid metadata")
    }

    #[test]
    fn test_scope_narrowing() {
        let meta = fixture();
        assert_eq!(
            meta.plugin_config("name-of-plugin", Some("fixtures"), Some("sortable")),
            Some(json!({"depth": "table"}))
        );
        assert_eq!(
            meta.plugin_config("name-of-plugin", Some("fixtures"), Some("unknown_table")),
            Some(json!({"depth": "database"}))
        );
        assert_eq!(
            meta.plugin_config("name-of-plugin", Some("fixtures"), None),
            Some(json!({"depth": "database"}))
        );
        assert_eq!(
            meta.plugin_config("name-of-plugin", Some("unknown_database"), None),
            Some(json!({"depth": "root"}))
        );
        assert_eq!(
            meta.plugin_config("name-of-plugin", None, None),
            Some(json!({"depth": "root"}))
        );
        assert_eq!(meta.plugin_config("unknown-plugin", None, None), None);
    }

    #[test]
    fn test_table_scope_replaces_not_merges() {
        let meta = Metadata::from_json(json!({
            "plugins": {"p": {"a": 1, "b": 2}},
            "databases": {"db": {"tables": {"t": {"plugins": {"p": {"a": 9}}}}}}
        }))
        .expect("valid metadata");
        assert_eq!(meta.plugin_config("p", Some("db"), Some("t")), Some(json!({"a": 9})));
    }

    #[test]
    fn test_env_indirection_is_resolved_but_not_exposed() {
        // SAFETY: test-only env mutation with a variable no other test reads.
        unsafe { std::env::set_var("LANTERN_TEST_FOO_ENV", "FROM_ENVIRONMENT") };
        let meta = fixture();
        assert_eq!(
            meta.plugin_config("env-plugin", None, None),
            Some(json!({"foo": "FROM_ENVIRONMENT"}))
        );
        assert_eq!(
            meta.plugin_config("env-plugin-list", None, None),
            Some(json!([{"in_a_list": "FROM_ENVIRONMENT"}]))
        );
        let public = meta.to_public_json();
        assert_eq!(
            public["plugins"]["env-plugin"],
            json!({"foo": {"$env": "LANTERN_TEST_FOO_ENV"}})
        );
        assert_eq!(public["title"], json!("Fixtures"));
    }

    #[test]
    fn test_file_indirection() {
        let path = std::env::temp_dir().join("lantern-metadata-secret.txt");
        std::fs::write(&path, "FROM_FILE").expect("write secret");
        let secret_path = path.to_string_lossy().to_string();
        let meta = Metadata::from_json(json!({
            "plugins": {"file-plugin": {"foo": {"$file": secret_path}}}
        }))
        .expect("valid metadata");
        assert_eq!(
            meta.plugin_config("file-plugin", None, None),
            Some(json!({"foo": "FROM_FILE"}))
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_env_resolves_to_null() {
        let value = resolve_secrets(&json!({"k": {"$env": "LANTERN_TEST_DEFINITELY_UNSET"}}));
        assert_eq!(value, json!({"k": null}));
    }

    #[test]
    fn test_queries_for_database() {
        let meta = fixture();
        assert_eq!(meta.queries("fixtures").get("magic"), Some(&json!("select 1")));
        assert!(meta.queries("other").is_empty());
    }
}
