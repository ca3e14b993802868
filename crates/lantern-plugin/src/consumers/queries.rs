//! Canned queries contributed by plugins and metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::Actor;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::HookPoint;
use crate::manager::PluginManager;

/// A named, pre-defined SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannedQuery {
    /// Query name, unique per database.
    pub name: String,
    /// SQL text.
    pub sql: String,
    /// Display title.
    pub title: Option<String>,
    /// Whether the query writes.
    pub write: bool,
    /// Whether the query is visible only to actors allowed to see it.
    pub private: bool,
}

#[derive(Deserialize)]
struct QueryFields {
    sql: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    write: bool,
    #[serde(default)]
    private: bool,
}

impl CannedQuery {
    /// Parses a `name → sql | {sql, title?, write?, private?}` entry.
    pub fn from_entry(name: &str, entry: Value) -> AppResult<Self> {
        let fields = match entry {
            Value::String(sql) => QueryFields {
                sql,
                title: None,
                write: false,
                private: false,
            },
            other @ Value::Object(_) => serde_json::from_value(other).map_err(|e| {
                AppError::plugin(format!("Invalid canned query '{name}': {e}"))
            })?,
            other => {
                return Err(AppError::plugin(format!(
                    "Invalid canned query '{name}': expected SQL or an object, got {other}"
                )));
            }
        };
        Ok(Self {
            name: name.to_string(),
            sql: fields.sql,
            title: fields.title,
            write: fields.write,
            private: fields.private,
        })
    }
}

impl PluginManager {
    /// Canned queries for `database`, keyed by name.
    ///
    /// Plugin contributions are merged in registration order and the
    /// queries configured in metadata are merged last, so metadata wins.
    pub async fn canned_queries(
        &self,
        database: &str,
        actor: Option<&Actor>,
    ) -> AppResult<BTreeMap<String, CannedQuery>> {
        let hook = HookPoint::CannedQueries.as_str();
        let local = self.host().metadata().queries(database);
        let context = self.with_host(
            hook,
            CallContext::new()
                .with("database", database)
                .with("actor", actor.cloned()),
        )?;

        self.dispatcher()
            .call_merged(hook, context, Some(&local))
            .await?
            .into_iter()
            .map(|(name, entry)| -> AppResult<(String, CannedQuery)> {
                let query = CannedQuery::from_entry(&name, entry)?;
                Ok((name, query))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_forms() {
        let plain = CannedQuery::from_entry("q", json!("select 1")).expect("plain");
        assert_eq!(plain.sql, "select 1");
        assert!(!plain.write);

        let rich = CannedQuery::from_entry(
            "add",
            json!({"sql": "insert into t values (:v)", "write": true, "title": "Add"}),
        )
        .expect("rich");
        assert!(rich.write);
        assert_eq!(rich.title.as_deref(), Some("Add"));

        assert!(CannedQuery::from_entry("bad", json!(3)).is_err());
        assert!(CannedQuery::from_entry("bad", json!({"title": "no sql"})).is_err());
    }
}
