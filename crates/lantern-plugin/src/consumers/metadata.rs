//! Metadata contributed by plugins.

use serde_json::{Map, Value};

use lantern_core::result::AppResult;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::HookPoint;
use crate::manager::PluginManager;

impl PluginManager {
    /// The metadata document with plugin fragments merged in.
    ///
    /// Plugin fragments merge in registration order; the locally configured
    /// metadata is merged last and wins on conflicts.
    pub async fn get_metadata(
        &self,
        key: Option<&str>,
        database: Option<&str>,
        table: Option<&str>,
    ) -> AppResult<Map<String, Value>> {
        let hook = HookPoint::GetMetadata.as_str();
        let local = match self.host().metadata().to_public_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let context = self.with_host(
            hook,
            CallContext::new()
                .with("key", key.map(str::to_string))
                .with("database", database.map(str::to_string))
                .with("table", table.map(str::to_string)),
        )?;
        self.dispatcher()
            .call_merged(hook, context, Some(&local))
            .await
    }

    /// A single metadata value, narrowest scope first.
    ///
    /// Looks in the table, then the database, then the root of the merged
    /// document.
    pub async fn metadata_value(
        &self,
        key: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> AppResult<Option<Value>> {
        let merged = self.get_metadata(Some(key), database, table).await?;

        let db = database.and_then(|d| merged.get("databases")?.get(d));
        let tbl = db
            .zip(table)
            .and_then(|(db, t)| db.get("tables")?.get(t));

        let value = tbl
            .and_then(|t| t.get(key))
            .or_else(|| db.and_then(|d| d.get(key)))
            .or_else(|| merged.get(key))
            .cloned();
        Ok(value)
    }
}
