//! Navigation menu and action-menu links.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Actor, Request};

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

/// A menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Visible text.
    pub label: String,
    /// Target URL.
    pub href: String,
}

impl Link {
    /// Creates a link.
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

impl From<Link> for HookValue {
    fn from(link: Link) -> Self {
        HookValue::Json(serde_json::json!({"label": link.label, "href": link.href}))
    }
}

impl PluginManager {
    /// Links for the global navigation menu.
    pub async fn menu_links(
        &self,
        actor: Option<&Actor>,
        request: Option<Arc<Request>>,
    ) -> AppResult<Vec<Link>> {
        let context = CallContext::new()
            .with("actor", actor.cloned())
            .with("request", request);
        self.collect_links(HookPoint::MenuLinks, context).await
    }

    /// Links for a table's action menu.
    pub async fn table_actions(
        &self,
        actor: Option<&Actor>,
        database: &str,
        table: &str,
        request: Option<Arc<Request>>,
    ) -> AppResult<Vec<Link>> {
        let context = CallContext::new()
            .with("actor", actor.cloned())
            .with("database", database)
            .with("table", table)
            .with("request", request);
        self.collect_links(HookPoint::TableActions, context).await
    }

    /// Links for a database's action menu.
    pub async fn database_actions(
        &self,
        actor: Option<&Actor>,
        database: &str,
        request: Option<Arc<Request>>,
    ) -> AppResult<Vec<Link>> {
        let context = CallContext::new()
            .with("actor", actor.cloned())
            .with("database", database)
            .with("request", request);
        self.collect_links(HookPoint::DatabaseActions, context).await
    }

    async fn collect_links(&self, point: HookPoint, context: CallContext) -> AppResult<Vec<Link>> {
        let hook = point.as_str();
        self.call(hook, context)
            .await?
            .into_list()
            .into_iter()
            .map(|item| match item {
                HookValue::Json(v @ Value::Object(_)) => serde_json::from_value(v)
                    .map_err(|e| AppError::plugin(format!("Invalid link from {hook}: {e}"))),
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected {{label, href}}",
                    other.kind_name()
                ))),
            })
            .collect()
    }
}
