//! Page assets, template variables and cell rendering.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::Request;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

/// The page being rendered.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Template file name, e.g. `"table.html"`.
    pub template: String,
    /// Database shown on the page.
    pub database: Option<String>,
    /// Table shown on the page.
    pub table: Option<String>,
    /// Visible columns.
    pub columns: Option<Vec<String>>,
    /// `"index"`, `"database"`, `"table"`, `"row"` or `"query"`.
    pub view_name: String,
    /// The current request.
    pub request: Option<Arc<Request>>,
}

impl TemplateContext {
    /// Creates a context for `template` rendered by `view_name`.
    pub fn new(template: impl Into<String>, view_name: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            view_name: view_name.into(),
            ..Self::default()
        }
    }

    /// Sets the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the columns.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Sets the request.
    pub fn with_request(mut self, request: Arc<Request>) -> Self {
        self.request = Some(request);
        self
    }

    fn call_context(&self) -> CallContext {
        let mut ctx = CallContext::new()
            .with("template", self.template.as_str())
            .with("database", self.database.clone())
            .with("table", self.table.clone())
            .with("columns", self.columns.clone())
            .with("view_name", self.view_name.as_str());
        if let Some(request) = &self.request {
            ctx.insert("request", request.clone());
        }
        ctx
    }
}

/// A stylesheet or script URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUrl {
    /// The URL.
    pub url: String,
    /// Subresource integrity hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sri: Option<String>,
    /// Whether a script is an ES module.
    #[serde(default)]
    pub module: bool,
}

/// An inline script for the page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyScript {
    /// Script source.
    pub script: String,
    /// Whether the script is an ES module.
    #[serde(default)]
    pub module: bool,
}

/// Identity of an asset item for de-duplication.
fn asset_key(value: &HookValue) -> Option<String> {
    match value.as_json()? {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn parse_asset(hook: &str, value: HookValue) -> AppResult<AssetUrl> {
    match value {
        HookValue::Json(Value::String(url)) => Ok(AssetUrl {
            url,
            sri: None,
            module: false,
        }),
        HookValue::Json(v @ Value::Object(_)) => serde_json::from_value(v)
            .map_err(|e| AppError::plugin(format!("Invalid asset from {hook}: {e}"))),
        other => Err(AppError::plugin(format!(
            "Hook '{hook}' returned {}, expected a URL or {{url, sri, module}}",
            other.kind_name()
        ))),
    }
}

/// A single table cell about to be rendered.
#[derive(Debug, Clone, Default)]
pub struct CellContext {
    /// The whole row.
    pub row: Value,
    /// The cell's value.
    pub value: Value,
    /// Column name.
    pub column: String,
    /// Table name.
    pub table: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// The current request.
    pub request: Option<Arc<Request>>,
}

impl PluginManager {
    /// Stylesheet URLs for a page, de-duplicated by URL.
    pub async fn extra_css_urls(&self, page: &TemplateContext) -> AppResult<Vec<AssetUrl>> {
        self.collect_assets(HookPoint::ExtraCssUrls, page).await
    }

    /// Script URLs for a page, de-duplicated by URL.
    pub async fn extra_js_urls(&self, page: &TemplateContext) -> AppResult<Vec<AssetUrl>> {
        self.collect_assets(HookPoint::ExtraJsUrls, page).await
    }

    async fn collect_assets(
        &self,
        point: HookPoint,
        page: &TemplateContext,
    ) -> AppResult<Vec<AssetUrl>> {
        let hook = point.as_str();
        let context = self.with_host(hook, page.call_context())?;
        self.dispatcher()
            .call_unique(hook, context, asset_key)
            .await?
            .into_iter()
            .map(|item| parse_asset(hook, item))
            .collect()
    }

    /// Inline scripts for the page body, in order. Not de-duplicated.
    pub async fn extra_body_script(&self, page: &TemplateContext) -> AppResult<Vec<BodyScript>> {
        let hook = HookPoint::ExtraBodyScript.as_str();
        self.call(hook, page.call_context())
            .await?
            .into_list()
            .into_iter()
            .map(|item| match item {
                HookValue::Json(Value::String(script)) => Ok(BodyScript {
                    script,
                    module: false,
                }),
                HookValue::Json(v @ Value::Object(_)) => serde_json::from_value(v)
                    .map_err(|e| AppError::plugin(format!("Invalid script from {hook}: {e}"))),
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected a script",
                    other.kind_name()
                ))),
            })
            .collect()
    }

    /// Template variables from plugins, with the page's own `local`
    /// variables merged last.
    pub async fn extra_template_vars(
        &self,
        page: &TemplateContext,
        local: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        let hook = HookPoint::ExtraTemplateVars.as_str();
        let context = self.with_host(hook, page.call_context())?;
        self.dispatcher()
            .call_merged(hook, context, Some(local))
            .await
    }

    /// Custom rendering for one cell; `None` means use the default.
    pub async fn render_cell(&self, cell: CellContext) -> AppResult<Option<Value>> {
        let hook = HookPoint::RenderCell.as_str();
        let mut context = CallContext::new()
            .with("row", cell.row)
            .with("value", cell.value)
            .with("column", cell.column)
            .with("table", cell.table)
            .with("database", cell.database);
        if let Some(request) = cell.request {
            context.insert("request", request);
        }

        match self.call(hook, context).await?.into_single() {
            None => Ok(None),
            Some(HookValue::Json(v)) => Ok(Some(v)),
            Some(other) => Err(AppError::plugin(format!(
                "Hook '{hook}' returned {}, expected rendered content",
                other.kind_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_asset_key_and_parse() {
        let plain: HookValue = "a.js".into();
        let rich: HookValue = json!({"url": "b.js", "sri": "sha384-x", "module": true}).into();
        assert_eq!(asset_key(&plain).as_deref(), Some("a.js"));
        assert_eq!(asset_key(&rich).as_deref(), Some("b.js"));

        let parsed = parse_asset("extra_js_urls", rich).expect("parse");
        assert_eq!(parsed.sri.as_deref(), Some("sha384-x"));
        assert!(parsed.module);
        assert!(parse_asset("extra_js_urls", true.into()).is_err());
    }

    #[test]
    fn test_call_context_carries_nulls() {
        let page = TemplateContext::new("index.html", "index");
        let ctx = page.call_context();
        assert!(ctx.contains("database"));
        assert_eq!(ctx.json("database"), None);
        assert_eq!(ctx.str("view_name"), Some("index"));
        assert!(!ctx.contains("request"));
    }
}
