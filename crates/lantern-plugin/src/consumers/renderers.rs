//! Output renderers keyed by file extension.
//!
//! A renderer's result is either a mapping with `body`, `content_type`,
//! `status_code` and `headers` keys, or a ready-made [`Response`]. Anything
//! else is a renderer contract violation, reported to the requester as a
//! 500 naming the offending shape.
//!
//! `can_render` only decides whether an export link is advertised. A direct
//! request for the extension always reaches the renderer.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Request, Response};

use crate::api::context::PluginContext;
use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

/// Everything a renderer gets to see about a result.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Host handle.
    pub host: Option<Arc<PluginContext>>,
    /// Column names.
    pub columns: Vec<String>,
    /// Result rows, one value per column.
    pub rows: Vec<Vec<Value>>,
    /// SQL that produced the rows.
    pub sql: Option<String>,
    /// Canned query name, if the rows came from one.
    pub query_name: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Table name, for table pages.
    pub table: Option<String>,
    /// The live request.
    pub request: Option<Arc<Request>>,
    /// `"table"`, `"query"` or `"row"`.
    pub view_name: String,
}

impl RenderContext {
    /// Rows as JSON objects keyed by column name.
    pub fn row_objects(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                Value::Object(
                    self.columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect(),
                )
            })
            .collect()
    }
}

type RenderFn = Arc<dyn Fn(RenderContext) -> BoxFuture<'static, AppResult<HookValue>> + Send + Sync>;
type CanRenderFn = Arc<dyn Fn(&RenderContext) -> bool + Send + Sync>;

/// A renderer for one extension.
#[derive(Clone)]
pub struct OutputRenderer {
    extension: String,
    render: RenderFn,
    can_render: Option<CanRenderFn>,
}

impl fmt::Debug for OutputRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputRenderer")
            .field("extension", &self.extension)
            .field("can_render", &self.can_render.is_some())
            .finish_non_exhaustive()
    }
}

impl OutputRenderer {
    /// Creates a renderer with an async render function.
    pub fn new<F, Fut>(extension: impl Into<String>, render: F) -> Self
    where
        F: Fn(RenderContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<HookValue>> + Send + 'static,
    {
        Self {
            extension: extension.into(),
            render: Arc::new(move |ctx: RenderContext| render(ctx).boxed()),
            can_render: None,
        }
    }

    /// Creates a renderer with a synchronous render function.
    pub fn sync<F>(extension: impl Into<String>, render: F) -> Self
    where
        F: Fn(&RenderContext) -> AppResult<HookValue> + Send + Sync + 'static,
    {
        Self {
            extension: extension.into(),
            render: Arc::new(move |ctx: RenderContext| future::ready(render(&ctx)).boxed()),
            can_render: None,
        }
    }

    /// Sets the link-advertisement predicate.
    pub fn with_can_render<F>(mut self, can_render: F) -> Self
    where
        F: Fn(&RenderContext) -> bool + Send + Sync + 'static,
    {
        self.can_render = Some(Arc::new(can_render));
        self
    }

    /// The extension, without a leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether an export link should be shown for `ctx`.
    pub fn can_render(&self, ctx: &RenderContext) -> bool {
        self.can_render.as_ref().is_none_or(|f| f(ctx))
    }
}

/// An advertised export link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportLink {
    /// Renderer extension.
    pub extension: String,
    /// Link target.
    pub url: String,
}

/// Installed renderers; one per extension.
#[derive(Debug, Clone, Default)]
pub struct RendererSet {
    renderers: Vec<OutputRenderer>,
}

impl RendererSet {
    /// Builds a set, keeping the first renderer for each extension.
    pub fn new(renderers: Vec<OutputRenderer>) -> Self {
        let mut set = Self::default();
        for renderer in renderers {
            if set.get(&renderer.extension).is_some() {
                warn!(extension = %renderer.extension, "Ignoring duplicate output renderer");
                continue;
            }
            set.renderers.push(renderer);
        }
        set
    }

    /// Renderer for `extension`.
    pub fn get(&self, extension: &str) -> Option<&OutputRenderer> {
        self.renderers.iter().find(|r| r.extension == extension)
    }

    /// Registered extensions in order.
    pub fn extensions(&self) -> Vec<&str> {
        self.renderers.iter().map(|r| r.extension()).collect()
    }

    /// Renders `ctx` with the renderer for `extension`.
    pub async fn render(&self, extension: &str, ctx: RenderContext) -> AppResult<Response> {
        let renderer = self
            .get(extension)
            .ok_or_else(|| AppError::not_found(format!("No renderer for .{extension}")))?;
        debug!(extension = %extension, rows = ctx.rows.len(), "Rendering output");
        let value = (renderer.render)(ctx).await?;
        into_response(extension, value)
    }

    /// Export links for every renderer whose `can_render` accepts `ctx`.
    pub fn export_links(&self, ctx: &RenderContext) -> Vec<ExportLink> {
        let (path, query) = ctx
            .request
            .as_ref()
            .map(|r| {
                let full = r.full_path();
                let query = full
                    .split_once('?')
                    .map(|(_, q)| format!("?{q}"))
                    .unwrap_or_default();
                (r.path.clone(), query)
            })
            .unwrap_or_default();

        self.renderers
            .iter()
            .filter(|r| r.can_render(ctx))
            .map(|r| ExportLink {
                extension: r.extension.clone(),
                url: format!("{path}.{}{query}", r.extension),
            })
            .collect()
    }
}

fn into_response(extension: &str, value: HookValue) -> AppResult<Response> {
    let map = match value {
        HookValue::Response(response) => return Ok(response),
        HookValue::Json(Value::Object(map)) => map,
        other => {
            return Err(AppError::renderer_contract(format!(
                "Renderer for .{extension} returned {}, expected a mapping or Response",
                other.kind_name()
            )));
        }
    };

    let body = match map.get("body") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(AppError::renderer_contract(format!(
                "Renderer for .{extension} returned a non-string body: {other}"
            )));
        }
    };
    let content_type = map
        .get("content_type")
        .and_then(Value::as_str)
        .unwrap_or("text/plain");
    let status = match map.get("status_code") {
        None | Some(Value::Null) => 200,
        Some(v) => v
            .as_u64()
            .and_then(|s| u16::try_from(s).ok())
            .ok_or_else(|| {
                AppError::renderer_contract(format!(
                    "Renderer for .{extension} returned an invalid status_code: {v}"
                ))
            })?,
    };

    let mut response = Response::new(status, content_type, body);
    if let Some(Value::Object(headers)) = map.get("headers") {
        for (name, value) in headers {
            let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
            response = response.with_header(name.clone(), value);
        }
    }
    Ok(response)
}

impl PluginManager {
    /// Collects output renderers; the first registration of an extension wins.
    pub async fn output_renderers(&self) -> AppResult<RendererSet> {
        let hook = HookPoint::RegisterOutputRenderer.as_str();
        let renderers = self
            .call(hook, CallContext::new())
            .await?
            .into_list()
            .into_iter()
            .map(|item| match item {
                HookValue::Renderer(r) => Ok(r),
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected an OutputRenderer",
                    other.kind_name()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(RendererSet::new(renderers))
    }

    /// A render context pre-filled with the host handle.
    pub fn render_context(&self, view_name: impl Into<String>) -> RenderContext {
        RenderContext {
            host: Some(self.host().clone()),
            view_name: view_name.into(),
            ..RenderContext::default()
        }
    }
}
