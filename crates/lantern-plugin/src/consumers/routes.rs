//! Plugin routes and the route table.
//!
//! Plugin routes are placed ahead of the host's built-in routes, so a plugin
//! pattern that matches the same path as a built-in one wins.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use regex::Regex;
use tracing::{debug, info};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Request, Response};

use crate::api::context::PluginContext;
use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

type RouteHandlerFn =
    Arc<dyn Fn(Request, Arc<PluginContext>) -> BoxFuture<'static, AppResult<Response>> + Send + Sync>;

/// A `(pattern, handler)` pair.
///
/// The pattern is a regular expression matched against the whole request
/// path; named groups become the request's `url_vars`.
#[derive(Clone)]
pub struct Route {
    pattern: String,
    handler: RouteHandlerFn,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Creates a route with an async handler.
    pub fn new<F, Fut>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Request, Arc<PluginContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        Self {
            pattern: pattern.into(),
            handler: Arc::new(move |req: Request, host: Arc<PluginContext>| handler(req, host).boxed()),
        }
    }

    /// Creates a route with a synchronous handler.
    pub fn sync<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &PluginContext) -> AppResult<Response> + Send + Sync + 'static,
    {
        Self {
            pattern: pattern.into(),
            handler: Arc::new(move |req: Request, host: Arc<PluginContext>| {
                future::ready(handler(&req, &host)).boxed()
            }),
        }
    }

    /// The route's pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Compiled routes in match order.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<(Regex, Route)>,
    host: Arc<PluginContext>,
}

impl RouteTable {
    /// Compiles routes; an invalid pattern is a startup error.
    pub fn compile(routes: Vec<Route>, host: Arc<PluginContext>) -> AppResult<Self> {
        let routes = routes
            .into_iter()
            .map(|route| -> AppResult<(Regex, Route)> {
                let regex = Regex::new(&format!("^(?:{})$", route.pattern))?;
                Ok((regex, route))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self { routes, host })
    }

    /// Finds the first route matching `path`, with its named captures.
    pub fn resolve(&self, path: &str) -> Option<(&Route, BTreeMap<String, String>)> {
        self.routes.iter().find_map(|(regex, route)| {
            let captures = regex.captures(path)?;
            let vars = regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect();
            Some((route, vars))
        })
    }

    /// Dispatches a request to the first matching route.
    pub async fn handle(&self, mut request: Request) -> AppResult<Response> {
        let (route, vars) = self
            .resolve(&request.path)
            .ok_or_else(|| AppError::not_found(format!("No route for {}", request.path)))?;
        debug!(path = %request.path, pattern = %route.pattern, "Route matched");
        request.url_vars = vars;
        (route.handler)(request, self.host.clone()).await
    }

    /// Patterns in match order.
    pub fn patterns(&self) -> Vec<&str> {
        self.routes.iter().map(|(_, r)| r.pattern()).collect()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl PluginManager {
    /// Routes contributed by plugins, in registration order.
    pub async fn plugin_routes(&self) -> AppResult<Vec<Route>> {
        let hook = HookPoint::RegisterRoutes.as_str();
        self.call(hook, CallContext::new())
            .await?
            .into_list()
            .into_iter()
            .map(|item| match item {
                HookValue::Route(route) => Ok(route),
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected a Route",
                    other.kind_name()
                ))),
            })
            .collect()
    }

    /// Builds the route table with plugin routes ahead of `builtin`.
    pub async fn routes(&self, builtin: Vec<Route>) -> AppResult<RouteTable> {
        let mut routes = self.plugin_routes().await?;
        let plugin_count = routes.len();
        routes.extend(builtin);
        info!(plugin_routes = plugin_count, total = routes.len(), "Route table built");
        RouteTable::compile(routes, self.host().clone())
    }

    /// Resolves the request's actor, then dispatches it through `table`.
    pub async fn handle_request(&self, table: &RouteTable, request: Request) -> AppResult<Response> {
        let request = self.resolve_request_actor(request).await?;
        table.handle(request).await
    }
}
