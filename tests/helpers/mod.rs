//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use lantern_core::config::Metadata;
use lantern_core::config::plugin::PluginsConfig;
use lantern_core::types::{Permission, Response};
use lantern_plugin::consumers::routes::Route;
use lantern_plugin::{Plugin, PluginContext, PluginManager};

/// Host handle over `metadata`.
pub fn host_with(metadata: Value) -> Arc<PluginContext> {
    let metadata = Metadata::from_json(metadata).expect("valid metadata");
    Arc::new(PluginContext::new(metadata).with_databases(["fixtures"]))
}

/// Kernel with the built-in plugins registered.
pub fn kernel() -> PluginManager {
    kernel_with(json!({}))
}

/// Kernel with built-ins over the given metadata.
pub fn kernel_with(metadata: Value) -> PluginManager {
    PluginManager::bootstrap(host_with(metadata), PluginsConfig::default())
        .expect("Failed to bootstrap kernel")
}

/// Kernel without any plugins.
pub fn bare_kernel() -> PluginManager {
    PluginManager::new(host_with(json!({})), PluginsConfig::default())
}

/// Registers `plugin`, panicking on failure.
pub fn install(kernel: &PluginManager, plugin: Plugin) {
    kernel.register(plugin).expect("Failed to register plugin");
}

/// Shared invocation counter.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Plugin contributing script URLs.
pub fn js_plugin(name: &str, urls: &[&str]) -> Plugin {
    let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    Plugin::new(name).sync_hook("extra_js_urls", &[], move |_| Ok(Some(urls.clone().into())))
}

/// Plugin resolving `{"id": "bot"}` when the request has `?_bot=1`.
pub fn bot_actor_plugin() -> Plugin {
    Plugin::new("bot-actor").sync_hook("actor_from_request", &["request"], |args| {
        let flagged = args.request().is_some_and(|r| r.arg("_bot").is_some());
        Ok(flagged.then(|| json!({"id": "bot"}).into()))
    })
}

/// Plugin registering `this_is_denied`, a permission defaulting to deny.
pub fn denied_permission_plugin() -> Plugin {
    Plugin::new("denied-permission").sync_hook("register_permissions", &[], |_| {
        Ok(Some(
            vec![
                Permission::new("this_is_denied")
                    .with_description("Denied unless a plugin says otherwise")
                    .with_default(false),
                Permission::new("this_is_allowed").with_default(true),
            ]
            .into(),
        ))
    })
}

/// Plugin answering `permission_allowed` with a fixed decision.
pub fn deciding_plugin(name: &str, decision: Option<bool>, calls: Calls) -> Plugin {
    Plugin::new(name).sync_hook("permission_allowed", &["action"], move |_| {
        calls.hit();
        Ok(decision.map(Into::into))
    })
}

/// Plugin overriding the `/db/table` route shape.
pub fn route_override_plugin() -> Plugin {
    Plugin::new("route-override").sync_hook("register_routes", &[], |_| {
        Ok(Some(
            vec![Route::sync("/db/table", |_, _| {
                Ok(Response::html("from plugin"))
            })]
            .into(),
        ))
    })
}

/// Built-in route matching any `/<database>/<table>` path.
pub fn builtin_table_route() -> Route {
    Route::sync(r"/(?P<database>[^/]+)/(?P<table>[^/.]+)", |req, _| {
        Ok(Response::html(format!(
            "built-in table {}",
            req.url_vars.get("table").map(String::as_str).unwrap_or("")
        )))
    })
}
