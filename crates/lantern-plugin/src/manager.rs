//! Plugin manager. Owns the registries and the host handle.
//!
//! The manager is the process-scoped kernel instance: it is built once at
//! startup, handed to the host explicitly and never stored in a global.
//! The typed consumer wrappers (permissions, actors, routes, ...) are
//! implemented on it in the `consumers` modules.

use std::sync::Arc;

use tracing::{debug, info, warn};

use lantern_core::config::plugin::PluginsConfig;
use lantern_core::result::AppResult;

use crate::api::context::PluginContext;
use crate::consumers::permissions::PermissionTable;
use crate::defaults;
use crate::hooks::context::CallContext;
use crate::hooks::dispatcher::{Aggregated, HookDispatcher};
use crate::hooks::spec::{HookSpec, HookSpecRegistry};
use crate::registry::{Plugin, PluginListing, PluginRegistry};

/// The plugin kernel.
#[derive(Debug)]
pub struct PluginManager {
    specs: Arc<HookSpecRegistry>,
    plugins: Arc<PluginRegistry>,
    dispatcher: HookDispatcher,
    permissions: PermissionTable,
    host: Arc<PluginContext>,
    config: PluginsConfig,
}

impl PluginManager {
    /// Creates a kernel with every built-in hook declared and no plugins.
    pub fn new(host: Arc<PluginContext>, config: PluginsConfig) -> Self {
        let specs = Arc::new(HookSpecRegistry::with_builtin_hooks());
        let plugins = Arc::new(PluginRegistry::new());
        let dispatcher = HookDispatcher::new(specs.clone(), plugins.clone());

        Self {
            specs,
            plugins,
            dispatcher,
            permissions: PermissionTable::new(),
            host,
            config,
        }
    }

    /// Creates a kernel and registers the built-in plugins.
    ///
    /// Built-ins are skipped entirely when `load_defaults` is off, and
    /// individually when listed in `disabled`.
    pub fn bootstrap(host: Arc<PluginContext>, config: PluginsConfig) -> AppResult<Self> {
        let manager = Self::new(host, config);
        if manager.config.load_defaults {
            for plugin in defaults::default_plugins() {
                manager.register(plugin)?;
            }
        } else {
            info!("Built-in plugins disabled by configuration");
        }
        Ok(manager)
    }

    /// Declares an additional hook. Must happen before the first dispatch.
    pub fn declare_hook(&self, spec: HookSpec) -> AppResult<()> {
        self.specs.declare(spec)
    }

    /// Registers a plugin unless configuration disables it.
    ///
    /// Returns whether the plugin was registered.
    pub fn register(&self, plugin: Plugin) -> AppResult<bool> {
        if !self.config.is_enabled(plugin.name()) {
            warn!(plugin = %plugin.name(), "Plugin disabled by configuration, skipping");
            return Ok(false);
        }
        self.plugins.register(plugin, &self.specs)?;
        Ok(true)
    }

    /// Registers a plugin for the lifetime of the returned guard.
    ///
    /// Configuration is not consulted: the caller asked for this plugin
    /// explicitly.
    pub fn register_scoped(&self, plugin: Plugin) -> AppResult<PluginGuard> {
        let name = plugin.name().to_string();
        self.plugins.register(plugin, &self.specs)?;
        Ok(PluginGuard {
            plugins: self.plugins.clone(),
            name,
        })
    }

    /// Removes a plugin.
    pub fn unregister(&self, name: &str) -> AppResult<()> {
        self.plugins.unregister(name).map(|_| ())
    }

    /// Dispatches a hook with the given arguments.
    ///
    /// `host` is supplied automatically when the hook recognises it.
    pub async fn call(&self, hook: &str, context: CallContext) -> AppResult<Aggregated> {
        let context = self.with_host(hook, context)?;
        self.dispatcher.call(hook, context).await
    }

    /// Adds the `host` argument if the hook takes it and the caller did not.
    pub(crate) fn with_host(&self, hook: &str, mut context: CallContext) -> AppResult<CallContext> {
        let spec = self.specs.lookup(hook)?;
        if spec.accepts("host") && !context.contains("host") {
            context.insert("host", self.host.clone());
        }
        Ok(context)
    }

    /// Lists installed plugins in registration order.
    pub fn list_plugins(&self) -> Vec<PluginListing> {
        self.plugins.list()
    }

    /// Returns the hook dispatcher.
    pub fn dispatcher(&self) -> &HookDispatcher {
        &self.dispatcher
    }

    /// Returns the hook spec registry.
    pub fn specs(&self) -> &Arc<HookSpecRegistry> {
        &self.specs
    }

    /// Returns the plugin registry.
    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    /// Returns the registered permission table.
    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    /// Returns the host handle.
    pub fn host(&self) -> &Arc<PluginContext> {
        &self.host
    }

    /// Returns the plugin configuration.
    pub fn config(&self) -> &PluginsConfig {
        &self.config
    }
}

/// Keeps a plugin registered until dropped.
#[derive(Debug)]
#[must_use = "the plugin is unregistered as soon as the guard is dropped"]
pub struct PluginGuard {
    plugins: Arc<PluginRegistry>,
    name: String,
}

impl PluginGuard {
    /// Name of the guarded plugin.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for PluginGuard {
    fn drop(&mut self) {
        if self.plugins.unregister(&self.name).is_err() {
            debug!(plugin = %self.name, "Scoped plugin already unregistered");
        }
    }
}
