//! Plugin registry: the ordered list of installed plugins.
//!
//! Registration order is significant: it is the dispatch order for every
//! hook, and it is preserved for the lifetime of the process. Unregistering
//! a plugin never reorders the remaining ones.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;

use crate::hooks::context::CallContext;
use crate::hooks::handler::{ClosureHandler, HookHandler, HookOutcome};
use crate::hooks::spec::HookSpecRegistry;

/// Where a plugin comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginSource {
    /// Ships with the host.
    Default,
    /// Installed separately.
    ThirdParty,
}

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: Option<String>,
    /// Directory of static assets served for the plugin.
    pub static_path: Option<String>,
    /// Directory of templates contributed by the plugin.
    pub templates_path: Option<String>,
    /// Built-in or third-party.
    pub source: PluginSource,
}

/// A plugin: identity plus its hook implementations.
#[derive(Debug, Clone)]
pub struct Plugin {
    info: PluginInfo,
    hooks: Vec<Arc<dyn HookHandler>>,
}

impl Plugin {
    /// Creates a third-party plugin with no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: PluginInfo {
                name: name.into(),
                version: None,
                static_path: None,
                templates_path: None,
                source: PluginSource::ThirdParty,
            },
            hooks: Vec::new(),
        }
    }

    /// Creates a built-in plugin with no hooks.
    pub fn builtin(name: impl Into<String>) -> Self {
        let mut plugin = Self::new(name);
        plugin.info.source = PluginSource::Default;
        plugin
    }

    /// Sets the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.info.version = Some(version.into());
        self
    }

    /// Sets the static asset directory.
    pub fn with_static_path(mut self, path: impl Into<String>) -> Self {
        self.info.static_path = Some(path.into());
        self
    }

    /// Sets the template directory.
    pub fn with_templates_path(mut self, path: impl Into<String>) -> Self {
        self.info.templates_path = Some(path.into());
        self
    }

    /// Adds a hook implementation.
    pub fn hook(mut self, handler: impl HookHandler + 'static) -> Self {
        self.hooks.push(Arc::new(handler));
        self
    }

    /// Adds a synchronous hook implementation.
    pub fn sync_hook<F>(self, hook: &str, argnames: &[&str], handler: F) -> Self
    where
        F: Fn(&CallContext) -> HookOutcome + Send + Sync + 'static,
    {
        self.hook(ClosureHandler::sync(hook, argnames, handler))
    }

    /// Adds a hook implementation that may suspend.
    pub fn async_hook<F, Fut>(self, hook: &str, argnames: &[&str], handler: F) -> Self
    where
        F: Fn(CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookOutcome> + Send + 'static,
    {
        self.hook(ClosureHandler::suspending(hook, argnames, handler))
    }

    /// Plugin metadata.
    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Hook implementations in declaration order.
    pub fn hooks(&self) -> &[Arc<dyn HookHandler>] {
        &self.hooks
    }

    /// Checks the plugin's declarations against the declared hook specs.
    fn validate(&self, specs: &HookSpecRegistry) -> AppResult<()> {
        let mut seen = HashSet::new();
        for handler in &self.hooks {
            let hook = handler.hook_name();
            if !seen.insert(hook) {
                return Err(AppError::startup(format!(
                    "Plugin '{}' implements hook '{}' more than once",
                    self.info.name, hook
                )));
            }
            let spec = specs.lookup(hook).map_err(|_| {
                AppError::startup(format!(
                    "Plugin '{}' implements unknown hook '{}'",
                    self.info.name, hook
                ))
            })?;
            if let Some(arg) = handler.argnames().iter().find(|a| !spec.accepts(a)) {
                return Err(AppError::startup(format!(
                    "Plugin '{}' hook '{}' takes unknown argument '{}'",
                    self.info.name, hook, arg
                )));
            }
        }
        Ok(())
    }
}

/// One implementation bound to its plugin, as yielded for dispatch.
#[derive(Debug, Clone)]
pub struct HookImplementation {
    /// Owning plugin name.
    pub plugin: String,
    /// Owning plugin source.
    pub source: PluginSource,
    /// The implementation.
    pub handler: Arc<dyn HookHandler>,
}

/// Entry in the `/-/plugins` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginListing {
    /// Plugin name.
    pub name: String,
    /// Plugin version.
    pub version: Option<String>,
    /// Static asset directory.
    pub static_path: Option<String>,
    /// Template directory.
    pub templates_path: Option<String>,
    /// Built-in or third-party.
    pub source: PluginSource,
    /// Implemented hooks, sorted.
    pub hooks: Vec<String>,
}

/// Registry of installed plugins, in registration order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<Plugin>>>,
}

impl PluginRegistry {
    /// Creates an empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin after validating its hook declarations.
    pub fn register(&self, plugin: Plugin, specs: &HookSpecRegistry) -> AppResult<()> {
        plugin.validate(specs)?;

        let mut plugins = self.plugins.write();
        if plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(AppError::startup(format!(
                "Plugin '{}' is already registered",
                plugin.name()
            )));
        }

        info!(
            plugin = %plugin.name(),
            source = ?plugin.info.source,
            hooks = plugin.hooks.len(),
            "Registering plugin"
        );
        plugins.push(Arc::new(plugin));
        Ok(())
    }

    /// Removes a plugin by name, keeping the order of the others.
    pub fn unregister(&self, name: &str) -> AppResult<Arc<Plugin>> {
        let mut plugins = self.plugins.write();
        let index = plugins
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| AppError::not_found(format!("Plugin '{name}' not found")))?;
        let plugin = plugins.remove(index);
        info!(plugin = %name, "Plugin unregistered");
        Ok(plugin)
    }

    /// Implementations of `hook` in dispatch order.
    ///
    /// The result is a fresh snapshot on every call, so registration changes
    /// are seen by the next dispatch. With `defaults_last`, built-in plugins
    /// are moved after third-party ones; relative order is otherwise kept.
    pub fn implementations_for(&self, hook: &str, defaults_last: bool) -> Vec<HookImplementation> {
        let plugins = self.plugins.read();
        let mut implementations: Vec<HookImplementation> = plugins
            .iter()
            .filter_map(|plugin| {
                plugin
                    .hooks
                    .iter()
                    .find(|h| h.hook_name() == hook)
                    .map(|handler| HookImplementation {
                        plugin: plugin.info.name.clone(),
                        source: plugin.info.source,
                        handler: handler.clone(),
                    })
            })
            .collect();

        if defaults_last {
            // Stable sort keeps registration order inside each group.
            implementations.sort_by_key(|i| i.source == PluginSource::Default);
        }
        implementations
    }

    /// Gets a plugin by name.
    pub fn get(&self, name: &str) -> Option<Arc<Plugin>> {
        self.plugins.read().iter().find(|p| p.name() == name).cloned()
    }

    /// Checks whether a plugin is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.read().iter().any(|p| p.name() == name)
    }

    /// Returns plugin count.
    pub fn count(&self) -> usize {
        self.plugins.read().len()
    }

    /// Lists installed plugins in registration order.
    pub fn list(&self) -> Vec<PluginListing> {
        self.plugins
            .read()
            .iter()
            .map(|plugin| {
                let mut hooks: Vec<String> = plugin
                    .hooks
                    .iter()
                    .map(|h| h.hook_name().to_string())
                    .collect();
                hooks.sort();
                PluginListing {
                    name: plugin.info.name.clone(),
                    version: plugin.info.version.clone(),
                    static_path: plugin.info.static_path.clone(),
                    templates_path: plugin.info.templates_path.clone(),
                    source: plugin.info.source,
                    hooks,
                }
            })
            .collect()
    }
}
