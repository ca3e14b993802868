//! # lantern-plugin
//!
//! Plugin kernel for Lantern. Provides:
//!
//! - Hook specifications with fixed argument names and aggregation policies
//! - An ordered plugin registry with registration-time validation
//! - A dispatcher that runs sync and async implementations in order
//! - Typed consumers for permissions, actors, routes, renderers and assets
//! - The built-in default plugins

pub mod api;
pub mod consumers;
pub mod defaults;
pub mod hooks;
pub mod macros;
pub mod manager;
pub mod prelude;
pub mod registry;

pub use api::context::PluginContext;
pub use hooks::context::CallContext;
pub use hooks::definitions::{HookPoint, HookValue};
pub use hooks::dispatcher::{Aggregated, HookDispatcher};
pub use hooks::spec::{AggregationPolicy, HookSpec, HookSpecRegistry};
pub use manager::{PluginGuard, PluginManager};
pub use registry::{Plugin, PluginRegistry};
