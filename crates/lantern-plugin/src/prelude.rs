//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use lantern_core::error::AppError;
pub use lantern_core::result::AppResult;
pub use lantern_core::types::{Actor, Permission, Request, Resource, Response};

pub use crate::api::context::PluginContext;
pub use crate::consumers::commands::CommandRegistry;
pub use crate::consumers::magic::MagicParameter;
pub use crate::consumers::menus::Link;
pub use crate::consumers::renderers::{OutputRenderer, RenderContext};
pub use crate::consumers::routes::Route;
pub use crate::hooks::context::{CallContext, HookArg};
pub use crate::hooks::definitions::{HookPoint, HookValue};
pub use crate::hooks::handler::{HookHandler, HookOutcome, ImplKind};
pub use crate::registry::{Plugin, PluginInfo, PluginSource};

pub use crate::{call_context, plugin};
