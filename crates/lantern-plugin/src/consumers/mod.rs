//! Typed wrappers the host uses to call specific hooks.
//!
//! Each consumer builds the call arguments, dispatches and interprets the
//! folded result. Most of them are methods on
//! [`PluginManager`](crate::manager::PluginManager).

pub mod actor;
pub mod commands;
pub mod exceptions;
pub mod magic;
pub mod menus;
pub mod metadata;
pub mod permissions;
pub mod queries;
pub mod renderers;
pub mod routes;
pub mod startup;
pub mod templates;
