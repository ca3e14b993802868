//! Plugins that ship with the host.
//!
//! They register like any other plugin but carry
//! [`PluginSource::Default`](crate::registry::PluginSource::Default), so
//! third-party plugins get the first word on override-sensitive hooks.

pub mod magic_parameters;
pub mod menu_links;
pub mod permissions;

use crate::registry::Plugin;

/// Built-in plugins in registration order.
pub fn default_plugins() -> Vec<Plugin> {
    vec![
        permissions::plugin(),
        magic_parameters::plugin(),
        menu_links::plugin(),
    ]
}
