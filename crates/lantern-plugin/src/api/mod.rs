//! API surface handed to plugins.

pub mod context;
