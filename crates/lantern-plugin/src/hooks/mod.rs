//! Hook system: specs, implementations, dispatch and aggregation.

pub mod context;
pub mod definitions;
pub mod dispatcher;
pub mod handler;
pub mod policy;
pub mod spec;
