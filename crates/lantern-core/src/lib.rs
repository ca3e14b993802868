//! # lantern-core
//!
//! Core crate for Lantern. Contains configuration schemas (including the
//! scoped plugin metadata), the host-facing request/response/actor/permission
//! types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Lantern crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
