//! Host-facing types shared by the kernel and the host collaborators.

pub mod actor;
pub mod permission;
pub mod request;
pub mod response;

pub use actor::Actor;
pub use permission::{Permission, Resource};
pub use request::Request;
pub use response::Response;
