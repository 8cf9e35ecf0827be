//! gleaner surfaces: the MCP tool server and the REST facade.

pub mod handler;
pub mod rest;
pub mod tools;

pub use handler::GleanerServer;
pub use rest::{ApiState, router, serve};
