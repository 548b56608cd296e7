//! Authenticated HTTP API over the compose core

pub mod handler;
pub mod server;

pub use handler::{ApiHandler, ApiRequest, ApiResponse};
pub use server::Server;
