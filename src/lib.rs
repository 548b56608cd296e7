//! composedeck - a docker-compose project dashboard backend
//!
//! composedeck discovers docker-compose definition files on the host,
//! parses their service topology, and drives them through the compose
//! CLI. It exposes the results over a small authenticated HTTP API:
//!
//! - Bounded recursive discovery of compose files
//! - Normalization of heterogeneous compose YAML shapes
//! - Lifecycle commands (up/down/build/ps/logs) with timeout-bounded
//!   child process capture
//! - Per-service container status from `ps --format json`

pub mod api;
pub mod auth;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;

pub use error::{DeckError, Result};
