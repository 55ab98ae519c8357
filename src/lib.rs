//! Library crate for fanxi-back, exposing modules for binaries and integration tests.

/// Configuration file loading and validation.
pub mod config;
/// Persistence layer.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Error types and their HTTP mapping.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared state and the domain model.
pub mod state;
