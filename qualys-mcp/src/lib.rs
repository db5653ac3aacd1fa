//! Qualys vulnerability-management tools served over the Model Context Protocol.
//!
//! This crate bundles the workspace crates and provides the line-delimited
//! JSON-RPC loop the `qualys-mcp` binary runs on stdio.

#![warn(missing_docs, clippy::pedantic)]

pub mod protocol;
pub mod server;

pub use server::McpServer;

/// Wire encoding, normalization and HTTPS transport.
pub use qualys_adapters as adapters;

/// Configuration schema and environment loader.
pub use qualys_config as config;

/// Catalog, rate limiting and dispatch.
pub use qualys_kernel as kernel;

/// Tracing setup.
pub use qualys_telemetry as telemetry;

/// Operation definitions and argument binding.
pub use qualys_tools as tools;
