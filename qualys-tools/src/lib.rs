//! Tool discovery metadata and argument binding.
//!
//! An [`OperationDefinition`] describes one callable tool: its name, a
//! description, and the ordered [`ParameterSpec`]s it accepts. Definitions are
//! collected in a [`ToolRegistry`] alongside the handler that serves them, so
//! the discovery listing and the dispatch table come from the same entries.

#![warn(missing_docs, clippy::pedantic)]

pub mod arguments;
pub mod registry;
pub mod schema;

pub use arguments::Arguments;
pub use registry::{ToolError, ToolHandle, ToolRegistry, ToolResult};
pub use schema::{OperationDefinition, ParamKind, ParameterSpec, Scalar};
