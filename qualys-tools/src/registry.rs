//! Ordered registry pairing operation definitions with their handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::schema::OperationDefinition;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// A registered definition and the handler serving it.
pub struct ToolHandle<H: ?Sized> {
    definition: OperationDefinition,
    handler: Arc<H>,
}

impl<H: ?Sized> Clone for ToolHandle<H> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: ?Sized> ToolHandle<H> {
    /// Returns the associated definition.
    #[must_use]
    pub fn definition(&self) -> &OperationDefinition {
        &self.definition
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }
}

/// Registry of tools, preserving registration order for discovery.
///
/// Built once at startup and never mutated afterwards, so lookups take
/// `&self` without locking.
pub struct ToolRegistry<H: ?Sized> {
    entries: Vec<ToolHandle<H>>,
    index: HashMap<String, usize>,
}

impl<H: ?Sized> Default for ToolRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for ToolRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.entries.iter().map(|e| e.definition.name()).collect();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl<H: ?Sized> ToolRegistry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition with its handler.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present, or
    /// [`ToolError::InvalidMetadata`] if the definition is inconsistent.
    pub fn register(&mut self, definition: OperationDefinition, handler: Arc<H>) -> ToolResult<()> {
        definition.validate()?;

        let name = definition.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool { name });
        }

        self.index.insert(name, self.entries.len());
        self.entries.push(ToolHandle {
            definition,
            handler,
        });
        Ok(())
    }

    /// Returns the tool registered under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolHandle<H>> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Lists definitions in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&OperationDefinition> {
        self.entries.iter().map(|entry| &entry.definition).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors produced by tool registration and argument binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Tool metadata failed validation.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// The argument payload was not an object.
    #[error("invalid arguments: {reason}")]
    InvalidArguments {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A single argument could not be coerced to its declared type.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A required argument was absent or empty.
    #[error("{name} is required")]
    MissingArgument {
        /// Parameter name.
        name: String,
    },

    /// None of a group of alternative arguments was supplied.
    #[error("at least one of {} is required", .names.join(", "))]
    MissingOneOf {
        /// Names of the alternatives.
        names: Vec<String>,
    },
}

impl ToolError {
    /// Creates an invalid-metadata error.
    #[must_use]
    pub fn invalid_metadata(reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            reason: reason.into(),
        }
    }

    /// Creates a missing-argument error.
    #[must_use]
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParameterSpec;

    fn definition(name: &str) -> OperationDefinition {
        OperationDefinition::new(name, "Echo incoming payload")
            .unwrap()
            .with_parameter(ParameterSpec::string("message", "Text to echo"))
    }

    #[test]
    fn register_and_lookup_tool() {
        let mut registry: ToolRegistry<str> = ToolRegistry::new();
        registry
            .register(definition("echo"), Arc::from("echo-handler"))
            .unwrap();

        let handle = registry.get("echo").expect("registered");
        assert_eq!(handle.definition().name(), "echo");
        assert_eq!(&**handle.handler(), "echo-handler");
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry: ToolRegistry<str> = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(definition(name), Arc::from(name)).unwrap();
        }

        let names: Vec<_> = registry.list().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut registry: ToolRegistry<str> = ToolRegistry::new();
        registry.register(definition("echo"), Arc::from("a")).unwrap();

        let err = registry
            .register(definition("echo"), Arc::from("b"))
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "echo"));
    }

    #[test]
    fn lookup_is_exact() {
        let mut registry: ToolRegistry<str> = ToolRegistry::new();
        registry.register(definition("echo"), Arc::from("a")).unwrap();

        assert!(registry.get("ECHO").is_none());
        assert!(registry.get("ech").is_none());
    }

    #[test]
    fn inconsistent_definitions_are_refused() {
        let mut registry: ToolRegistry<str> = ToolRegistry::new();
        let err = registry
            .register(definition("echo").require(&["missing"]), Arc::from("a"))
            .expect_err("undeclared requirement");
        assert!(matches!(err, ToolError::InvalidMetadata { .. }));
        assert!(registry.is_empty());
    }
}
