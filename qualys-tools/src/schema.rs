//! Parameter and operation metadata.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value, json};

use crate::registry::{ToolError, ToolResult};

/// Primitive type accepted by a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Free-form text.
    String,
    /// Integer or decimal number.
    Number,
    /// `true` / `false`.
    Boolean,
}

impl ParamKind {
    /// JSON-schema type keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bound argument value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Text value.
    Text(String),
    /// Numeric value, kept in its JSON representation.
    Number(Number),
    /// Boolean value.
    Bool(bool),
}

impl Scalar {
    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the value as a non-negative integer when it is one.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(number) => number.as_u64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Number(Number::from(value))
    }
}

/// Declares one parameter an operation accepts.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSpec {
    name: &'static str,
    kind: ParamKind,
    description: &'static str,
    enum_values: Vec<&'static str>,
    default: Option<Scalar>,
}

impl ParameterSpec {
    fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            enum_values: Vec::new(),
            default: None,
        }
    }

    /// Declares a text parameter.
    #[must_use]
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    /// Declares a numeric parameter.
    #[must_use]
    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    /// Declares a boolean parameter.
    #[must_use]
    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    /// Advertises the accepted values. They are listed in the schema but not
    /// enforced when binding.
    #[must_use]
    pub fn with_enum(mut self, values: &[&'static str]) -> Self {
        self.enum_values = values.to_vec();
        self
    }

    /// Value bound when the caller omits the parameter.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Scalar>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parameter type.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the advertised enumeration, empty when unconstrained.
    #[must_use]
    pub fn enum_values(&self) -> &[&'static str] {
        &self.enum_values
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Scalar> {
        self.default.as_ref()
    }

    fn schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".into(), json!(self.kind.as_str()));
        property.insert("description".into(), json!(self.description));
        if !self.enum_values.is_empty() {
            property.insert("enum".into(), json!(self.enum_values));
        }
        if let Some(default) = &self.default {
            property.insert("default".into(), json!(default));
        }
        Value::Object(property)
    }
}

/// Everything the protocol layer needs to advertise one tool.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationDefinition {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    required: Vec<&'static str>,
    at_least_one_of: Vec<Vec<&'static str>>,
}

impl OperationDefinition {
    /// Creates a definition with no parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if either field is empty.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> ToolResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::invalid_metadata("tool name cannot be empty"));
        }

        let description = description.into();
        if description.trim().is_empty() {
            return Err(ToolError::invalid_metadata(format!(
                "tool `{name}` needs a description"
            )));
        }

        Ok(Self {
            name,
            description,
            parameters: Vec::new(),
            required: Vec::new(),
            at_least_one_of: Vec::new(),
        })
    }

    /// Appends a parameter. Order is preserved in the published schema.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Marks parameters as required.
    #[must_use]
    pub fn require(mut self, names: &[&'static str]) -> Self {
        self.required.extend_from_slice(names);
        self
    }

    /// Requires that at least one parameter of the group is supplied.
    #[must_use]
    pub fn require_one_of(mut self, names: &[&'static str]) -> Self {
        self.at_least_one_of.push(names.to_vec());
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Returns the names of required parameters.
    #[must_use]
    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    /// Returns the "at least one of" groups.
    #[must_use]
    pub fn at_least_one_of(&self) -> &[Vec<&'static str>] {
        &self.at_least_one_of
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }

    /// Returns `true` when `name` is a declared parameter.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Checks that parameter names are unique and that every required or
    /// grouped name is declared.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] describing the first problem.
    pub fn validate(&self) -> ToolResult<()> {
        let mut seen = HashSet::new();
        for spec in &self.parameters {
            if !seen.insert(spec.name) {
                return Err(ToolError::invalid_metadata(format!(
                    "tool `{}` declares parameter `{}` twice",
                    self.name, spec.name
                )));
            }
        }

        let referenced = self
            .required
            .iter()
            .chain(self.at_least_one_of.iter().flatten());
        for name in referenced {
            if !self.declares(name) {
                return Err(ToolError::invalid_metadata(format!(
                    "tool `{}` requires undeclared parameter `{name}`",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Renders the JSON-schema object describing the arguments.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|spec| (spec.name.to_owned(), spec.schema()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !self.required.is_empty() {
            schema.insert("required".into(), json!(self.required));
        }
        Value::Object(schema)
    }
}
