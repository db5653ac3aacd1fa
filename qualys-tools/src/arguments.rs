//! Binding raw call arguments against an [`OperationDefinition`].

use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::registry::{ToolError, ToolResult};
use crate::schema::{OperationDefinition, ParamKind, ParameterSpec, Scalar};

/// Arguments that passed binding: typed, defaulted, and restricted to the
/// parameters the operation declares.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<&'static str, Scalar>,
}

impl Arguments {
    /// Returns the bound value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// Returns the bound boolean value for `name`.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Scalar::as_bool)
    }

    /// Returns `true` when `name` has a bound value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl OperationDefinition {
    /// Coerces `arguments` against the declared parameters.
    ///
    /// `null`, missing and empty-string values count as absent. Undeclared
    /// keys are ignored. Defaults fill absent parameters before the required
    /// and at-least-one-of checks run.
    ///
    /// # Errors
    ///
    /// - [`ToolError::InvalidArguments`] when `arguments` is not an object.
    /// - [`ToolError::InvalidArgument`] when a value cannot be coerced.
    /// - [`ToolError::MissingArgument`] / [`ToolError::MissingOneOf`] when a
    ///   requirement is unmet.
    pub fn bind(&self, arguments: &Value) -> ToolResult<Arguments> {
        let empty = Map::new();
        let supplied = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ToolError::InvalidArguments {
                    reason: format!("expected an object, got {}", json_type(other)),
                });
            }
        };

        let mut values = HashMap::with_capacity(self.parameters().len());
        for spec in self.parameters() {
            let bound = match supplied.get(spec.name()) {
                Some(raw) => coerce(spec, raw)?,
                None => None,
            };
            if let Some(value) = bound.or_else(|| spec.default_value().cloned()) {
                values.insert(spec.name(), value);
            }
        }

        for name in self.required() {
            if !values.contains_key(name) {
                return Err(ToolError::missing_argument(*name));
            }
        }

        for group in self.at_least_one_of() {
            if !group.iter().any(|name| values.contains_key(name)) {
                return Err(ToolError::MissingOneOf {
                    names: group.iter().map(|name| (*name).to_owned()).collect(),
                });
            }
        }

        trace!(tool = self.name(), bound = values.len(), "arguments bound");
        Ok(Arguments { values })
    }
}

fn coerce(spec: &ParameterSpec, raw: &Value) -> ToolResult<Option<Scalar>> {
    match raw {
        Value::Null => return Ok(None),
        Value::String(text) if text.is_empty() => return Ok(None),
        _ => {}
    }

    let scalar = match (spec.kind(), raw) {
        (ParamKind::String, Value::String(text)) => Scalar::Text(text.clone()),
        (ParamKind::String, Value::Number(number)) => Scalar::Text(integral(number).to_string()),
        (ParamKind::String, Value::Bool(flag)) => Scalar::Text(flag.to_string()),

        (ParamKind::Number, Value::Number(number)) => Scalar::Number(integral(number)),
        (ParamKind::Number, Value::String(text)) => {
            Scalar::Number(parse_number(text).ok_or_else(|| {
                ToolError::invalid_argument(spec.name(), format!("`{text}` is not a number"))
            })?)
        }

        (ParamKind::Boolean, Value::Bool(flag)) => Scalar::Bool(*flag),
        (ParamKind::Boolean, Value::String(text)) => {
            Scalar::Bool(parse_flag(text).ok_or_else(|| {
                ToolError::invalid_argument(spec.name(), format!("`{text}` is not a boolean"))
            })?)
        }
        (ParamKind::Boolean, Value::Number(number)) => match number.as_u64() {
            Some(0) => Scalar::Bool(false),
            Some(1) => Scalar::Bool(true),
            _ => {
                return Err(ToolError::invalid_argument(
                    spec.name(),
                    format!("`{number}` is not a boolean"),
                ));
            }
        },

        (kind, other) => {
            return Err(ToolError::invalid_argument(
                spec.name(),
                format!("expected a {kind}, got {}", json_type(other)),
            ));
        }
    };
    Ok(Some(scalar))
}

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if let Ok(integer) = trimmed.parse::<u64>() {
        return Some(Number::from(integer));
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(Number::from(integer));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(|number| integral(&number))
}

/// Largest magnitude below which every integer is exactly representable as `f64`.
const EXACT_FLOAT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Folds whole-valued floats (`100.0`, `1e2`) into integers so they render
/// without a fractional part.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral(number: &Number) -> Number {
    match number.as_f64() {
        Some(float)
            if number.is_f64() && float.fract() == 0.0 && float.abs() < EXACT_FLOAT_LIMIT =>
        {
            Number::from(float as i64)
        }
        _ => number.clone(),
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
