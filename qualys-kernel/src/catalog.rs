//! Operation handlers and the catalog that pairs them with their definitions.

use std::fmt;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use qualys_adapters::{
    FormBody, RAW_FIELD, WireRequest, WireResponse, bool_token, is_raw, normalize,
};
use qualys_config::DaysBoundary;
use qualys_tools::{Arguments, OperationDefinition, ParamKind, ToolError, ToolRegistry, ToolResult};
use serde_json::{Value, json};
use tracing::warn;

use crate::classify::DispatchResult;
use crate::operations;

/// Registry type the dispatcher routes through.
pub type Catalog = ToolRegistry<dyn OperationHandler>;

/// Per-call values a handler may need beyond its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    today: NaiveDate,
    days_boundary: DaysBoundary,
}

impl RequestContext {
    /// Creates a context for a call made on `today`.
    #[must_use]
    pub const fn new(today: NaiveDate, days_boundary: DaysBoundary) -> Self {
        Self {
            today,
            days_boundary,
        }
    }

    /// Calendar date of the call.
    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Cutoff date for a filter covering the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] when the date would underflow.
    pub fn days_ago(&self, parameter: &str, days: u64) -> ToolResult<NaiveDate> {
        let offset = u32::try_from(days)
            .map(|days| self.days_boundary.offset(days))
            .map_err(|_| ToolError::invalid_argument(parameter, "too many days"))?;
        self.today
            .checked_sub_days(Days::new(u64::from(offset)))
            .ok_or_else(|| ToolError::invalid_argument(parameter, "too many days"))
    }
}

/// How a response body is turned into a result value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    /// XML, run through the normalizer.
    Markup,
    /// JSON, parsed directly with a raw fallback.
    Json,
    /// Opaque download; only size and content type are reported.
    Binary {
        /// Parameter identifying the downloaded object.
        id_parameter: &'static str,
    },
}

impl ResponseKind {
    /// Converts a successful response into the call result.
    #[must_use]
    pub fn render(self, arguments: &Arguments, response: &WireResponse) -> Value {
        match self {
            Self::Markup => {
                let body = response.text();
                let value = normalize(&body);
                if is_raw(&value, &body) {
                    warn!(bytes = body.len(), "response is not well-formed markup");
                }
                value
            }
            Self::Json => serde_json::from_slice(response.body())
                .unwrap_or_else(|_| json!({ RAW_FIELD: response.text() })),
            Self::Binary { id_parameter } => json!({
                "report_id": arguments.get(id_parameter).map(ToString::to_string),
                "content_type": response.content_type().unwrap_or("application/octet-stream"),
                "size_bytes": response.body().len(),
                "message": "Download completed; content is not included in the result",
            }),
        }
    }
}

/// Builds wire requests for one operation and interprets its responses.
pub trait OperationHandler: Send + Sync {
    /// Parameter names this handler reads from [`Arguments`].
    fn referenced_parameters(&self) -> Vec<(&'static str, Option<ParamKind>)>;

    /// Produces the wire request for already-bound arguments.
    ///
    /// # Errors
    ///
    /// Returns a validation or encoding error when a value cannot be used.
    fn build_request(
        &self,
        arguments: &Arguments,
        context: &RequestContext,
    ) -> DispatchResult<WireRequest>;

    /// Declares how responses are interpreted.
    fn response_kind(&self) -> ResponseKind;

    /// Converts a successful response into the call result.
    fn interpret(&self, arguments: &Arguments, response: &WireResponse) -> Value {
        self.response_kind().render(arguments, response)
    }
}

/// One request field, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    /// Argument copied as-is under `wire`.
    Param {
        name: &'static str,
        wire: &'static str,
    },
    /// Boolean argument sent as `1` / `0`.
    Flag {
        name: &'static str,
        wire: &'static str,
    },
    /// Day count converted into a `YYYY-MM-DD` cutoff.
    DaysAgo {
        name: &'static str,
        wire: &'static str,
    },
}

impl Field {
    const fn name(self) -> &'static str {
        match self {
            Self::Param { name, .. } | Self::Flag { name, .. } | Self::DaysAgo { name, .. } => {
                name
            }
        }
    }

    const fn expected_kind(self) -> Option<ParamKind> {
        match self {
            Self::Param { .. } => None,
            Self::Flag { .. } => Some(ParamKind::Boolean),
            Self::DaysAgo { .. } => Some(ParamKind::Number),
        }
    }
}

/// Declarative handler for form-encoded `fo` endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormOperation {
    path: &'static str,
    fixed: Vec<(&'static str, &'static str)>,
    fields: Vec<Field>,
    response: ResponseKind,
}

impl FormOperation {
    /// Starts a handler posting to `path` with a leading `action` field.
    #[must_use]
    pub fn new(path: &'static str, action: &'static str) -> Self {
        Self {
            path,
            fixed: vec![("action", action)],
            fields: Vec::new(),
            response: ResponseKind::Markup,
        }
    }

    /// Adds a constant field sent on every request.
    #[must_use]
    pub fn fixed(mut self, key: &'static str, value: &'static str) -> Self {
        self.fixed.push((key, value));
        self
    }

    /// Forwards `name` under the same wire key.
    #[must_use]
    pub fn param(self, name: &'static str) -> Self {
        self.param_as(name, name)
    }

    /// Forwards `name` under a different wire key.
    #[must_use]
    pub fn param_as(mut self, name: &'static str, wire: &'static str) -> Self {
        self.fields.push(Field::Param { name, wire });
        self
    }

    /// Forwards several parameters under their own names, in order.
    #[must_use]
    pub fn params(self, names: &[&'static str]) -> Self {
        names.iter().fold(self, |operation, name| operation.param(name))
    }

    /// Forwards a boolean parameter as `1` / `0`.
    #[must_use]
    pub fn flag(mut self, name: &'static str) -> Self {
        self.fields.push(Field::Flag { name, wire: name });
        self
    }

    /// Sends `wire` as the date `name` days before the call date.
    #[must_use]
    pub fn days_ago(mut self, name: &'static str, wire: &'static str) -> Self {
        self.fields.push(Field::DaysAgo { name, wire });
        self
    }

    /// Sets how responses are interpreted.
    #[must_use]
    pub fn responds_with(mut self, response: ResponseKind) -> Self {
        self.response = response;
        self
    }

    /// Returns the target path.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    fn encode(&self, arguments: &Arguments, context: &RequestContext) -> ToolResult<String> {
        let mut body = FormBody::new();
        for (key, value) in &self.fixed {
            body.push(*key, Some(value));
        }

        for field in &self.fields {
            match *field {
                Field::Param { name, wire } => {
                    body.push(wire, arguments.get(name));
                }
                Field::Flag { name, wire } => {
                    body.push(wire, arguments.flag(name).map(bool_token));
                }
                Field::DaysAgo { name, wire } => {
                    let cutoff = match arguments.get(name) {
                        None => None,
                        Some(value) => {
                            let days = value.as_u64().ok_or_else(|| {
                                ToolError::invalid_argument(name, "expected a whole number of days")
                            })?;
                            Some(context.days_ago(name, days)?.format("%Y-%m-%d"))
                        }
                    };
                    body.push(wire, cutoff);
                }
            }
        }
        Ok(body.encode())
    }
}

impl OperationHandler for FormOperation {
    fn referenced_parameters(&self) -> Vec<(&'static str, Option<ParamKind>)> {
        let mut referenced: Vec<_> = self
            .fields
            .iter()
            .map(|field| (field.name(), field.expected_kind()))
            .collect();
        if let ResponseKind::Binary { id_parameter } = self.response {
            referenced.push((id_parameter, None));
        }
        referenced
    }

    fn build_request(
        &self,
        arguments: &Arguments,
        context: &RequestContext,
    ) -> DispatchResult<WireRequest> {
        let body = self.encode(arguments, context)?;
        Ok(WireRequest::new(self.path, body))
    }

    fn response_kind(&self) -> ResponseKind {
        self.response
    }
}

/// A definition paired with the handler that serves it.
pub struct Operation {
    definition: OperationDefinition,
    handler: Arc<dyn OperationHandler>,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.definition.name())
            .finish_non_exhaustive()
    }
}

impl Operation {
    /// Pairs a definition with its handler.
    #[must_use]
    pub fn new(definition: OperationDefinition, handler: impl OperationHandler + 'static) -> Self {
        Self {
            definition,
            handler: Arc::new(handler),
        }
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &OperationDefinition {
        &self.definition
    }

    fn check_references(&self) -> ToolResult<()> {
        for (name, expected) in self.handler.referenced_parameters() {
            let spec = self.definition.parameter(name).ok_or_else(|| {
                ToolError::invalid_metadata(format!(
                    "tool `{}` reads undeclared parameter `{name}`",
                    self.definition.name()
                ))
            })?;
            if let Some(kind) = expected {
                if spec.kind() != kind {
                    return Err(ToolError::invalid_metadata(format!(
                        "tool `{}` expects `{name}` to be a {kind}, declared as {}",
                        self.definition.name(),
                        spec.kind()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Registers `operations` in order after checking every handler only reads
/// declared parameters of the right type.
///
/// # Errors
///
/// Returns [`ToolError::InvalidMetadata`] or [`ToolError::DuplicateTool`].
pub fn build_catalog<I>(operations: I) -> ToolResult<Catalog>
where
    I: IntoIterator<Item = Operation>,
{
    let mut catalog = Catalog::new();
    for operation in operations {
        operation.check_references()?;
        let Operation {
            definition,
            handler,
        } = operation;
        catalog.register(definition, handler)?;
    }
    Ok(catalog)
}

/// Builds the full Qualys catalog.
///
/// # Errors
///
/// Only fails if the built-in tables are inconsistent.
pub fn qualys_catalog() -> ToolResult<Catalog> {
    build_catalog(operations::all()?)
}
