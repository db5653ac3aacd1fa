use qualys_adapters::{JSON_CONTENT_TYPE, WireRequest};
use qualys_tools::{Arguments, OperationDefinition, ParamKind, ParameterSpec, ToolError, ToolResult};
use serde_json::{Value, json};

use crate::catalog::{Operation, OperationHandler, RequestContext, ResponseKind};
use crate::classify::{DispatchError, DispatchResult};

/// QPS REST endpoint for tag search.
pub const TAG_SEARCH_PATH: &str = "/qps/rest/2.0/search/am/tag";

const DEFAULT_LIMIT: u64 = 100;

pub(super) fn operations() -> ToolResult<Vec<Operation>> {
    let definition = OperationDefinition::new("list_tags", "Search asset tags by name")?
        .with_parameter(ParameterSpec::string("name", "Substring the tag name must contain"))
        .with_parameter(
            ParameterSpec::number("limit", "Maximum tags to return").with_default(DEFAULT_LIMIT),
        );
    Ok(vec![Operation::new(definition, TagSearch)])
}

/// Tag search: the one operation that posts JSON and reads JSON back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagSearch;

impl TagSearch {
    fn service_request(arguments: &Arguments) -> ToolResult<Value> {
        let limit = match arguments.get("limit") {
            None => DEFAULT_LIMIT,
            Some(value) => value.as_u64().ok_or_else(|| {
                ToolError::invalid_argument("limit", "expected a non-negative whole number")
            })?,
        };

        let mut request = json!({ "preferences": { "limitResults": limit } });
        if let Some(name) = arguments.get("name") {
            request["filters"] = json!({
                "Criteria": [{ "field": "name", "operator": "CONTAINS", "value": name.to_string() }]
            });
        }
        Ok(json!({ "ServiceRequest": request }))
    }
}

impl OperationHandler for TagSearch {
    fn referenced_parameters(&self) -> Vec<(&'static str, Option<ParamKind>)> {
        vec![("name", None), ("limit", Some(ParamKind::Number))]
    }

    fn build_request(
        &self,
        arguments: &Arguments,
        _context: &RequestContext,
    ) -> DispatchResult<WireRequest> {
        let body = serde_json::to_string(&Self::service_request(arguments)?)
            .map_err(|err| DispatchError::Encoding {
                reason: err.to_string(),
            })?;
        Ok(WireRequest::new(TAG_SEARCH_PATH, body)
            .with_content_type(JSON_CONTENT_TYPE)
            .with_accept(JSON_CONTENT_TYPE))
    }

    fn response_kind(&self) -> ResponseKind {
        ResponseKind::Json
    }
}
