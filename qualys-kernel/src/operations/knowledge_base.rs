use qualys_tools::{OperationDefinition, ParameterSpec, ToolResult};

use crate::catalog::{FormOperation, Operation};

const VULN_PATH: &str = "/api/2.0/fo/knowledge_base/vuln/";

pub(super) fn operations() -> ToolResult<Vec<Operation>> {
    Ok(vec![get_vulnerability_details()?, search_by_cve()?])
}

fn details() -> ParameterSpec {
    ParameterSpec::string("details", "Amount of vulnerability detail")
        .with_enum(&["Basic", "All", "None"])
        .with_default("All")
}

fn get_vulnerability_details() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "get_vulnerability_details",
        "Look up KnowledgeBase entries by QID",
    )?
    .with_parameter(ParameterSpec::string("ids", "Comma-separated QIDs or ranges"))
    .with_parameter(details())
    .require(&["ids"]);

    let handler = FormOperation::new(VULN_PATH, "list").params(&["ids", "details"]);
    Ok(Operation::new(definition, handler))
}

fn search_by_cve() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "search_vulnerabilities_by_cve",
        "Find KnowledgeBase entries referencing a CVE",
    )?
    .with_parameter(ParameterSpec::string("cve", "CVE identifier, e.g. CVE-2021-44228"))
    .with_parameter(details())
    .require(&["cve"]);

    let handler = FormOperation::new(VULN_PATH, "list").params(&["cve", "details"]);
    Ok(Operation::new(definition, handler))
}
