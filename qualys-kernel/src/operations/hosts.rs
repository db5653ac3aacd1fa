use qualys_tools::{OperationDefinition, ParameterSpec, ToolResult};

use crate::catalog::{FormOperation, Operation};

const HOST_PATH: &str = "/api/2.0/fo/asset/host/";
const DETECTION_PATH: &str = "/api/2.0/fo/asset/host/vm/detection/";

pub(super) fn operations() -> ToolResult<Vec<Operation>> {
    Ok(vec![list_hosts()?, list_host_detections()?])
}

fn list_hosts() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "list_hosts",
        "List hosts in the subscription, optionally filtered by ID, IP or asset group",
    )?
    .with_parameter(ParameterSpec::string("ids", "Comma-separated host IDs or ranges"))
    .with_parameter(ParameterSpec::string("ips", "Comma-separated IPs or ranges"))
    .with_parameter(ParameterSpec::string("ag_ids", "Comma-separated asset group IDs"))
    .with_parameter(ParameterSpec::string("ag_titles", "Comma-separated asset group titles"))
    .with_parameter(ParameterSpec::string(
        "os_pattern",
        "PCRE matched against the operating system",
    ))
    .with_parameter(
        ParameterSpec::string("details", "Amount of host detail to return")
            .with_enum(&["Basic", "Basic/AGs", "All", "All/AGs", "None"])
            .with_default("Basic"),
    )
    .with_parameter(ParameterSpec::number(
        "vm_scan_days",
        "Only hosts scanned for vulnerabilities within this many days",
    ))
    .with_parameter(ParameterSpec::number("truncation_limit", "Maximum hosts per response"))
    .with_parameter(ParameterSpec::boolean("show_tags", "Include asset tags"));

    let handler = FormOperation::new(HOST_PATH, "list")
        .params(&["ids", "ips", "ag_ids", "ag_titles", "os_pattern", "details"])
        .days_ago("vm_scan_days", "vm_scan_since")
        .param("truncation_limit")
        .flag("show_tags");

    Ok(Operation::new(definition, handler))
}

fn list_host_detections() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "list_host_detections",
        "List vulnerability detections per host, filtered by IP, asset group, QID or severity",
    )?
    .with_parameter(ParameterSpec::string("ips", "Comma-separated IPs or ranges"))
    .with_parameter(ParameterSpec::string("ag_ids", "Comma-separated asset group IDs"))
    .with_parameter(ParameterSpec::string("qids", "Comma-separated QIDs"))
    .with_parameter(ParameterSpec::string("severities", "Comma-separated severities, 1 to 5"))
    .with_parameter(
        ParameterSpec::string("status", "Detection status filter")
            .with_enum(&["New", "Active", "Fixed", "Re-Opened"]),
    )
    .with_parameter(ParameterSpec::string(
        "detection_updated_since",
        "Only detections updated after this UTC datetime",
    ))
    .with_parameter(ParameterSpec::number("truncation_limit", "Maximum hosts per response"))
    .with_parameter(
        ParameterSpec::boolean("show_igs", "Include information-gathered detections")
            .with_default(false),
    )
    .with_parameter(
        ParameterSpec::boolean("show_epss", "Include EPSS scores").with_default(false),
    );

    let handler = FormOperation::new(DETECTION_PATH, "list")
        .params(&[
            "ips",
            "ag_ids",
            "qids",
            "severities",
            "status",
            "detection_updated_since",
            "truncation_limit",
        ])
        .flag("show_igs")
        .flag("show_epss");

    Ok(Operation::new(definition, handler))
}
