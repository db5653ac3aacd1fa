use qualys_tools::{OperationDefinition, ParameterSpec, ToolResult};

use crate::catalog::{FormOperation, Operation};

const SCAN_PATH: &str = "/api/2.0/fo/scan/";

const TARGETS: [&str; 4] = ["ip", "asset_group_ids", "asset_groups", "fqdn"];

pub(super) fn operations() -> ToolResult<Vec<Operation>> {
    Ok(vec![
        list_scans()?,
        launch_scan()?,
        get_scan_results()?,
        scan_control("cancel_scan", "cancel", "Cancel a running scan")?,
        scan_control("pause_scan", "pause", "Pause a running scan")?,
        scan_control("resume_scan", "resume", "Resume a paused scan")?,
    ])
}

fn scan_ref(description: &'static str) -> ParameterSpec {
    ParameterSpec::string("scan_ref", description)
}

fn list_scans() -> ToolResult<Operation> {
    let definition = OperationDefinition::new("list_scans", "List vulnerability scans")?
        .with_parameter(scan_ref("Scan reference, e.g. scan/1234567890.12345"))
        .with_parameter(
            ParameterSpec::string("state", "Comma-separated scan states").with_enum(&[
                "Running", "Paused", "Canceled", "Finished", "Error", "Queued", "Loading",
            ]),
        )
        .with_parameter(
            ParameterSpec::string("type", "Scan type").with_enum(&[
                "On-Demand",
                "Scheduled",
                "API",
            ]),
        )
        .with_parameter(ParameterSpec::string(
            "launched_after_datetime",
            "Only scans launched after this UTC datetime",
        ))
        .with_parameter(ParameterSpec::string(
            "launched_before_datetime",
            "Only scans launched before this UTC datetime",
        ))
        .with_parameter(ParameterSpec::boolean("show_ags", "Include target asset groups"));

    let handler = FormOperation::new(SCAN_PATH, "list")
        .params(&[
            "scan_ref",
            "state",
            "type",
            "launched_after_datetime",
            "launched_before_datetime",
        ])
        .flag("show_ags");

    Ok(Operation::new(definition, handler))
}

fn launch_scan() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "launch_scan",
        "Launch a vulnerability scan against IPs, asset groups or FQDNs",
    )?
    .with_parameter(ParameterSpec::string("scan_title", "Title of the scan"))
    .with_parameter(ParameterSpec::string("ip", "Comma-separated target IPs or ranges"))
    .with_parameter(ParameterSpec::string("asset_group_ids", "Comma-separated asset group IDs"))
    .with_parameter(ParameterSpec::string("asset_groups", "Comma-separated asset group titles"))
    .with_parameter(ParameterSpec::string("fqdn", "Comma-separated fully qualified domain names"))
    .with_parameter(ParameterSpec::string("option_id", "Option profile ID"))
    .with_parameter(ParameterSpec::string("option_title", "Option profile title"))
    .with_parameter(ParameterSpec::string("iscanner_name", "Scanner appliance name"))
    .with_parameter(ParameterSpec::number("priority", "Processing priority, 0 to 9"))
    .require(&["scan_title"])
    .require_one_of(&TARGETS);

    let handler = FormOperation::new(SCAN_PATH, "launch")
        .params(&["scan_title"])
        .params(&TARGETS)
        .params(&["option_id", "option_title", "iscanner_name", "priority"]);

    Ok(Operation::new(definition, handler))
}

fn get_scan_results() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "get_scan_results",
        "Fetch the results of a finished scan",
    )?
    .with_parameter(scan_ref("Scan reference to fetch"))
    .with_parameter(
        ParameterSpec::string("output_format", "Result format")
            .with_enum(&["csv", "json", "csv_extended", "json_extended"])
            .with_default("json_extended"),
    )
    .with_parameter(
        ParameterSpec::string("mode", "Amount of detail").with_enum(&["brief", "extended"]),
    )
    .require(&["scan_ref"]);

    let handler =
        FormOperation::new(SCAN_PATH, "fetch").params(&["scan_ref", "output_format", "mode"]);

    Ok(Operation::new(definition, handler))
}

fn scan_control(
    name: &'static str,
    action: &'static str,
    description: &'static str,
) -> ToolResult<Operation> {
    let definition = OperationDefinition::new(name, description)?
        .with_parameter(scan_ref("Scan reference"))
        .require(&["scan_ref"]);
    let handler = FormOperation::new(SCAN_PATH, action).param("scan_ref");
    Ok(Operation::new(definition, handler))
}
