use qualys_tools::{OperationDefinition, ParameterSpec, ToolResult};

use crate::catalog::{FormOperation, Operation, ResponseKind};

const REPORT_PATH: &str = "/api/2.0/fo/report/";

pub(super) fn operations() -> ToolResult<Vec<Operation>> {
    Ok(vec![list_reports()?, launch_report()?, download_report()?])
}

fn list_reports() -> ToolResult<Operation> {
    let definition = OperationDefinition::new("list_reports", "List generated reports")?
        .with_parameter(ParameterSpec::string("id", "Report ID"))
        .with_parameter(
            ParameterSpec::string("state", "Report state")
                .with_enum(&["Running", "Finished", "Canceled", "Errors"]),
        )
        .with_parameter(ParameterSpec::string("user_login", "Only reports launched by this user"))
        .with_parameter(ParameterSpec::string(
            "expires_before_datetime",
            "Only reports expiring before this UTC datetime",
        ));

    let handler = FormOperation::new(REPORT_PATH, "list").params(&[
        "id",
        "state",
        "user_login",
        "expires_before_datetime",
    ]);

    Ok(Operation::new(definition, handler))
}

fn launch_report() -> ToolResult<Operation> {
    let definition = OperationDefinition::new("launch_report", "Launch a report from a template")?
        .with_parameter(ParameterSpec::string("template_id", "Report template ID"))
        .with_parameter(ParameterSpec::string("report_title", "Title of the report"))
        .with_parameter(
            ParameterSpec::string("output_format", "Report output format")
                .with_enum(&["pdf", "html", "mht", "xml", "csv", "docx"]),
        )
        .with_parameter(
            ParameterSpec::string("report_type", "Report type").with_enum(&[
                "Map",
                "Scan",
                "Patch",
                "Remediation",
                "Compliance",
                "Policy",
                "Scorecard",
            ]),
        )
        .with_parameter(ParameterSpec::string("ips", "Comma-separated IPs to report on"))
        .with_parameter(ParameterSpec::string("asset_group_ids", "Comma-separated asset group IDs"))
        .with_parameter(ParameterSpec::string("report_refs", "Comma-separated scan references"))
        .require(&["template_id", "output_format"]);

    let handler = FormOperation::new(REPORT_PATH, "launch").params(&[
        "template_id",
        "report_title",
        "output_format",
        "report_type",
        "ips",
        "asset_group_ids",
        "report_refs",
    ]);

    Ok(Operation::new(definition, handler))
}

fn download_report() -> ToolResult<Operation> {
    let definition = OperationDefinition::new(
        "download_report",
        "Download a finished report; returns its size and content type",
    )?
    .with_parameter(ParameterSpec::string("id", "Report ID"))
    .require(&["id"]);

    let handler = FormOperation::new(REPORT_PATH, "fetch")
        .param("id")
        .responds_with(ResponseKind::Binary { id_parameter: "id" });

    Ok(Operation::new(definition, handler))
}
