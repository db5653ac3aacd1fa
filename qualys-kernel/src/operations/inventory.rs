//! Asset groups, scanner appliances, option profiles and the activity log.

use qualys_tools::{OperationDefinition, ParameterSpec, ToolResult};

use crate::catalog::{FormOperation, Operation};

const ASSET_GROUP_PATH: &str = "/api/2.0/fo/asset/group/";
const APPLIANCE_PATH: &str = "/api/2.0/fo/appliance/";
const OPTION_PROFILE_PATH: &str = "/api/2.0/fo/subscription/option_profile/vm/";
const ACTIVITY_LOG_PATH: &str = "/api/2.0/fo/activity_log/";

pub(super) fn asset_group_operations() -> ToolResult<Vec<Operation>> {
    let definition = OperationDefinition::new("list_asset_groups", "List asset groups")?
        .with_parameter(ParameterSpec::string("ids", "Comma-separated asset group IDs"))
        .with_parameter(ParameterSpec::string("title", "Asset group title"))
        .with_parameter(ParameterSpec::string(
            "show_attributes",
            "Comma-separated attributes to include, or ALL",
        ))
        .with_parameter(ParameterSpec::number("truncation_limit", "Maximum groups per response"));

    let handler = FormOperation::new(ASSET_GROUP_PATH, "list").params(&[
        "ids",
        "title",
        "show_attributes",
        "truncation_limit",
    ]);

    Ok(vec![Operation::new(definition, handler)])
}

pub(super) fn platform_operations() -> ToolResult<Vec<Operation>> {
    let appliances = OperationDefinition::new(
        "list_scanner_appliances",
        "List scanner appliances and their status",
    )?
    .with_parameter(
        ParameterSpec::string("output_mode", "Amount of appliance detail")
            .with_enum(&["brief", "full"]),
    )
    .with_parameter(ParameterSpec::boolean("scan_detail", "Include running scan details"))
    .with_parameter(ParameterSpec::boolean("busy", "Only appliances currently scanning"));
    let appliance_handler = FormOperation::new(APPLIANCE_PATH, "list")
        .param("output_mode")
        .flag("scan_detail")
        .flag("busy");

    let profiles = OperationDefinition::new(
        "list_option_profiles",
        "Export vulnerability scan option profiles",
    )?
    .with_parameter(ParameterSpec::string("option_profile_id", "Option profile ID"))
    .with_parameter(ParameterSpec::string("option_profile_title", "Option profile title"));
    let profile_handler = FormOperation::new(OPTION_PROFILE_PATH, "export")
        .params(&["option_profile_id", "option_profile_title"]);

    Ok(vec![
        Operation::new(appliances, appliance_handler),
        Operation::new(profiles, profile_handler),
    ])
}

pub(super) fn activity_operations() -> ToolResult<Vec<Operation>> {
    let definition = OperationDefinition::new(
        "list_activity_log",
        "List user activity in the subscription",
    )?
    .with_parameter(ParameterSpec::string(
        "since_datetime",
        "Only activity after this UTC datetime",
    ))
    .with_parameter(ParameterSpec::string(
        "until_datetime",
        "Only activity before this UTC datetime",
    ))
    .with_parameter(ParameterSpec::string("user_action", "Action filter, e.g. login"))
    .with_parameter(ParameterSpec::string("action_details", "Free-text filter on action details"))
    .with_parameter(ParameterSpec::string("username", "Only activity by this user"))
    .with_parameter(ParameterSpec::number("truncation_limit", "Maximum records per response"));

    let handler = FormOperation::new(ACTIVITY_LOG_PATH, "list")
        .fixed("output_format", "XML")
        .params(&[
            "since_datetime",
            "until_datetime",
            "user_action",
            "action_details",
            "username",
            "truncation_limit",
        ]);

    Ok(vec![Operation::new(definition, handler)])
}
