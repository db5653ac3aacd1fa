//! Per-area operation tables.
//!
//! Each area module returns its operations in the order they are listed to
//! callers; [`all`] concatenates the areas.

mod hosts;
mod inventory;
mod knowledge_base;
mod reports;
mod scans;
mod tags;

use qualys_tools::ToolResult;

use crate::catalog::Operation;

pub use tags::{TAG_SEARCH_PATH, TagSearch};

/// Every Qualys operation, in listing order.
///
/// # Errors
///
/// Fails only when a built-in definition is malformed.
pub fn all() -> ToolResult<Vec<Operation>> {
    let mut operations = Vec::new();
    operations.extend(hosts::operations()?);
    operations.extend(scans::operations()?);
    operations.extend(reports::operations()?);
    operations.extend(inventory::asset_group_operations()?);
    operations.extend(knowledge_base::operations()?);
    operations.extend(inventory::platform_operations()?);
    operations.extend(tags::operations()?);
    operations.extend(inventory::activity_operations()?);
    Ok(operations)
}
