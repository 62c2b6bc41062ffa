//! Apply and refresh output formatters

use std::collections::BTreeMap;

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::{attribute_rows, print_json};
use crate::cli::OutputFormat;
use crate::diagnostics::Diagnostics;
use crate::migration::{StackMigrationData, StackMigrationResource};

/// Serializable apply result for JSON output
#[derive(Serialize)]
struct SerializableApply<'a> {
    state: &'a StackMigrationResource,
    migrations: &'a BTreeMap<String, StackMigrationData>,
    diagnostics: &'a Diagnostics,
}

/// Flattened per-workspace row
#[derive(Debug, Clone, PartialEq, Eq)]
struct MigrationRow {
    workspace: String,
    deployment: String,
    workspace_id: String,
    group_id: String,
    status: String,
    failure: String,
}

impl MigrationRow {
    fn new(workspace: &str, data: &StackMigrationData) -> Self {
        let status = if data.failed() {
            "failed".to_string()
        } else if data.deployment_group.status.is_empty() {
            "-".to_string()
        } else {
            data.deployment_group.status.clone()
        };
        Self {
            workspace: workspace.to_string(),
            deployment: data.deployment_name.clone(),
            workspace_id: data.workspace_id.clone(),
            group_id: data.deployment_group.id.clone(),
            status,
            failure: data.failure_reason.clone().unwrap_or_default(),
        }
    }
}

/// Output the result of an apply
pub fn output_applied(
    state: &StackMigrationResource,
    migrations: &BTreeMap<String, StackMigrationData>,
    diagnostics: &Diagnostics,
    format: &OutputFormat,
) {
    match format {
        OutputFormat::Table => {
            if !migrations.is_empty() {
                output_migrations_table(migrations);
                println!();
            }
            output_state_table(state);
        }
        OutputFormat::Json => print_json(&SerializableApply {
            state,
            migrations,
            diagnostics,
        }),
    }
}

/// Output persisted attributes
pub fn output_state(state: &StackMigrationResource, format: &OutputFormat) {
    match format {
        OutputFormat::Table => output_state_table(state),
        OutputFormat::Json => print_json(state),
    }
}

fn output_migrations_table(migrations: &BTreeMap<String, StackMigrationData>) {
    let mut table = Table::new();
    table.load_preset(NOTHING).set_header(vec![
        "Workspace",
        "Deployment",
        "Workspace ID",
        "Deployment Group",
        "Status",
        "Failure",
    ]);

    for (workspace, data) in migrations {
        let row = MigrationRow::new(workspace, data);
        table.add_row(vec![
            &row.workspace,
            &row.deployment,
            &row.workspace_id,
            &row.group_id,
            &row.status,
            &row.failure,
        ]);
    }

    println!("{}", table);
}

fn output_state_table(state: &StackMigrationResource) {
    let mut table = Table::new();
    table.load_preset(NOTHING).set_header(vec!["Attribute", "Value"]);
    for (name, value) in attribute_rows(state) {
        table.add_row(vec![name, &value]);
    }
    println!("{}", table);
}
