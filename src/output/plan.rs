//! Plan output formatter

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::{attribute_rows, print_json};
use crate::cli::OutputFormat;
use crate::diagnostics::Diagnostics;
use crate::migration::{PlannedChange, StackMigrationResource};

/// Serializable plan for JSON output
#[derive(Serialize)]
struct SerializablePlan<'a> {
    resource_type: &'a str,
    action: String,
    prior: Option<&'a StackMigrationResource>,
    planned: &'a StackMigrationResource,
    /// Attributes only known after apply (serialized as null in `planned`)
    unknown: Vec<&'static str>,
    diagnostics: &'a Diagnostics,
}

/// Output a planned change in the specified format
pub fn output_plan(
    resource_type: &str,
    change: &PlannedChange,
    prior: Option<&StackMigrationResource>,
    format: &OutputFormat,
) {
    match format {
        OutputFormat::Table => output_table(resource_type, change, prior),
        OutputFormat::Json => print_json(&SerializablePlan {
            resource_type,
            action: change.action.to_string(),
            prior,
            planned: &change.resource,
            unknown: unknown_attributes(&change.resource),
            diagnostics: &change.diagnostics,
        }),
    }
}

fn unknown_attributes(resource: &StackMigrationResource) -> Vec<&'static str> {
    [
        ("current_configuration_id", &resource.current_configuration_id),
        (
            "current_configuration_status",
            &resource.current_configuration_status,
        ),
        ("source_bundle_hash", &resource.source_bundle_hash),
        ("terraform_config_hash", &resource.terraform_config_hash),
        ("migration_hash", &resource.migration_hash),
    ]
    .into_iter()
    .filter(|(_, attr)| attr.is_unknown())
    .map(|(name, _)| name)
    .collect()
}

fn output_table(
    resource_type: &str,
    change: &PlannedChange,
    prior: Option<&StackMigrationResource>,
) {
    println!(
        "{}.{}: {}\n",
        resource_type, change.resource.name, change.action
    );

    let prior_rows = prior.map(attribute_rows);
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_header(vec!["", "Attribute", "Current", "Planned"]);

    for (i, (name, planned)) in attribute_rows(&change.resource).into_iter().enumerate() {
        let current = prior_rows
            .as_ref()
            .and_then(|rows| rows.get(i))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| "-".to_string());
        let marker = if current != planned { "~" } else { "" };
        table.add_row(vec![marker, name, &current, &planned]);
    }

    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{Attr, PlannedAction, UpdateStrategy};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn change() -> PlannedChange {
        let mut resource = StackMigrationResource::new(
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            "s",
            "o",
            "p",
            BTreeMap::from([("ws".to_string(), "dep".to_string())]),
        );
        resource.current_configuration_id = Attr::Unknown;
        resource.migration_hash = Attr::Unknown;
        resource.source_bundle_hash = Attr::Present("abc".to_string());
        PlannedChange {
            resource,
            action: PlannedAction::Update(UpdateStrategy::ApplyNewConfiguration),
            diagnostics: Diagnostics::new(),
        }
    }

    #[test]
    fn test_unknown_attributes() {
        assert_eq!(
            unknown_attributes(&change().resource),
            vec!["current_configuration_id", "migration_hash"]
        );
    }

    #[test]
    fn test_serializable_plan() {
        let change = change();
        let plan = SerializablePlan {
            resource_type: "tfmigrate_stack_migration",
            action: change.action.to_string(),
            prior: None,
            planned: &change.resource,
            unknown: unknown_attributes(&change.resource),
            diagnostics: &change.diagnostics,
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["action"], "Update: ApplyNewConfiguration");
        assert!(json["planned"]["current_configuration_id"].is_null());
        assert_eq!(json["planned"]["source_bundle_hash"], "abc");
        assert!(json["prior"].is_null());
    }

    #[test]
    fn test_output_plan_table_does_not_panic() {
        let change = change();
        output_plan("tfmigrate_stack_migration", &change, None, &OutputFormat::Table);
    }
}
