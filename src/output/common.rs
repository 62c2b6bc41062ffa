//! Common utilities for output formatters

use std::collections::BTreeMap;

use serde::Serialize;

use crate::migration::{Attr, StackMigrationResource};

/// Display value of a computed attribute
pub fn attr_cell(attr: &Attr<String>) -> String {
    match attr {
        Attr::Missing => "-".to_string(),
        other => other.to_string(),
    }
}

/// `ws => dep` pairs, one per line
pub fn mapping_cell(mapping: &BTreeMap<String, String>) -> String {
    mapping
        .iter()
        .map(|(ws, dep)| format!("{} => {}", ws, dep))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Attribute name and display value, in schema order
pub fn attribute_rows(resource: &StackMigrationResource) -> Vec<(&'static str, String)> {
    vec![
        (
            "config_file_dir",
            resource.config_file_dir.display().to_string(),
        ),
        (
            "terraform_config_dir",
            resource.terraform_config_dir.display().to_string(),
        ),
        ("name", resource.name.clone()),
        ("organization", resource.organization.clone()),
        ("project", resource.project.clone()),
        (
            "workspace_deployment_mapping",
            mapping_cell(&resource.workspace_deployment_mapping),
        ),
        (
            "current_configuration_id",
            attr_cell(&resource.current_configuration_id),
        ),
        (
            "current_configuration_status",
            attr_cell(&resource.current_configuration_status),
        ),
        ("source_bundle_hash", attr_cell(&resource.source_bundle_hash)),
        (
            "terraform_config_hash",
            attr_cell(&resource.terraform_config_hash),
        ),
        ("migration_hash", attr_cell(&resource.migration_hash)),
    ]
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing to JSON: {}", e),
    }
}
