//! Resource type name and attribute table

use serde_json::Value;

use super::model::StackMigrationResource;

/// Resource type name reported by `Metadata`
pub const RESOURCE_TYPE_NAME: &str = "tfmigrate_stack_migration";

/// Value kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Map,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Map => "map(string)",
        }
    }
}

/// Schema entry of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
    pub computed: bool,
    /// A change forces the migration to be recreated
    pub requires_replace: bool,
    pub description: &'static str,
}

const fn required(
    name: &'static str,
    kind: AttributeKind,
    requires_replace: bool,
    description: &'static str,
) -> AttributeSchema {
    AttributeSchema {
        name,
        kind,
        required: true,
        computed: false,
        requires_replace,
        description,
    }
}

const fn computed(name: &'static str, description: &'static str) -> AttributeSchema {
    AttributeSchema {
        name,
        kind: AttributeKind::String,
        required: false,
        computed: true,
        requires_replace: false,
        description,
    }
}

pub const ATTRIBUTES: &[AttributeSchema] = &[
    required(
        "config_file_dir",
        AttributeKind::String,
        false,
        "Absolute path of the stack configuration (source bundle) directory",
    ),
    required(
        "terraform_config_dir",
        AttributeKind::String,
        false,
        "Absolute path of the Terraform configuration the workspaces were built from",
    ),
    required("name", AttributeKind::String, true, "Name of the target stack"),
    required(
        "organization",
        AttributeKind::String,
        true,
        "Organization that owns the stack",
    ),
    required(
        "project",
        AttributeKind::String,
        true,
        "Project that contains the stack",
    ),
    required(
        "workspace_deployment_mapping",
        AttributeKind::Map,
        false,
        "Workspace name to stack deployment name",
    ),
    computed(
        "current_configuration_id",
        "ID of the latest stack configuration",
    ),
    computed(
        "current_configuration_status",
        "Status of the latest stack configuration",
    ),
    computed(
        "source_bundle_hash",
        "Fingerprint of config_file_dir at the last upload",
    ),
    computed(
        "terraform_config_hash",
        "Fingerprint of terraform_config_dir at the last apply",
    ),
    computed(
        "migration_hash",
        "Fingerprint of the per-workspace deployment outcome",
    ),
];

/// Look up an attribute by name
pub fn attribute(name: &str) -> Option<&'static AttributeSchema> {
    ATTRIBUTES.iter().find(|a| a.name == name)
}

/// Names of requires-replace attributes whose values differ between state and plan
pub fn replace_triggers(
    state: &StackMigrationResource,
    plan: &StackMigrationResource,
) -> Vec<&'static str> {
    let (Ok(Value::Object(before)), Ok(Value::Object(after))) =
        (serde_json::to_value(state), serde_json::to_value(plan))
    else {
        return Vec::new();
    };

    ATTRIBUTES
        .iter()
        .filter(|a| a.requires_replace)
        .filter(|a| before.get(a.name) != after.get(a.name))
        .map(|a| a.name)
        .collect()
}
