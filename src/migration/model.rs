//! Declarative resource model, planned changes and per-workspace results

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::diagnostics::Diagnostics;

/// Text shown for values that are only known after apply
pub const UNKNOWN_DISPLAY: &str = "(known after apply)";

/// Three-valued optional attribute
///
/// `Unknown` only appears in plans; it serializes as `null` and is never
/// written to persisted state (see [`StackMigrationResource::has_unknowns`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Attr<T> {
    #[default]
    Missing,
    Unknown,
    Present(T),
}

impl<T> Attr<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Attr::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Attr::Present(_))
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Attr::Missing, Attr::Present)
    }
}

impl<T: fmt::Display> fmt::Display for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Missing => write!(f, "null"),
            Attr::Unknown => write!(f, "{}", UNKNOWN_DISPLAY),
            Attr::Present(v) => write!(f, "{}", v),
        }
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Present(v) => v.serialize(serializer),
            Attr::Missing | Attr::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

/// Declarative desired state of one stack migration
///
/// Field order is the persisted JSON key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMigrationResource {
    pub config_file_dir: PathBuf,
    pub terraform_config_dir: PathBuf,
    pub name: String,
    pub organization: String,
    pub project: String,
    pub workspace_deployment_mapping: BTreeMap<String, String>,

    #[serde(default)]
    pub current_configuration_id: Attr<String>,
    #[serde(default)]
    pub current_configuration_status: Attr<String>,
    #[serde(default)]
    pub source_bundle_hash: Attr<String>,
    #[serde(default)]
    pub terraform_config_hash: Attr<String>,
    #[serde(default)]
    pub migration_hash: Attr<String>,
}

impl StackMigrationResource {
    /// A resource with only user-supplied attributes set
    pub fn new(
        config_file_dir: PathBuf,
        terraform_config_dir: PathBuf,
        name: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
        workspace_deployment_mapping: BTreeMap<String, String>,
    ) -> Self {
        Self {
            config_file_dir,
            terraform_config_dir,
            name: name.into(),
            organization: organization.into(),
            project: project.into(),
            workspace_deployment_mapping,
            current_configuration_id: Attr::Missing,
            current_configuration_status: Attr::Missing,
            source_bundle_hash: Attr::Missing,
            terraform_config_hash: Attr::Missing,
            migration_hash: Attr::Missing,
        }
    }

    /// Copy of `self` with the user-supplied attributes of `desired`
    pub fn with_user_attributes(&self, desired: &StackMigrationResource) -> Self {
        Self {
            config_file_dir: desired.config_file_dir.clone(),
            terraform_config_dir: desired.terraform_config_dir.clone(),
            name: desired.name.clone(),
            organization: desired.organization.clone(),
            project: desired.project.clone(),
            workspace_deployment_mapping: desired.workspace_deployment_mapping.clone(),
            ..self.clone()
        }
    }

    /// Mark every computed attribute unknown
    pub fn with_unknown_computed(mut self) -> Self {
        self.current_configuration_id = Attr::Unknown;
        self.current_configuration_status = Attr::Unknown;
        self.source_bundle_hash = Attr::Unknown;
        self.terraform_config_hash = Attr::Unknown;
        self.migration_hash = Attr::Unknown;
        self
    }

    pub fn has_unknowns(&self) -> bool {
        self.current_configuration_id.is_unknown()
            || self.current_configuration_status.is_unknown()
            || self.source_bundle_hash.is_unknown()
            || self.terraform_config_hash.is_unknown()
            || self.migration_hash.is_unknown()
    }

    /// Target description used in messages (`org/project/stack`)
    pub fn target(&self) -> String {
        format!("{}/{}/{}", self.organization, self.project, self.name)
    }
}

/// Deployment group id and status recorded for a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentGroupSnapshot {
    pub id: String,
    pub status: String,
}

/// Outcome of migrating one workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackMigrationData {
    pub deployment_name: String,
    pub workspace_id: String,
    pub deployment_group: DeploymentGroupSnapshot,
    pub warnings: Vec<String>,
    pub failure_reason: Option<String>,
}

impl StackMigrationData {
    pub fn new(deployment_name: impl Into<String>) -> Self {
        Self {
            deployment_name: deployment_name.into(),
            ..Self::default()
        }
    }

    pub fn failed(&self) -> bool {
        self.failure_reason.is_some()
    }
}

/// How `Update` reconciles an existing migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStrategy {
    /// An identity attribute changed; the migration must be recreated
    RequiresReplace,
    /// Upload the configuration again and migrate every workspace
    ApplyNewConfiguration,
    /// Keep the configuration, rerun failed or abandoned deployment groups
    RetryFailedDeployments,
    /// Nothing to do
    NoAction,
    /// A rollout is still running; apply is refused
    WaitForCompletion(String),
}

impl UpdateStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateStrategy::RequiresReplace => "RequiresReplace",
            UpdateStrategy::ApplyNewConfiguration => "ApplyNewConfiguration",
            UpdateStrategy::RetryFailedDeployments => "RetryFailedDeployments",
            UpdateStrategy::NoAction => "NoAction",
            UpdateStrategy::WaitForCompletion(_) => "WaitForCompletion",
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::WaitForCompletion(reason) => {
                write!(f, "{} ({})", self.label(), reason)
            }
            other => f.write_str(other.label()),
        }
    }
}

/// What the next apply will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// No prior state; the migration is created
    Create,
    /// Prior state exists; `Update` runs the strategy
    Update(UpdateStrategy),
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Create => write!(f, "Create"),
            PlannedAction::Update(strategy) => write!(f, "Update: {}", strategy),
        }
    }
}

/// Result of `ModifyPlan`: planned attribute values plus the chosen action
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub resource: StackMigrationResource,
    pub action: PlannedAction,
    pub diagnostics: Diagnostics,
}

impl PlannedChange {
    pub fn strategy(&self) -> Option<&UpdateStrategy> {
        match &self.action {
            PlannedAction::Update(strategy) => Some(strategy),
            PlannedAction::Create => None,
        }
    }
}

/// Result of `Create` or `Update`
#[derive(Debug, Clone)]
pub struct Applied {
    pub state: StackMigrationResource,
    /// Per-workspace outcomes of this apply (empty when no driver ran)
    pub migrations: BTreeMap<String, StackMigrationData>,
    pub diagnostics: Diagnostics,
}

/// Result of `Read`
#[derive(Debug, Clone)]
pub enum Refreshed {
    Present {
        state: StackMigrationResource,
        diagnostics: Diagnostics,
    },
    /// The remote stack no longer exists; the state should be removed
    Gone,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StackMigrationResource {
        StackMigrationResource::new(
            PathBuf::from("/work/stack"),
            PathBuf::from("/work/terraform"),
            "net-stack",
            "acme",
            "migrations",
            BTreeMap::from([("ws_a".to_string(), "dep_a".to_string())]),
        )
    }

    #[test]
    fn test_attr_serializes_unknown_as_null() {
        let json = serde_json::to_value(Attr::<String>::Unknown).unwrap();
        assert!(json.is_null());
        let json = serde_json::to_value(Attr::Present("x".to_string())).unwrap();
        assert_eq!(json, "x");
    }

    #[test]
    fn test_attr_deserializes_null_as_missing() {
        let attr: Attr<String> = serde_json::from_str("null").unwrap();
        assert_eq!(attr, Attr::Missing);
        let attr: Attr<String> = serde_json::from_str("\"stc-1\"").unwrap();
        assert_eq!(attr, Attr::Present("stc-1".to_string()));
    }

    #[test]
    fn test_attr_display() {
        assert_eq!(Attr::<String>::Unknown.to_string(), UNKNOWN_DISPLAY);
        assert_eq!(Attr::<String>::Missing.to_string(), "null");
        assert_eq!(Attr::Present("abc".to_string()).to_string(), "abc");
    }

    #[test]
    fn test_resource_persisted_key_order() {
        let mut resource = sample();
        resource.migration_hash = Attr::Present("h".to_string());
        let json = serde_json::to_string(&resource).unwrap();

        let order = [
            "config_file_dir",
            "terraform_config_dir",
            "\"name\"",
            "organization",
            "\"project\"",
            "workspace_deployment_mapping",
            "current_configuration_id",
            "current_configuration_status",
            "source_bundle_hash",
            "terraform_config_hash",
            "migration_hash",
        ];
        let positions: Vec<usize> = order.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
    }

    #[test]
    fn test_resource_missing_computed_fields_default() {
        let resource: StackMigrationResource = serde_json::from_value(serde_json::json!({
            "config_file_dir": "/a",
            "terraform_config_dir": "/b",
            "name": "s",
            "organization": "o",
            "project": "p",
            "workspace_deployment_mapping": { "w": "d" }
        }))
        .unwrap();
        assert_eq!(resource.migration_hash, Attr::Missing);
        assert!(!resource.has_unknowns());
    }

    #[test]
    fn test_with_unknown_computed() {
        let planned = sample().with_unknown_computed();
        assert!(planned.has_unknowns());
        assert_eq!(planned.name, "net-stack");
    }

    #[test]
    fn test_with_user_attributes_keeps_computed() {
        let mut state = sample();
        state.current_configuration_id = Attr::Present("stc-1".to_string());
        let mut desired = sample();
        desired
            .workspace_deployment_mapping
            .insert("ws_b".to_string(), "dep_b".to_string());

        let merged = state.with_user_attributes(&desired);
        assert_eq!(merged.workspace_deployment_mapping.len(), 2);
        assert_eq!(
            merged.current_configuration_id,
            Attr::Present("stc-1".to_string())
        );
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(UpdateStrategy::NoAction.to_string(), "NoAction");
        assert_eq!(
            UpdateStrategy::WaitForCompletion("configuration stc-1 is preparing".to_string())
                .to_string(),
            "WaitForCompletion (configuration stc-1 is preparing)"
        );
        assert_eq!(
            PlannedAction::Update(UpdateStrategy::RetryFailedDeployments).to_string(),
            "Update: RetryFailedDeployments"
        );
    }
}
