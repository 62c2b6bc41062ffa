//! Deployment data models

use std::fmt;

use serde::Deserialize;

use crate::hcp::models::RelationshipData;

/// Deployment group data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentGroup {
    pub id: String,
    pub attributes: DeploymentGroupAttributes,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentGroupAttributes {
    #[serde(default)]
    pub name: String,
    pub status: DeploymentGroupStatus,
}

impl DeploymentGroup {
    pub fn status(&self) -> DeploymentGroupStatus {
        self.attributes.status
    }
}

/// Rollout status of a deployment group
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentGroupStatus {
    Pending,
    Deploying,
    Succeeded,
    Failed,
    Abandoned,
    #[serde(other)]
    Unknown,
}

impl DeploymentGroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentGroupStatus::Pending => "pending",
            DeploymentGroupStatus::Deploying => "deploying",
            DeploymentGroupStatus::Succeeded => "succeeded",
            DeploymentGroupStatus::Failed => "failed",
            DeploymentGroupStatus::Abandoned => "abandoned",
            DeploymentGroupStatus::Unknown => "unknown",
        }
    }

    /// Pending and Deploying groups are still rolling out
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            DeploymentGroupStatus::Pending | DeploymentGroupStatus::Deploying
        )
    }

    /// Failed or Abandoned
    pub fn is_unsuccessful(&self) -> bool {
        matches!(
            self,
            DeploymentGroupStatus::Failed | DeploymentGroupStatus::Abandoned
        )
    }
}

impl fmt::Display for DeploymentGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment run data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentRun {
    pub id: String,
    pub attributes: DeploymentRunAttributes,
    #[serde(default)]
    pub relationships: DeploymentRunRelationships,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentRunAttributes {
    #[serde(rename = "deployment-name")]
    pub deployment_name: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DeploymentRunRelationships {
    #[serde(rename = "stack-deployment-group")]
    pub deployment_group: Option<RelationshipData>,

    #[serde(rename = "current-step")]
    pub current_step: Option<RelationshipData>,
}

impl DeploymentRun {
    /// Group this run belongs to
    pub fn group_id(&self) -> Option<&str> {
        self.relationships
            .deployment_group
            .as_ref()
            .and_then(|g| g.id())
    }

    pub fn current_step_id(&self) -> Option<&str> {
        self.relationships.current_step.as_ref().and_then(|s| s.id())
    }
}

/// Deployment run step data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentStep {
    pub id: String,
    pub attributes: DeploymentStepAttributes,
    #[serde(default)]
    pub links: DeploymentStepLinks,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeploymentStepAttributes {
    #[serde(rename = "operation-type")]
    pub operation_type: StepOperation,
    pub status: StepStatus,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DeploymentStepLinks {
    #[serde(rename = "upload-url")]
    pub upload_url: Option<String>,
}

impl DeploymentStep {
    pub fn operation(&self) -> StepOperation {
        self.attributes.operation_type
    }

    pub fn status(&self) -> StepStatus {
        self.attributes.status
    }

    pub fn upload_url(&self) -> Option<&str> {
        self.links.upload_url.as_deref()
    }
}

/// Operation performed by a deployment step
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StepOperation {
    AllowImport,
    ImportState,
    Plan,
    Apply,
    #[serde(other)]
    Other,
}

impl StepOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOperation::AllowImport => "allow-import",
            StepOperation::ImportState => "import-state",
            StepOperation::Plan => "plan",
            StepOperation::Apply => "apply",
            StepOperation::Other => "other",
        }
    }
}

impl fmt::Display for StepOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a deployment step
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[serde(alias = "pending-operator")]
    PendingOperator,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Other,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::PendingOperator => "pending_operator",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Other => "other",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
