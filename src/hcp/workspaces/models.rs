//! Workspace data models

use serde::Deserialize;

use crate::hcp::models::RelationshipData;
use crate::hcp::traits::TfeResource;

/// Workspace data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct Workspace {
    pub id: String,
    pub attributes: WorkspaceAttributes,
    pub relationships: Option<WorkspaceRelationships>,
}

/// Workspace relationships from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct WorkspaceRelationships {
    pub project: Option<RelationshipData>,
    pub organization: Option<RelationshipData>,
}

/// Workspace attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct WorkspaceAttributes {
    pub name: String,

    #[serde(rename = "resource-count")]
    pub resource_count: Option<u32>,

    pub locked: Option<bool>,

    #[serde(rename = "terraform-version")]
    pub terraform_version: Option<String>,
}

impl TfeResource for Workspace {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.attributes.name
    }
}

impl Workspace {
    /// Check if workspace is locked
    pub fn is_locked(&self) -> bool {
        self.attributes.locked.unwrap_or(false)
    }

    /// Get project ID if available
    pub fn project_id(&self) -> Option<&str> {
        self.relationships
            .as_ref()
            .and_then(|r| r.project.as_ref())
            .and_then(|p| p.id())
    }
}
