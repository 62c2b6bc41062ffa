//! Stack data models

use serde::Deserialize;

use crate::hcp::models::RelationshipData;
use crate::hcp::traits::TfeResource;

/// Stack data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct Stack {
    pub id: String,
    pub attributes: StackAttributes,
    pub relationships: Option<StackRelationships>,
}

/// Stack attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct StackAttributes {
    pub name: String,
    pub description: Option<String>,

    /// VCS binding; migration only targets stacks without one
    #[serde(rename = "vcs-repo")]
    pub vcs_repo: Option<serde_json::Value>,
}

/// Stack relationships from TFE API
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StackRelationships {
    pub project: Option<RelationshipData>,

    #[serde(rename = "latest-stack-configuration")]
    pub latest_stack_configuration: Option<RelationshipData>,
}

impl TfeResource for Stack {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.attributes.name
    }
}

impl Stack {
    /// True when the stack is bound to a VCS repository
    pub fn has_vcs_repo(&self) -> bool {
        self.attributes
            .vcs_repo
            .as_ref()
            .is_some_and(|v| !v.is_null())
    }

    /// ID of the most recent stack configuration, if any was ever uploaded
    pub fn latest_configuration_id(&self) -> Option<&str> {
        self.relationships
            .as_ref()
            .and_then(|r| r.latest_stack_configuration.as_ref())
            .and_then(|c| c.id())
    }

    /// Get project ID if available
    pub fn project_id(&self) -> Option<&str> {
        self.relationships
            .as_ref()
            .and_then(|r| r.project.as_ref())
            .and_then(|p| p.id())
    }
}

/// Stack source (one uploaded configuration bundle)
#[derive(Deserialize, Debug, Clone)]
pub struct StackSource {
    pub id: String,
    #[serde(default)]
    pub links: StackSourceLinks,
    #[serde(default)]
    pub relationships: StackSourceRelationships,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StackSourceLinks {
    #[serde(rename = "upload-url")]
    pub upload_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StackSourceRelationships {
    #[serde(rename = "stack-configuration")]
    pub stack_configuration: Option<RelationshipData>,
}

impl StackSource {
    /// Configuration created from this source, once the remote has ingested it
    pub fn configuration_id(&self) -> Option<&str> {
        self.relationships
            .stack_configuration
            .as_ref()
            .and_then(|c| c.id())
    }
}
