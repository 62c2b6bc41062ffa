//! Project data models

use serde::Deserialize;

use crate::hcp::traits::TfeResource;

/// Project data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct Project {
    pub id: String,
    pub attributes: ProjectAttributes,
}

/// Project attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct ProjectAttributes {
    pub name: String,
    pub description: Option<String>,
}

impl TfeResource for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.attributes.name
    }
}
