//! Organization data models

use serde::Deserialize;

use crate::hcp::traits::TfeResource;

/// Organization data from TFE API
///
/// HCP uses the organization name as the JSON:API `id`.
#[derive(Deserialize, Debug, Clone)]
pub struct Organization {
    pub id: String,
    pub attributes: Option<OrganizationAttributes>,
}

/// Organization attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct OrganizationAttributes {
    pub name: Option<String>,
    #[serde(rename = "external-id")]
    pub external_id: Option<String>,
}

impl TfeResource for Organization {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        self.attributes
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or(&self.id)
    }
}
