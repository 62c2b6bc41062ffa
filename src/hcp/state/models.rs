//! State version data models

use serde::Deserialize;

/// State version data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct CurrentStateVersion {
    pub id: String,
    pub attributes: StateVersionAttributes,
}

/// State version attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct StateVersionAttributes {
    pub serial: u64,

    #[serde(rename = "terraform-version")]
    pub terraform_version: Option<String>,

    #[serde(rename = "hosted-state-download-url")]
    pub hosted_state_download_url: Option<String>,

    pub lineage: Option<String>,
}

/// The parts of a downloaded Terraform state the migration inspects
#[derive(Deserialize, Debug, Clone)]
pub struct TerraformState {
    pub version: u32,
    #[serde(default)]
    pub serial: u64,
    #[serde(default)]
    pub resources: Vec<StateResource>,
}

/// A resource entry in a Terraform state file
#[derive(Deserialize, Debug, Clone)]
pub struct StateResource {
    /// Module address, absent for root module resources
    pub module: Option<String>,
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
}

impl StateResource {
    /// Address of the resource relative to its module (`aws_vpc.main`, `data.x.y`)
    pub fn local_address(&self) -> String {
        if self.mode == "data" {
            format!("data.{}.{}", self.resource_type, self.name)
        } else {
            format!("{}.{}", self.resource_type, self.name)
        }
    }

    /// Top-level module call name (`module.net.module.sub` -> `net`)
    pub fn top_level_module(&self) -> Option<&str> {
        self.module
            .as_deref()
            .and_then(|m| m.strip_prefix("module."))
            .map(|rest| {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                &rest[..end]
            })
    }
}

impl TerraformState {
    /// Parse raw state bytes
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// True when any resource lives inside a module call
    pub fn is_modular(&self) -> bool {
        self.resources.iter().any(|r| r.module.is_some())
    }
}
