//! State file models

use serde::{Deserialize, Serialize};

use crate::migration::schema::RESOURCE_TYPE_NAME;
use crate::migration::StackMigrationResource;

/// Current state file format
pub const FORMAT_VERSION: u32 = 1;

/// On-disk state file (`hcpmigrate.state.json`)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    pub format_version: u32,
    pub resource_type: String,
    pub resource: StackMigrationResource,
}

impl StateFile {
    pub fn new(resource: StackMigrationResource) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            resource_type: RESOURCE_TYPE_NAME.to_string(),
            resource,
        }
    }
}
