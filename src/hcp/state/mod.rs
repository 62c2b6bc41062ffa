//! Workspace state versions - read and download raw Terraform state

mod api;
mod models;

pub use models::{CurrentStateVersion, StateResource, StateVersionAttributes, TerraformState};
