//! HCP Terraform API client module
//!
//! Typed read/write operations against the HCP Terraform API, one submodule
//! per remote resource. Each submodule adds an `impl TfeClient` block.

mod client;
mod credentials;
pub mod deployments;
pub mod models;
pub mod organizations;
pub mod projects;
pub mod stack_configurations;
pub mod stacks;
pub mod state;
pub mod traits;
pub mod workspaces;

pub use client::TfeClient;
pub use credentials::{ProviderConfig, TokenResolver};
pub use deployments::{
    DeploymentGroup, DeploymentGroupStatus, DeploymentRun, DeploymentStep, StepOperation,
    StepStatus,
};
pub use models::{Pagination, PaginationMeta};
pub use organizations::Organization;
pub use projects::Project;
pub use stack_configurations::{StackConfiguration, StackConfigurationStatus, StackDiagnostic};
pub use stacks::Stack;
pub use state::TerraformState;
pub use traits::{PaginatedResponse, TfeResource};
pub use workspaces::Workspace;
