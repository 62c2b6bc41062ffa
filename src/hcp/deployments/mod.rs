//! Stack deployment groups, runs and steps

mod api;
mod models;

pub use models::{
    DeploymentGroup, DeploymentGroupAttributes, DeploymentGroupStatus, DeploymentRun,
    DeploymentRunAttributes, DeploymentStep, DeploymentStepAttributes, StepOperation, StepStatus,
};
