//! Stack configurations, their deployment groups and diagnostics

mod api;
mod models;

pub use models::{
    StackConfiguration, StackConfigurationAttributes, StackConfigurationStatus, StackDiagnostic,
    StackDiagnosticAttributes,
};
