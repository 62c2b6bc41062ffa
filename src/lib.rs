//! hcpmigrate - Migrate HCP Terraform workspaces into a Stack
//!
//! Declares a stack migration in a YAML file and drives it to completion:
//! the stack configuration is uploaded, every mapped workspace's state is
//! converted through `terraform rpcapi` and imported into its deployment.
//!
//! # Example
//!
//! ```bash
//! # Show what would happen
//! hcpmigrate plan -f migration.yaml
//!
//! # Upload the configuration and migrate state
//! hcpmigrate apply -f migration.yaml
//!
//! # Refresh the persisted state
//! hcpmigrate refresh
//!
//! # Fingerprint a directory
//! hcpmigrate hash ./stack
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hcp;
pub mod migration;
pub mod output;
pub mod rpc;
pub mod state;
pub mod ui;

pub use cli::{Cli, Command, OutputFormat};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{MigrateError, Result};
pub use hcp::{ProviderConfig, TfeClient, TokenResolver};
pub use migration::{
    MigrationManifest, MigrationOptions, StackMigrationController, StackMigrationResource,
};
pub use state::StateStore;
