//! Stack migration orchestration
//!
//! [`StackMigrationController`] runs the resource lifecycle. The deployment
//! driver, watcher, strategy decision and fingerprints are its building blocks.

mod commands;
mod controller;
pub mod driver;
pub mod fingerprint;
pub mod manifest;
pub mod model;
pub mod preconditions;
pub mod schema;
pub mod settings;
pub mod source_bundle;
pub mod stack_state;
pub mod strategy;
pub mod watcher;


pub use commands::{
    run_apply_command, run_destroy_command, run_hash_command, run_plan_command,
    run_refresh_command, run_schema_command,
};
pub use controller::StackMigrationController;
pub use manifest::MigrationManifest;
pub use model::{
    Applied, Attr, PlannedAction, PlannedChange, Refreshed, StackMigrationData,
    StackMigrationResource, UpdateStrategy, UNKNOWN_DISPLAY,
};
pub use settings::{MigrationOptions, PollSettings};
