//! Local state file of the CLI host
//!
//! Holds the persisted attributes of one migration resource between runs.

mod models;
mod store;

pub use models::StateFile;
pub use store::StateStore;
