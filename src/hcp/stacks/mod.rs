//! Stacks and stack source uploads

mod api;
mod models;

pub use models::{Stack, StackAttributes, StackRelationships, StackSource};
