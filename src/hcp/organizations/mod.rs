//! Organization module

mod api;
mod models;

pub use models::{Organization, OrganizationAttributes};
