//! Output formatting module
//!
//! Table and JSON renderings of plans, apply results, state and schema.
//! Diagnostics always go to stderr.

mod common;
mod diagnostics;
mod migrations;
mod plan;
mod schema;

pub use common::print_json;
pub use diagnostics::output_diagnostics;
pub use migrations::{output_applied, output_state};
pub use plan::output_plan;
pub use schema::output_schema;
