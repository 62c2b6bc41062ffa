//! UI utilities for terminal output
//!
//! Progress spinners and confirmation prompts.

mod confirm;
mod spinner;

pub use confirm::confirm_action;
pub use spinner::{create_spinner, finish_spinner, finish_spinner_with_status};
