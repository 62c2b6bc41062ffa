//! User confirmation prompts for operations that change remote state

use dialoguer::Confirm;

use crate::error::{MigrateError, Result};

/// Ask the user to approve an action
///
/// `auto_approve` skips the prompt. In batch mode without `auto_approve` the
/// action is declined, so unattended runs never change anything by accident.
pub fn confirm_action(prompt: &str, batch: bool, auto_approve: bool) -> Result<bool> {
    if auto_approve {
        return Ok(true);
    }
    if batch {
        eprintln!("Running in batch mode without --auto-approve; nothing was changed.");
        return Ok(false);
    }

    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| MigrateError::Io {
            message: format!("confirmation prompt failed: {}", e),
        })
}
