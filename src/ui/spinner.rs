//! Progress spinner utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with the given message
///
/// Returns `None` in batch mode.
pub fn create_spinner(message: &str, batch: bool) -> Option<ProgressBar> {
    if batch {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

/// Finish spinner with a message
pub fn finish_spinner(spinner: Option<ProgressBar>, message: &str) {
    if let Some(s) = spinner {
        s.finish_with_message(message.to_string());
    }
}

/// Finish spinner according to the diagnostics of the operation it tracked
pub fn finish_spinner_with_status(spinner: Option<ProgressBar>, had_errors: bool) {
    if let Some(s) = spinner {
        if had_errors {
            s.finish_with_message("Completed with errors");
        } else {
            s.finish_with_message("Done");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner_batch_mode() {
        assert!(create_spinner("test", true).is_none());
    }

    #[test]
    fn test_finish_spinner_none() {
        finish_spinner(None, "Done");
        finish_spinner_with_status(None, true);
    }
}
