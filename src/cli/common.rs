//! Common CLI types shared across commands

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::config::{defaults, polling};
use crate::migration::{MigrationOptions, PollSettings};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table (default)
    Table,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Migration file and state file locations
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Migration file (YAML) declaring the stack migration
    #[arg(short = 'f', long = "file", default_value = "migration.yaml")]
    pub file: PathBuf,

    /// State file holding the persisted migration attributes
    #[arg(short = 's', long = "state", default_value = defaults::STATE_FILE)]
    pub state: PathBuf,
}

/// Tunables of the remote polling loops
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds to wait for an uploaded stack configuration to settle
    #[arg(long, default_value_t = polling::WATCH_TIMEOUT_SECS)]
    pub watch_timeout: u64,

    /// Seconds between stack configuration status checks
    #[arg(long, default_value_t = polling::WATCH_INTERVAL_SECS)]
    pub watch_interval: u64,

    /// Deployment group status checks after state upload
    #[arg(long, default_value_t = polling::GROUP_POLL_ATTEMPTS)]
    pub group_poll_attempts: u32,

    /// Seconds between deployment group status checks
    #[arg(long, default_value_t = polling::GROUP_POLL_INTERVAL_SECS)]
    pub group_poll_interval: u64,

    /// Seconds to wait before reading the import-state upload URL
    #[arg(long, default_value_t = polling::STEP_QUIESCENCE_SECS)]
    pub step_quiescence: u64,

    /// Rerun abandoned deployment groups instead of failing the workspace
    #[arg(long, default_value_t = false)]
    pub retry_abandoned: bool,
}

impl PollArgs {
    pub fn options(&self) -> MigrationOptions {
        MigrationOptions {
            poll: PollSettings {
                watch_timeout: Duration::from_secs(self.watch_timeout),
                watch_interval: Duration::from_secs(self.watch_interval),
                group_poll_attempts: self.group_poll_attempts,
                group_poll_interval: Duration::from_secs(self.group_poll_interval),
                step_quiescence: Duration::from_secs(self.step_quiescence),
                ..PollSettings::default()
            },
            retry_abandoned: self.retry_abandoned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
