//! Tunables for the remote polling loops and driver behaviour

use std::time::Duration;

use crate::config::polling;

/// Intervals and budgets of every polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Stack configuration watcher timeout
    pub watch_timeout: Duration,
    /// Stack configuration watcher interval
    pub watch_interval: Duration,
    /// Deployment group polls after the import-state advance
    pub group_poll_attempts: u32,
    pub group_poll_interval: Duration,
    /// Pause before re-reading a step for its upload URL
    pub step_quiescence: Duration,
    /// Polls while an uploaded source is turned into a configuration
    pub source_poll_attempts: u32,
    pub source_poll_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            watch_timeout: Duration::from_secs(polling::WATCH_TIMEOUT_SECS),
            watch_interval: Duration::from_secs(polling::WATCH_INTERVAL_SECS),
            group_poll_attempts: polling::GROUP_POLL_ATTEMPTS,
            group_poll_interval: Duration::from_secs(polling::GROUP_POLL_INTERVAL_SECS),
            step_quiescence: Duration::from_secs(polling::STEP_QUIESCENCE_SECS),
            source_poll_attempts: polling::SOURCE_POLL_ATTEMPTS,
            source_poll_interval: Duration::from_secs(polling::SOURCE_POLL_INTERVAL_SECS),
        }
    }
}

impl PollSettings {
    /// Millisecond-scale settings for tests
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            watch_timeout: Duration::from_millis(200),
            watch_interval: Duration::from_millis(5),
            group_poll_attempts: 5,
            group_poll_interval: Duration::from_millis(5),
            step_quiescence: Duration::ZERO,
            source_poll_attempts: 5,
            source_poll_interval: Duration::from_millis(5),
        }
    }
}

/// Options of a migration controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    pub poll: PollSettings,
    /// Rerun abandoned deployment groups instead of failing the workspace
    pub retry_abandoned: bool,
}
