//! Terminal-state watcher for stack configurations

use log::{debug, info, warn};
use tokio::time::Instant;

use crate::hcp::{DeploymentGroup, StackConfiguration, StackConfigurationStatus, TfeClient};

use super::settings::PollSettings;

/// Poll a stack configuration until it reaches a terminal status
///
/// Read errors inside the loop are logged and retried. When the timeout
/// elapses first the result is `Pending`.
pub async fn watch_until_terminal(
    client: &TfeClient,
    configuration_id: &str,
    poll: &PollSettings,
) -> StackConfigurationStatus {
    let deadline = Instant::now() + poll.watch_timeout;

    loop {
        match client.read_stack_configuration(configuration_id).await {
            Ok(config) if config.status().is_terminal() => {
                info!(
                    "Stack configuration {} reached {}",
                    configuration_id,
                    config.status()
                );
                return config.status();
            }
            Ok(config) => debug!(
                "Stack configuration {} is {}",
                configuration_id,
                config.status()
            ),
            Err(e) => warn!(
                "Failed to read stack configuration {}, retrying: {}",
                configuration_id, e
            ),
        }

        if Instant::now() + poll.watch_interval > deadline {
            warn!(
                "Stack configuration {} did not reach a terminal status within {:?}",
                configuration_id, poll.watch_timeout
            );
            return StackConfigurationStatus::Pending;
        }
        tokio::time::sleep(poll.watch_interval).await;
    }
}

/// Whether a new source bundle may be uploaded on top of `latest`
///
/// `groups` are the deployment groups of `latest`.
pub fn allow_source_bundle_upload(
    latest: Option<&StackConfiguration>,
    groups: &[DeploymentGroup],
) -> bool {
    let Some(latest) = latest else {
        return true;
    };

    match latest.status() {
        StackConfigurationStatus::Failed | StackConfigurationStatus::Canceled => true,
        StackConfigurationStatus::Completed => !groups.iter().any(|g| g.status().is_running()),
        _ => false,
    }
}
