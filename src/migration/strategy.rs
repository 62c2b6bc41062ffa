//! Update-strategy decision

use crate::hcp::{DeploymentGroupStatus, StackConfigurationStatus};

use super::model::UpdateStrategy;

/// Latest remote configuration and the status of its deployment groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRollout {
    pub configuration_id: String,
    pub status: StackConfigurationStatus,
    pub groups: Vec<DeploymentGroupStatus>,
}

/// Everything the decision depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyInputs {
    /// Persisted source bundle or Terraform config hash differs from the fresh one
    pub config_files_changed: bool,
    pub mapping_changed: bool,
    /// Result of `allow_source_bundle_upload` for the latest configuration
    pub upload_allowed: bool,
    /// `None` when the stack has no configuration yet
    pub latest: Option<LatestRollout>,
    /// Configuration id persisted by the last apply of this resource
    pub recorded_configuration_id: Option<String>,
}

impl StrategyInputs {
    fn changed(&self) -> bool {
        self.config_files_changed || self.mapping_changed
    }

    fn uploaded_by_us(&self, latest: &LatestRollout) -> bool {
        self.recorded_configuration_id.as_deref() == Some(latest.configuration_id.as_str())
    }
}

/// Pick the strategy for an update whose identity attributes are unchanged
pub fn decide(inputs: &StrategyInputs) -> UpdateStrategy {
    let strategy = decide_from_rollout(inputs);

    if strategy == UpdateStrategy::ApplyNewConfiguration && !inputs.upload_allowed {
        return UpdateStrategy::WaitForCompletion(
            "the latest stack configuration still has deployments rolling out".to_string(),
        );
    }
    strategy
}

fn decide_from_rollout(inputs: &StrategyInputs) -> UpdateStrategy {
    let Some(latest) = &inputs.latest else {
        return UpdateStrategy::ApplyNewConfiguration;
    };

    match latest.status {
        StackConfigurationStatus::Failed | StackConfigurationStatus::Canceled => {
            UpdateStrategy::ApplyNewConfiguration
        }
        StackConfigurationStatus::Completed => decide_from_groups(inputs, latest),
        status => UpdateStrategy::WaitForCompletion(format!(
            "stack configuration {} is {}",
            latest.configuration_id, status
        )),
    }
}

fn decide_from_groups(inputs: &StrategyInputs, latest: &LatestRollout) -> UpdateStrategy {
    let succeeded = latest
        .groups
        .iter()
        .filter(|s| **s == DeploymentGroupStatus::Succeeded)
        .count();
    let unsuccessful = latest.groups.iter().filter(|s| s.is_unsuccessful()).count();

    if succeeded + unsuccessful != latest.groups.len() {
        // Our own groups wait on allow-import, which only a driver advances
        if inputs.uploaded_by_us(latest) {
            return UpdateStrategy::RetryFailedDeployments;
        }
        return UpdateStrategy::WaitForCompletion(format!(
            "deployment groups of stack configuration {} are still rolling out",
            latest.configuration_id
        ));
    }

    match (succeeded, unsuccessful) {
        (_, 0) if inputs.changed() => UpdateStrategy::ApplyNewConfiguration,
        (_, 0) => UpdateStrategy::NoAction,
        (0, _) => UpdateStrategy::ApplyNewConfiguration,
        _ if inputs.changed() => UpdateStrategy::ApplyNewConfiguration,
        _ => UpdateStrategy::RetryFailedDeployments,
    }
}
