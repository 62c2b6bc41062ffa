//! Stack configuration API operations

use log::debug;

use crate::config::api;
use crate::error::Result;
use crate::hcp::deployments::DeploymentGroup;
use crate::hcp::traits::ApiListResponse;
use crate::hcp::TfeClient;

use super::models::{StackConfiguration, StackDiagnostic};

impl TfeClient {
    /// Read a stack configuration by ID
    pub async fn read_stack_configuration(
        &self,
        configuration_id: &str,
    ) -> Result<StackConfiguration> {
        let path = format!("/{}/{}", api::STACK_CONFIGURATIONS, configuration_id);
        self.fetch_required(
            &path,
            &format!("stack configuration '{}'", configuration_id),
        )
        .await
    }

    /// List the deployment groups created for a stack configuration
    pub async fn list_deployment_groups(
        &self,
        configuration_id: &str,
    ) -> Result<Vec<DeploymentGroup>> {
        let path = format!(
            "/{}/{}/{}",
            api::STACK_CONFIGURATIONS,
            configuration_id,
            api::DEPLOYMENT_GROUPS
        );
        let groups = self
            .fetch_all_pages::<DeploymentGroup, ApiListResponse<DeploymentGroup>>(
                &path,
                &format!("deployment groups of '{}'", configuration_id),
            )
            .await?;

        debug!(
            "Configuration {} has {} deployment groups",
            configuration_id,
            groups.len()
        );
        Ok(groups)
    }

    /// Read the diagnostics reported for a stack configuration
    pub async fn read_stack_diagnostics(
        &self,
        configuration_id: &str,
    ) -> Result<Vec<StackDiagnostic>> {
        let path = format!(
            "/{}/{}/{}",
            api::STACK_CONFIGURATIONS,
            configuration_id,
            api::DIAGNOSTICS
        );
        self.fetch_all_pages::<StackDiagnostic, ApiListResponse<StackDiagnostic>>(
            &path,
            &format!("diagnostics of '{}'", configuration_id),
        )
        .await
    }
}
