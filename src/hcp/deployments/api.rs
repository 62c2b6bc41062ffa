//! Deployment API operations

use log::{debug, info};

use crate::config::api;
use crate::error::{MigrateError, Result};
use crate::hcp::traits::ApiListResponse;
use crate::hcp::TfeClient;

use super::models::{DeploymentGroup, DeploymentRun, DeploymentStep};

impl TfeClient {
    /// Read a deployment group by ID
    pub async fn read_deployment_group(&self, group_id: &str) -> Result<DeploymentGroup> {
        let path = format!("/{}/{}", api::DEPLOYMENT_GROUPS, group_id);
        self.fetch_required(&path, &format!("deployment group '{}'", group_id))
            .await
    }

    /// Rerun the given deployments of a deployment group
    pub async fn rerun_deployment_group(
        &self,
        group_id: &str,
        deployments: &[String],
    ) -> Result<()> {
        let path = format!("/{}/{}/rerun", api::DEPLOYMENT_GROUPS, group_id);
        info!("Rerunning deployment group {} for {:?}", group_id, deployments);

        self.post_action(
            &path,
            Some(serde_json::json!({ "deployments": deployments })),
            &format!("rerun deployment group '{}'", group_id),
        )
        .await?;
        Ok(())
    }

    /// Read the latest run of a deployment in a stack
    pub async fn read_latest_deployment_run(
        &self,
        stack_id: &str,
        deployment_name: &str,
    ) -> Result<DeploymentRun> {
        let path = format!(
            "/{}/{}/{}/{}/latest-deployment-run",
            api::STACKS,
            stack_id,
            api::DEPLOYMENTS,
            urlencoding::encode(deployment_name)
        );
        self.fetch_required(
            &path,
            &format!("latest run of deployment '{}'", deployment_name),
        )
        .await
    }

    /// List the steps of a deployment run
    pub async fn list_deployment_run_steps(&self, run_id: &str) -> Result<Vec<DeploymentStep>> {
        let path = format!(
            "/{}/{}/{}",
            api::DEPLOYMENT_RUNS,
            run_id,
            api::DEPLOYMENT_STEPS
        );
        let steps = self
            .fetch_all_pages::<DeploymentStep, ApiListResponse<DeploymentStep>>(
                &path,
                &format!("steps of deployment run '{}'", run_id),
            )
            .await?;

        debug!("Deployment run {} has {} steps", run_id, steps.len());
        Ok(steps)
    }

    /// Read a deployment step by ID
    pub async fn read_deployment_step(&self, step_id: &str) -> Result<DeploymentStep> {
        let path = format!("/{}/{}", api::DEPLOYMENT_STEPS, step_id);
        self.fetch_required(&path, &format!("deployment step '{}'", step_id))
            .await
    }

    /// Advance a deployment step waiting on the operator
    pub async fn advance_deployment_step(&self, step_id: &str) -> Result<()> {
        let path = format!("/{}/{}/advance", api::DEPLOYMENT_STEPS, step_id);
        debug!("Advancing deployment step {}", step_id);

        self.post_action(&path, None, &format!("advance step '{}'", step_id))
            .await?;
        Ok(())
    }

    /// Upload an archived stack state to the import-state step's upload URL
    pub async fn upload_stack_state(&self, upload_url: &str, archive: Vec<u8>) -> Result<()> {
        if upload_url.is_empty() {
            return Err(MigrateError::Validation(
                "import-state step has an empty upload URL".to_string(),
            ));
        }
        self.upload_to_url(&self.resolve_link(upload_url), archive, "stack state")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcp::deployments::{DeploymentGroupStatus, StepOperation, StepStatus};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_deployment_group() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/stack-deployment-groups/sdg-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "sdg-1", "attributes": { "name": "dev_default", "status": "deploying" } }
            })))
            .mount(&mock_server)
            .await;

        let group = client.read_deployment_group("sdg-1").await.unwrap();
        assert_eq!(group.status(), DeploymentGroupStatus::Deploying);
    }

    #[tokio::test]
    async fn test_rerun_deployment_group_body() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/stack-deployment-groups/sdg-1/rerun"))
            .and(body_json(serde_json::json!({ "deployments": ["prod"] })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        client
            .rerun_deployment_group("sdg-1", &["prod".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_latest_deployment_run() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/stacks/st-1/stack-deployments/dev/latest-deployment-run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "sdr-7",
                    "attributes": { "deployment-name": "dev" },
                    "relationships": {
                        "stack-deployment-group": { "data": { "id": "sdg-3" } }
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let run = client.read_latest_deployment_run("st-1", "dev").await.unwrap();
        assert_eq!(run.id, "sdr-7");
        assert_eq!(run.group_id(), Some("sdg-3"));
    }

    #[tokio::test]
    async fn test_list_steps_and_advance() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/stack-deployment-runs/sdr-7/stack-deployment-steps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "id": "sds-1", "attributes": { "operation-type": "allow-import", "status": "pending_operator" } },
                    { "id": "sds-2", "attributes": { "operation-type": "import-state", "status": "pending_operator" } }
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/stack-deployment-steps/sds-1/advance"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let steps = client.list_deployment_run_steps("sdr-7").await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].operation(), StepOperation::AllowImport);
        assert_eq!(steps[0].status(), StepStatus::PendingOperator);

        client.advance_deployment_step("sds-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_advance_step_conflict() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/stack-deployment-steps/sds-1/advance"))
            .respond_with(ResponseTemplate::new(409).set_body_string("step is not awaiting operator"))
            .mount(&mock_server)
            .await;

        let result = client.advance_deployment_step("sds-1").await;
        match result {
            Err(MigrateError::Conflict(msg)) => assert!(msg.contains("not awaiting operator")),
            other => panic!("Expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_stack_state_rejects_empty_url() {
        let client = TfeClient::test_client("http://127.0.0.1:1");
        let result = client.upload_stack_state("", vec![1, 2, 3]).await;
        assert!(matches!(result, Err(MigrateError::Validation(_))));
    }
}
