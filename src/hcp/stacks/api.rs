//! Stack API operations

use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use crate::archive;
use crate::config::api;
use crate::error::{MigrateError, Result};
use crate::hcp::models::ApiResponse;
use crate::hcp::traits::{ApiListResponse, TfeResource};
use crate::hcp::TfeClient;

use super::models::{Stack, StackSource};

impl TfeClient {
    /// Read a stack by exact name within a project
    pub async fn read_stack(
        &self,
        org: &str,
        project_id: &str,
        name: &str,
    ) -> Result<Option<Stack>> {
        let path = format!(
            "/{}/{}/{}?filter[project[id]]={}&search[name]={}",
            api::ORGANIZATIONS,
            urlencoding::encode(org),
            api::STACKS,
            urlencoding::encode(project_id),
            urlencoding::encode(name)
        );
        let error_context = format!("stack '{}' in project '{}'", name, project_id);

        let stacks = self
            .fetch_all_pages::<Stack, ApiListResponse<Stack>>(&path, &error_context)
            .await?;

        debug!(
            "Stack lookup for '{}' returned {} candidates",
            name,
            stacks.len()
        );
        Ok(stacks
            .into_iter()
            .find(|s| s.name() == name && s.project_id().is_none_or(|p| p == project_id)))
    }

    /// Upload the directory as a new stack source and wait for its configuration
    ///
    /// Returns the ID of the stack configuration created from the upload.
    pub async fn upload_stack_config(
        &self,
        stack_id: &str,
        config_dir: &Path,
        poll_attempts: u32,
        poll_interval: Duration,
    ) -> Result<String> {
        let bundle = archive::tar_gz_directory(config_dir).await?;

        let source = self.create_stack_source(stack_id).await?;
        let upload_url = source.links.upload_url.as_deref().ok_or_else(|| {
            MigrateError::Api {
                status: 201,
                message: format!("Stack source '{}' has no upload URL", source.id),
            }
        })?;

        info!(
            "Uploading source bundle from {} to stack {}",
            config_dir.display(),
            stack_id
        );
        self.upload_to_url(&self.resolve_link(upload_url), bundle, "source bundle")
            .await?;

        self.await_stack_source_configuration(&source.id, poll_attempts, poll_interval)
            .await
    }

    /// Create an empty stack source to obtain an upload URL
    async fn create_stack_source(&self, stack_id: &str) -> Result<StackSource> {
        let path = format!("/{}/{}/{}", api::STACKS, stack_id, api::STACK_SOURCES);
        let body = serde_json::json!({ "data": { "type": api::STACK_SOURCES } });

        let response = self
            .post_action(
                &path,
                Some(body),
                &format!("create stack source for '{}'", stack_id),
            )
            .await?;

        let data: ApiResponse<StackSource> = response.json().await?;
        debug!("Created stack source {}", data.data.id);
        Ok(data.data)
    }

    /// Poll an uploaded stack source until the remote links it to a configuration
    async fn await_stack_source_configuration(
        &self,
        source_id: &str,
        attempts: u32,
        interval: Duration,
    ) -> Result<String> {
        let path = format!("/{}/{}", api::STACK_SOURCES, source_id);
        let label = format!("stack source '{}'", source_id);

        for attempt in 1..=attempts {
            let source: StackSource = self.fetch_required(&path, &label).await?;
            if let Some(id) = source.configuration_id() {
                debug!("Stack source {} produced configuration {}", source_id, id);
                return Ok(id.to_string());
            }

            debug!(
                "Stack source {} has no configuration yet (attempt {}/{})",
                source_id, attempt, attempts
            );
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(MigrateError::Api {
            status: 200,
            message: format!(
                "Stack source '{}' did not produce a configuration after {} attempts",
                source_id, attempts
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stack_json(id: &str, name: &str, project_id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "stacks",
            "attributes": { "name": name },
            "relationships": {
                "project": { "data": { "id": project_id, "type": "projects" } }
            }
        })
    }

    #[tokio::test]
    async fn test_read_stack_exact_match() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/acme/stacks"))
            .and(query_param("filter[project[id]]", "prj-1"))
            .and(query_param("search[name]", "net"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    stack_json("st-1", "network", "prj-1"),
                    stack_json("st-2", "net", "prj-1")
                ]
            })))
            .mount(&mock_server)
            .await;

        let stack = client.read_stack("acme", "prj-1", "net").await.unwrap();
        assert_eq!(stack.unwrap().id, "st-2");
    }

    #[tokio::test]
    async fn test_read_stack_missing() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/acme/stacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [stack_json("st-9", "net", "prj-other")]
            })))
            .mount(&mock_server)
            .await;

        let stack = client.read_stack("acme", "prj-1", "net").await.unwrap();
        assert!(stack.is_none());
    }

    #[tokio::test]
    async fn test_upload_stack_config_flow() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tfdeploy.hcl"), "deployment \"a\" {}").unwrap();

        Mock::given(method("POST"))
            .and(path("/stacks/st-1/stack-sources"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {
                    "id": "sts-1",
                    "links": { "upload-url": format!("{}/upload/sts-1", mock_server.uri()) }
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/sts-1"))
            .and(header("Content-Type", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        // First poll has no configuration yet, second one does
        Mock::given(method("GET"))
            .and(path("/stack-sources/sts-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "sts-1", "relationships": { "stack-configuration": { "data": null } } }
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/stack-sources/sts-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "sts-1",
                    "relationships": {
                        "stack-configuration": { "data": { "id": "stc-42", "type": "stack-configurations" } }
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let config_id = client
            .upload_stack_config("st-1", dir.path(), 5, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(config_id, "stc-42");
    }

    #[tokio::test]
    async fn test_upload_stack_config_upload_failure() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tfdeploy.hcl"), "").unwrap();

        Mock::given(method("POST"))
            .and(path("/stacks/st-1/stack-sources"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {
                    "id": "sts-1",
                    "links": { "upload-url": format!("{}/upload/sts-1", mock_server.uri()) }
                }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/sts-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("archivist down"))
            .mount(&mock_server)
            .await;

        let err = client
            .upload_stack_config("st-1", dir.path(), 1, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("archivist down"));
    }

    #[tokio::test]
    async fn test_upload_stack_config_never_ingested() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tfdeploy.hcl"), "").unwrap();

        Mock::given(method("POST"))
            .and(path("/stacks/st-1/stack-sources"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {
                    "id": "sts-1",
                    "links": { "upload-url": format!("{}/upload/sts-1", mock_server.uri()) }
                }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/sts-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/stack-sources/sts-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "sts-1" }
            })))
            .expect(3)
            .mount(&mock_server)
            .await;

        let err = client
            .upload_stack_config("st-1", dir.path(), 3, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not produce a configuration"));
    }
}
