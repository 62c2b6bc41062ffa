//! State API operations

use log::debug;

use crate::config::api;
use crate::error::{MigrateError, Result};
use crate::hcp::models::ApiResponse;
use crate::hcp::TfeClient;

use super::models::CurrentStateVersion;

impl TfeClient {
    /// Get the current state version of a workspace
    pub async fn read_current_state_version(
        &self,
        workspace_id: &str,
    ) -> Result<CurrentStateVersion> {
        let url = format!(
            "{}/{}/{}/current-state-version",
            self.base_url(),
            api::WORKSPACES,
            workspace_id
        );

        debug!("Fetching current state version for: {}", workspace_id);

        let response = self.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                let data: ApiResponse<CurrentStateVersion> = response.json().await?;
                Ok(data.data)
            }
            404 => Err(MigrateError::NotFound(format!(
                "No state version found for workspace '{}'. The workspace may be empty.",
                workspace_id
            ))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MigrateError::Api {
                    status,
                    message: format!(
                        "Failed to get state version for '{}': {}",
                        workspace_id, body
                    ),
                })
            }
        }
    }

    /// Download raw state bytes from a state version download URL
    pub async fn download_state(&self, download_url: &str) -> Result<Vec<u8>> {
        let url = self.resolve_link(download_url);
        debug!("Downloading state from: {}", url);

        let response = self.get(&url).send().await?;

        match response.status().as_u16() {
            200 => Ok(response.bytes().await?.to_vec()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MigrateError::Api {
                    status,
                    message: format!("Failed to download state: {}", body),
                })
            }
        }
    }

    /// Read the current state version and download its raw bytes
    pub async fn download_current_state(&self, workspace_id: &str) -> Result<Vec<u8>> {
        let state_version = self.read_current_state_version(workspace_id).await?;
        let download_url = state_version
            .attributes
            .hosted_state_download_url
            .as_deref()
            .ok_or_else(|| {
                MigrateError::NotFound(format!(
                    "State version '{}' of workspace '{}' has no download URL",
                    state_version.id, workspace_id
                ))
            })?;
        self.download_state(download_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_current_state_version_empty_workspace() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/workspaces/ws-empty/current-state-version"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = client
            .read_current_state_version("ws-empty")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No state version found"));
    }

    #[tokio::test]
    async fn test_download_current_state_returns_raw_bytes() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/workspaces/ws-1/current-state-version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "sv-1",
                    "attributes": {
                        "serial": 7,
                        "hosted-state-download-url": format!("{}/state-download/sv-1", mock_server.uri())
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let raw = r#"{"version":4,"serial":7,"resources":[]}"#;
        Mock::given(method("GET"))
            .and(path("/state-download/sv-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw))
            .mount(&mock_server)
            .await;

        let bytes = client.download_current_state("ws-1").await.unwrap();
        assert_eq!(bytes, raw.as_bytes());
    }

    #[tokio::test]
    async fn test_download_current_state_without_url() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/workspaces/ws-1/current-state-version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "sv-1", "attributes": { "serial": 1 } }
            })))
            .mount(&mock_server)
            .await;

        let result = client.download_current_state("ws-1").await;
        assert!(matches!(result, Err(MigrateError::NotFound(_))));
    }
}
