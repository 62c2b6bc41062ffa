//! Organization API operations

use crate::config::api;
use crate::error::Result;
use crate::hcp::TfeClient;

use super::models::Organization;

impl TfeClient {
    /// Read an organization by name; `None` when it does not exist
    pub async fn read_organization(&self, name: &str) -> Result<Option<Organization>> {
        let path = format!("/{}/{}", api::ORGANIZATIONS, urlencoding::encode(name));
        Ok(self
            .fetch_resource_by_path::<Organization>(&path, &format!("organization '{}'", name))
            .await?
            .map(|(org, _raw)| org))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_organization_found() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/acme"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "acme", "attributes": { "name": "acme" } }
            })))
            .mount(&mock_server)
            .await;

        let org = client.read_organization("acme").await.unwrap();
        assert_eq!(org.unwrap().id, "acme");
    }

    #[tokio::test]
    async fn test_read_organization_missing() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        assert!(client.read_organization("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_organization_server_error() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/acme"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = client.read_organization("acme").await;
        assert!(matches!(result, Err(MigrateError::Api { status: 500, .. })));
    }
}
