//! TFE HTTP client for API interactions

use futures::stream::{self, StreamExt};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::api;
use crate::error::{MigrateError, Result};
use crate::hcp::traits::PaginatedResponse;

/// TFE API client
pub struct TfeClient {
    client: Client,
    token: String,
    host: String,
    /// Custom base URL override (for testing with mock servers)
    base_url_override: Option<String>,
}

impl TfeClient {
    /// Create a new TFE client with optimized connection settings
    pub fn new(token: String, host: String) -> Self {
        let client = Client::builder()
            // Connection pool settings - reuse connections
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            // TCP keepalive to maintain connections
            .tcp_keepalive(Duration::from_secs(60))
            // Timeouts
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            host,
            base_url_override: None,
        }
    }

    /// Create a client with custom base URL (for testing with mock servers)
    pub fn with_base_url(token: String, host: String, base_url: String) -> Self {
        let client = Client::builder().build().unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            host,
            base_url_override: Some(base_url),
        }
    }

    /// Build the base URL for API requests
    pub(crate) fn base_url(&self) -> String {
        if let Some(ref url) = self.base_url_override {
            return url.clone();
        }
        format!(
            "https://{}/{}",
            self.host,
            api::BASE_PATH.trim_start_matches('/')
        )
    }

    /// Get the host for building URLs
    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    /// Resolve a link returned by the API (absolute or host-relative)
    pub(crate) fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            return link.to_string();
        }
        match self.base_url_override {
            // Mock servers serve the API at their root
            Some(ref url) => format!(
                "{}{}",
                url,
                link.strip_prefix(api::BASE_PATH).unwrap_or(link)
            ),
            None => format!("https://{}{}", self.host(), link),
        }
    }

    /// Add standard headers to a request builder
    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", api::CONTENT_TYPE)
    }

    /// Create a GET request builder with standard headers
    pub(crate) fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(url))
    }

    /// Create a POST request builder with standard headers
    pub(crate) fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(url))
    }

    /// Create a PUT request builder without API headers
    ///
    /// Upload URLs issued by the API are pre-signed and must not carry the token.
    pub(crate) fn put_unauthenticated(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.put(url)
    }

    /// Parse an API response, returning error for non-success status codes
    ///
    /// Simplifies the common pattern of checking status and parsing JSON.
    pub(crate) async fn parse_api_response<T>(
        &self,
        response: reqwest::Response,
        error_context: &str,
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(MigrateError::Api {
                status: response.status().as_u16(),
                message: format!("Failed to fetch {}", error_context),
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch all pages from a paginated API endpoint with parallel fetching
    ///
    /// This method fetches page 1 first to learn total_pages, then fetches
    /// remaining pages in parallel (with concurrency limit).
    ///
    /// # Arguments
    /// * `path` - API path (e.g., "/stack-configurations/stc-1/stack-deployment-groups")
    /// * `error_context` - Context for error messages
    pub async fn fetch_all_pages<T, R>(&self, path: &str, error_context: &str) -> Result<Vec<T>>
    where
        T: Send,
        R: DeserializeOwned + PaginatedResponse<T> + Send,
    {
        // Detect if path already has query params
        let separator = if path.contains('?') { "&" } else { "?" };

        let first_page_url = format!(
            "{}{}{}page[size]={}&page[number]=1",
            self.base_url(),
            path,
            separator,
            api::DEFAULT_PAGE_SIZE,
        );

        debug!("Fetching page 1 from: {}", first_page_url);

        let response = self.get(&first_page_url).send().await?;

        let first_resp: R = self.parse_api_response(response, error_context).await?;
        let meta = first_resp.meta().cloned();
        let mut all_items = first_resp.into_data();

        let (total_pages, total_count) = match meta {
            Some(ref m) => match m.pagination {
                Some(ref p) => (p.total_pages, p.total_count),
                None => return Ok(all_items), // No pagination info = single page
            },
            None => return Ok(all_items), // No meta = single page
        };

        debug!("Page 1/{}, total items: {}", total_pages, total_count);

        if total_pages <= 1 {
            return Ok(all_items);
        }

        let page_futures = (2..=total_pages).map(|page_num| {
            let url = format!(
                "{}{}{}page[size]={}&page[number]={}",
                self.base_url(),
                path,
                separator,
                api::DEFAULT_PAGE_SIZE,
                page_num
            );
            self.fetch_single_page::<T, R>(url, page_num, error_context)
        });

        let results: Vec<Result<(u32, Vec<T>)>> = stream::iter(page_futures)
            .buffer_unordered(api::MAX_CONCURRENT_PAGE_REQUESTS)
            .collect()
            .await;

        let mut page_results: Vec<(u32, Vec<T>)> = Vec::with_capacity(results.len());
        for result in results {
            page_results.push(result?);
        }

        // Sort by page number to maintain consistent ordering
        page_results.sort_by_key(|(page_num, _)| *page_num);

        for (_, items) in page_results {
            all_items.extend(items);
        }

        debug!(
            "Fetched {} total items for {}",
            all_items.len(),
            error_context
        );
        Ok(all_items)
    }

    /// Fetch a single resource by API path
    ///
    /// Generic helper that handles the common pattern of:
    /// - GET a resource by path
    /// - Parse JSON response into typed model + raw JSON
    /// - Return None for 404
    /// - Return error for other non-success status codes
    pub async fn fetch_resource_by_path<T>(
        &self,
        path: &str,
        resource_label: &str,
    ) -> Result<Option<(T, serde_json::Value)>>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url(), path);
        debug!("Fetching {} from: {}", resource_label, url);

        let response = self.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                let raw: serde_json::Value = response.json().await?;
                let item: T =
                    serde_json::from_value(raw["data"].clone()).map_err(|e| MigrateError::Api {
                        status: 200,
                        message: format!("Failed to parse {}: {}", resource_label, e),
                    })?;
                Ok(Some((item, raw)))
            }
            404 => Ok(None),
            status => Err(MigrateError::Api {
                status,
                message: format!("Failed to fetch {}", resource_label),
            }),
        }
    }

    /// Fetch a resource that must exist; 404 becomes `MigrateError::NotFound`
    pub async fn fetch_required<T>(&self, path: &str, resource_label: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.fetch_resource_by_path::<T>(path, resource_label)
            .await?
            .map(|(item, _raw)| item)
            .ok_or_else(|| MigrateError::NotFound(resource_label.to_string()))
    }

    /// POST an action endpoint (e.g. `/actions/lock`, `/advance`) and check the status
    pub(crate) async fn post_action(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        action_label: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        debug!("POST {} ({})", url, action_label);

        let mut request = self.post(&url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        match response.status().as_u16() {
            200..=299 => Ok(response),
            404 => Err(MigrateError::NotFound(action_label.to_string())),
            409 => {
                let body = response.text().await.unwrap_or_default();
                Err(MigrateError::Conflict(format!("{}: {}", action_label, body)))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MigrateError::Api {
                    status,
                    message: format!("Failed to {}: {}", action_label, body),
                })
            }
        }
    }

    /// PUT raw bytes to a pre-signed upload URL
    pub async fn upload_to_url(&self, upload_url: &str, body: Vec<u8>, label: &str) -> Result<()> {
        debug!("Uploading {} ({} bytes) to {}", label, body.len(), upload_url);

        let response = self
            .put_unauthenticated(upload_url)
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;

        match response.status().as_u16() {
            200..=299 => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MigrateError::Api {
                    status,
                    message: format!("Failed to upload {}: {}", label, body),
                })
            }
        }
    }

    /// Fetch a single page (helper for parallel pagination)
    async fn fetch_single_page<T, R>(
        &self,
        url: String,
        page_num: u32,
        error_context: &str,
    ) -> Result<(u32, Vec<T>)>
    where
        R: DeserializeOwned + PaginatedResponse<T>,
    {
        debug!("Fetching page {} from: {}", page_num, url);

        let response = self.get(&url).send().await?;

        let page_context = format!("{} (page {})", error_context, page_num);
        let resp: R = self.parse_api_response(response, &page_context).await?;
        let items = resp.into_data();

        debug!("Page {} returned {} items", page_num, items.len());
        Ok((page_num, items))
    }
}

#[cfg(test)]
impl TfeClient {
    /// Create a test client with mock base URL
    pub fn test_client(base_url: &str) -> Self {
        Self::with_base_url(
            "test-token".to_string(),
            "mock.terraform.io".to_string(),
            base_url.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let client = TfeClient::new("token".to_string(), "example.com".to_string());
        assert_eq!(client.base_url(), "https://example.com/api/v2");
    }

    #[test]
    fn test_client_creation() {
        let client = TfeClient::new("my-token".to_string(), "app.terraform.io".to_string());
        assert_eq!(client.host, "app.terraform.io");
        assert_eq!(client.token, "my-token");
    }

    #[test]
    fn test_host_getter() {
        let client = TfeClient::new("token".to_string(), "app.terraform.io".to_string());
        assert_eq!(client.host(), "app.terraform.io");
    }

    #[test]
    fn test_resolve_link_relative() {
        let client = TfeClient::new("token".to_string(), "app.terraform.io".to_string());
        assert_eq!(
            client.resolve_link("/api/v2/stack-deployment-steps/sds-1/upload"),
            "https://app.terraform.io/api/v2/stack-deployment-steps/sds-1/upload"
        );
    }

    #[test]
    fn test_resolve_link_absolute_passthrough() {
        let client = TfeClient::new("token".to_string(), "app.terraform.io".to_string());
        let link = "https://archivist.terraform.io/v1/object/abc";
        assert_eq!(client.resolve_link(link), link);
    }

    #[test]
    fn test_resolve_link_against_mock_server() {
        let client = TfeClient::test_client("http://127.0.0.1:9999");
        assert_eq!(
            client.resolve_link("/api/v2/uploads/u-1"),
            "http://127.0.0.1:9999/uploads/u-1"
        );
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::hcp::traits::ApiListResponse;

    #[derive(Deserialize, Debug, Clone)]
    struct TestItem {
        id: String,
    }

    fn test_item_json(id: &str) -> serde_json::Value {
        serde_json::json!({ "id": id })
    }

    #[tokio::test]
    async fn test_fetch_all_pages_single_page() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/test-items"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [test_item_json("item-1"), test_item_json("item-2")],
                "meta": {
                    "pagination": {
                        "current-page": 1,
                        "total-pages": 1,
                        "total-count": 2
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let items = client
            .fetch_all_pages::<TestItem, ApiListResponse<TestItem>>("/test-items", "test items")
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "item-1");
    }

    #[tokio::test]
    async fn test_fetch_all_pages_keeps_page_order() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        for page in 1..=3 {
            Mock::given(method("GET"))
                .and(path("/test-items"))
                .and(query_param("page[number]", page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "data": [test_item_json(&format!("item-{}", page))],
                    "meta": {
                        "pagination": {
                            "current-page": page,
                            "total-pages": 3,
                            "total-count": 3
                        }
                    }
                })))
                .mount(&mock_server)
                .await;
        }

        let items = client
            .fetch_all_pages::<TestItem, ApiListResponse<TestItem>>("/test-items", "test items")
            .await
            .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["item-1", "item-2", "item-3"]);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_api_error_on_subsequent_page() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/test-items"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [test_item_json("item-1")],
                "meta": {
                    "pagination": {
                        "current-page": 1,
                        "total-pages": 2,
                        "total-count": 2
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/test-items"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = client
            .fetch_all_pages::<TestItem, ApiListResponse<TestItem>>("/test-items", "test items")
            .await;

        match result.unwrap_err() {
            MigrateError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("page 2"));
            }
            other => panic!("Expected MigrateError::Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_required_maps_404_to_not_found() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/stacks/st-missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = client
            .fetch_required::<serde_json::Value>("/stacks/st-missing", "stack 'st-missing'")
            .await;

        assert!(matches!(result, Err(MigrateError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_post_action_conflict() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/workspaces/ws-1/actions/lock"))
            .respond_with(ResponseTemplate::new(409).set_body_string("already locked"))
            .mount(&mock_server)
            .await;

        let result = client
            .post_action("/workspaces/ws-1/actions/lock", None, "lock workspace")
            .await;

        match result {
            Err(MigrateError::Conflict(msg)) => assert!(msg.contains("already locked")),
            other => panic!("Expected conflict, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_upload_to_url_sends_body_without_token() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("PUT"))
            .and(path("/upload/abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/upload/abc", mock_server.uri());
        client
            .upload_to_url(&url, b"payload".to_vec(), "test archive")
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests[0].body, b"payload".to_vec());
        assert!(requests[0].headers.get("authorization").is_none());
    }
}
