//! Common traits for TFE resources

use serde::Deserialize;

use crate::hcp::PaginationMeta;

/// Common trait for named TFE resources (organizations, projects, stacks, workspaces)
pub trait TfeResource {
    /// Get the resource ID
    fn id(&self) -> &str;

    /// Get the human-readable name
    fn name(&self) -> &str;
}

/// Trait for API responses that contain paginated data
///
/// Implement this trait for any `XResponse` struct to enable use with
/// `TfeClient::fetch_all_pages()` helper.
pub trait PaginatedResponse<T> {
    /// Consume self and return the data items
    fn into_data(self) -> Vec<T>;
    /// Get reference to pagination metadata
    fn meta(&self) -> Option<&PaginationMeta>;
}

/// Generic API list response wrapper for paginated endpoints
#[derive(Deserialize, Debug)]
pub struct ApiListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PaginationMeta>,
}

impl<T> PaginatedResponse<T> for ApiListResponse<T> {
    fn into_data(self) -> Vec<T> {
        self.data
    }

    fn meta(&self) -> Option<&PaginationMeta> {
        self.meta.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_list_response_meta() {
        let response: ApiListResponse<serde_json::Value> =
            serde_json::from_value(serde_json::json!({
                "data": [{"id": "item-1"}],
                "meta": {
                    "pagination": {
                        "current-page": 1,
                        "total-pages": 3,
                        "total-count": 5
                    }
                }
            }))
            .unwrap();
        let pagination = response.meta().unwrap().pagination.as_ref().unwrap();
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_count, 5);
    }

    #[test]
    fn test_api_list_response_without_meta() {
        let response: ApiListResponse<serde_json::Value> =
            serde_json::from_value(serde_json::json!({ "data": [] })).unwrap();
        assert!(response.meta().is_none());
        assert!(response.into_data().is_empty());
    }
}
