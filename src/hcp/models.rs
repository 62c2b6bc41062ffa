//! Shared JSON:API models used across HCP resources

use serde::Deserialize;

/// Pagination metadata from TFE API (shared across resources)
#[derive(Deserialize, Debug, Default, Clone)]
pub struct PaginationMeta {
    pub pagination: Option<Pagination>,
}

/// Pagination details
#[derive(Deserialize, Debug, Clone)]
pub struct Pagination {
    #[serde(rename = "current-page")]
    pub current_page: u32,
    #[serde(rename = "total-pages")]
    pub total_pages: u32,
    #[serde(rename = "total-count")]
    pub total_count: u32,
}

/// Generic relationship data
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RelationshipData {
    pub data: Option<RelationshipId>,
}

impl RelationshipData {
    /// Related object ID, if the relationship is populated
    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.id.as_str())
    }
}

/// Relationship ID reference
#[derive(Deserialize, Debug, Clone)]
pub struct RelationshipId {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: Option<String>,
}

/// Single-resource response wrapper (`{"data": {...}}`)
#[derive(Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_id_present() {
        let rel: RelationshipData = serde_json::from_value(serde_json::json!({
            "data": {"id": "prj-123", "type": "projects"}
        }))
        .unwrap();
        assert_eq!(rel.id(), Some("prj-123"));
    }

    #[test]
    fn test_relationship_id_null() {
        let rel: RelationshipData =
            serde_json::from_value(serde_json::json!({ "data": null })).unwrap();
        assert!(rel.id().is_none());
    }
}
