//! Project API operations

use log::debug;

use crate::config::api;
use crate::error::Result;
use crate::hcp::traits::{ApiListResponse, TfeResource};
use crate::hcp::TfeClient;

use super::models::Project;

impl TfeClient {
    /// Read a project by exact name within an organization
    ///
    /// Uses the server-side `filter[names]` parameter, then matches the name
    /// exactly since the filter is case-insensitive.
    pub async fn read_project(&self, org: &str, name: &str) -> Result<Option<Project>> {
        let path = format!(
            "/{}/{}/{}?filter[names]={}",
            api::ORGANIZATIONS,
            urlencoding::encode(org),
            api::PROJECTS,
            urlencoding::encode(name)
        );
        let error_context = format!("project '{}' in organization '{}'", name, org);

        let projects = self
            .fetch_all_pages::<Project, ApiListResponse<Project>>(&path, &error_context)
            .await?;

        debug!(
            "Project lookup for '{}' returned {} candidates",
            name,
            projects.len()
        );
        Ok(projects.into_iter().find(|p| p.name() == name))
    }
}
