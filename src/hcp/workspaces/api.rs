//! Workspace API operations

use log::debug;

use crate::config::api;
use crate::error::{MigrateError, Result};
use crate::hcp::TfeClient;

use super::models::Workspace;

impl TfeClient {
    /// Read a workspace by name within an organization
    pub async fn read_workspace(&self, org: &str, name: &str) -> Result<Option<Workspace>> {
        let path = format!(
            "/{}/{}/{}/{}",
            api::ORGANIZATIONS,
            urlencoding::encode(org),
            api::WORKSPACES,
            urlencoding::encode(name)
        );
        Ok(self
            .fetch_resource_by_path::<Workspace>(&path, &format!("workspace '{}'", name))
            .await?
            .map(|(ws, _raw)| ws))
    }

    /// Lock a workspace to prevent concurrent modifications
    pub async fn lock_workspace(&self, workspace_id: &str, reason: &str) -> Result<()> {
        let path = format!("/{}/{}/actions/lock", api::WORKSPACES, workspace_id);

        debug!("Locking workspace {}: {}", workspace_id, reason);

        self.post_action(
            &path,
            Some(serde_json::json!({ "reason": reason })),
            &format!("lock workspace '{}'", workspace_id),
        )
        .await
        .map_err(|e| match e {
            MigrateError::Conflict(_) => MigrateError::Conflict(format!(
                "Workspace '{}' is already locked or has an active run",
                workspace_id
            )),
            other => other,
        })?;
        Ok(())
    }

    /// Unlock a workspace
    pub async fn unlock_workspace(&self, workspace_id: &str) -> Result<()> {
        let path = format!("/{}/{}/actions/unlock", api::WORKSPACES, workspace_id);

        debug!("Unlocking workspace: {}", workspace_id);

        self.post_action(&path, None, &format!("unlock workspace '{}'", workspace_id))
            .await
            .map_err(|e| match e {
                MigrateError::Conflict(_) => MigrateError::Conflict(format!(
                    "Workspace '{}' is not locked or locked by another user/run",
                    workspace_id
                )),
                other => other,
            })?;
        Ok(())
    }
}
