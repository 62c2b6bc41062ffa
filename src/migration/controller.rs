//! Stack migration controller
//!
//! Lifecycle operations of the `tfmigrate_stack_migration` resource. Each
//! operation refetches the remote target; nothing is cached between calls.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{MigrateError, Result};
use crate::hcp::{
    DeploymentGroup, Stack, StackConfiguration, StackConfigurationStatus, TfeClient,
};
use crate::rpc::ConverterLauncher;

use super::driver::{self, DriverContext};
use super::fingerprint;
use super::model::{
    Applied, Attr, PlannedAction, PlannedChange, Refreshed, StackMigrationData,
    StackMigrationResource, UpdateStrategy,
};
use super::preconditions::{self, ResolvedTarget};
use super::schema::{self, AttributeSchema};
use super::settings::MigrationOptions;
use super::strategy::{self, LatestRollout, StrategyInputs};
use super::watcher;

/// Latest stack configuration together with its deployment groups
struct LatestConfiguration {
    configuration: StackConfiguration,
    groups: Vec<DeploymentGroup>,
}

/// Drives the lifecycle of one stack migration resource type
pub struct StackMigrationController {
    client: Arc<TfeClient>,
    launcher: Arc<dyn ConverterLauncher>,
    options: MigrationOptions,
}

impl StackMigrationController {
    pub fn new(
        client: Arc<TfeClient>,
        launcher: Arc<dyn ConverterLauncher>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            client,
            launcher,
            options,
        }
    }

    /// Resource type name
    pub fn metadata(&self) -> &'static str {
        schema::RESOURCE_TYPE_NAME
    }

    /// Attribute table of the resource
    pub fn schema(&self) -> &'static [AttributeSchema] {
        schema::ATTRIBUTES
    }

    /// Static validation of user-supplied attributes
    pub fn validate(&self, plan: &StackMigrationResource) -> Diagnostics {
        preconditions::validate(plan)
    }

    /// Decide what the next apply does and compute the planned values
    pub async fn modify_plan(
        &self,
        plan: &StackMigrationResource,
        state: Option<&StackMigrationResource>,
    ) -> Result<PlannedChange> {
        let Some(state) = state else {
            return Ok(PlannedChange {
                resource: plan.clone().with_unknown_computed(),
                action: PlannedAction::Create,
                diagnostics: Diagnostics::new(),
            });
        };

        let triggers = schema::replace_triggers(state, plan);
        if !triggers.is_empty() {
            info!("Changes to {:?} force replacement", triggers);
            return Ok(PlannedChange {
                resource: plan.clone().with_unknown_computed(),
                action: PlannedAction::Update(UpdateStrategy::RequiresReplace),
                diagnostics: Diagnostics::new(),
            });
        }

        let (_, _, stack) = preconditions::resolve_target(&self.client, plan)
            .await?
            .ok_or_else(|| stack_not_found(plan))?;
        let latest = self.read_latest_configuration(&stack).await?;
        let upload_allowed = watcher::allow_source_bundle_upload(
            latest.as_ref().map(|l| &l.configuration),
            latest.as_ref().map(|l| l.groups.as_slice()).unwrap_or_default(),
        );

        let source_bundle_hash = fingerprint::hash_directory(&plan.config_file_dir)?;
        let terraform_config_hash = fingerprint::hash_directory(&plan.terraform_config_dir)?;

        let inputs = StrategyInputs {
            config_files_changed: state.source_bundle_hash.value() != Some(&source_bundle_hash)
                || state.terraform_config_hash.value() != Some(&terraform_config_hash),
            mapping_changed: state.workspace_deployment_mapping
                != plan.workspace_deployment_mapping,
            upload_allowed,
            latest: latest.as_ref().map(|l| LatestRollout {
                configuration_id: l.configuration.id.clone(),
                status: l.configuration.status(),
                groups: l.groups.iter().map(|g| g.status()).collect(),
            }),
            recorded_configuration_id: state.current_configuration_id.value().cloned(),
        };
        let strategy = strategy::decide(&inputs);
        debug!("Update strategy for {}: {}", plan.target(), strategy);

        let mut resource = state.with_user_attributes(plan);
        let mut diagnostics = Diagnostics::new();

        match &strategy {
            UpdateStrategy::ApplyNewConfiguration => {
                resource.current_configuration_id = Attr::Unknown;
                resource.current_configuration_status = Attr::Unknown;
                resource.source_bundle_hash = Attr::Present(source_bundle_hash);
                resource.terraform_config_hash = Attr::Present(terraform_config_hash);
                resource.migration_hash = Attr::Unknown;
            }
            UpdateStrategy::RetryFailedDeployments => {
                resource.migration_hash = Attr::Unknown;
                if inputs.config_files_changed || inputs.mapping_changed {
                    diagnostics.add_warning(
                        "Configuration change deferred",
                        format!(
                            "The rollout of stack configuration {} is resumed first; apply again to upload the change",
                            resource.current_configuration_id
                        ),
                    );
                }
            }
            UpdateStrategy::WaitForCompletion(reason) => {
                diagnostics.add_error(
                    "Stack rollout in progress",
                    format!(
                        "{}; wait for it to finish before applying {}",
                        reason,
                        plan.target()
                    ),
                );
            }
            UpdateStrategy::NoAction | UpdateStrategy::RequiresReplace => {}
        }

        Ok(PlannedChange {
            resource,
            action: PlannedAction::Update(strategy),
            diagnostics,
        })
    }

    /// Create the migration: upload, watch, migrate every workspace
    pub async fn create(&self, plan: &StackMigrationResource) -> Result<Applied> {
        let target = preconditions::check(&self.client, plan).await?;
        self.apply_stack_configuration(plan, &target, true, Attr::Missing)
            .await
    }

    /// Run the strategy chosen by [`Self::modify_plan`]
    pub async fn update(
        &self,
        planned: &PlannedChange,
        state: &StackMigrationResource,
    ) -> Result<Applied> {
        let Some(strategy) = planned.strategy() else {
            return self.create(&planned.resource).await;
        };
        let desired = &planned.resource;

        match strategy {
            UpdateStrategy::NoAction => Ok(Applied {
                state: state.with_user_attributes(desired),
                migrations: BTreeMap::new(),
                diagnostics: Diagnostics::new(),
            }),
            UpdateStrategy::WaitForCompletion(reason) => {
                Err(MigrateError::Conflict(reason.clone()))
            }
            UpdateStrategy::RequiresReplace => Err(MigrateError::Validation(format!(
                "{} must be replaced; destroy it and create it again",
                desired.target()
            ))),
            UpdateStrategy::ApplyNewConfiguration => {
                let target = preconditions::check(&self.client, desired).await?;
                self.apply_stack_configuration(
                    desired,
                    &target,
                    true,
                    state.migration_hash.clone(),
                )
                .await
            }
            UpdateStrategy::RetryFailedDeployments => {
                let target = preconditions::check(&self.client, desired).await?;
                // Finish the rollout as it was uploaded; changes land on the next apply
                let resumed = StackMigrationResource {
                    workspace_deployment_mapping: state.workspace_deployment_mapping.clone(),
                    source_bundle_hash: state.source_bundle_hash.clone(),
                    terraform_config_hash: state.terraform_config_hash.clone(),
                    ..desired.clone()
                };
                self.apply_stack_configuration(
                    &resumed,
                    &target,
                    false,
                    state.migration_hash.clone(),
                )
                .await
            }
        }
    }

    /// Refresh the persisted state from the remote
    ///
    /// Persisted hashes are never replaced here; drift only shows up as a warning.
    pub async fn read(&self, state: &StackMigrationResource) -> Result<Refreshed> {
        let stack = match preconditions::resolve_target(&self.client, state).await {
            Ok(Some((_, _, stack))) => stack,
            Ok(None) | Err(MigrateError::NotFound(_)) => {
                warn!("{} no longer exists remotely", state.target());
                return Ok(Refreshed::Gone);
            }
            Err(e) => return Err(e),
        };

        let mut refreshed = state.clone();
        let mut diagnostics = Diagnostics::new();

        match stack.latest_configuration_id() {
            Some(id) => {
                let configuration = self.client.read_stack_configuration(id).await?;
                refreshed.current_configuration_status =
                    Attr::Present(configuration.status().to_string());
                refreshed.current_configuration_id = Attr::Present(configuration.id);
            }
            None => {
                refreshed.current_configuration_id = Attr::Missing;
                refreshed.current_configuration_status = Attr::Missing;
            }
        }

        for (attribute, dir, persisted) in [
            (
                "source_bundle_hash",
                &state.config_file_dir,
                &state.source_bundle_hash,
            ),
            (
                "terraform_config_hash",
                &state.terraform_config_dir,
                &state.terraform_config_hash,
            ),
        ] {
            if let Some(detail) = hash_drift(attribute, dir, persisted) {
                diagnostics.add_warning("Configuration drift", detail);
            }
        }

        Ok(Refreshed::Present {
            state: refreshed,
            diagnostics,
        })
    }

    /// Forget the migration; the remote stack is left untouched
    pub fn delete(&self, state: &StackMigrationResource) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning(
            "Stack migration removed from state only",
            format!(
                "Stack {} and its deployments were not modified. Destroying a migrated stack is not supported.",
                state.target()
            ),
        );
        diagnostics
    }

    /// Upload (or reuse) a configuration, wait for it and migrate workspaces
    async fn apply_stack_configuration(
        &self,
        desired: &StackMigrationResource,
        target: &ResolvedTarget,
        upload: bool,
        prior_migration_hash: Attr<String>,
    ) -> Result<Applied> {
        let mut state = desired.clone();
        state.terraform_config_hash = config_hash(
            upload,
            &desired.terraform_config_hash,
            &desired.terraform_config_dir,
        )?;
        state.migration_hash = match prior_migration_hash {
            Attr::Present(hash) => Attr::Present(hash),
            _ => Attr::Missing,
        };

        let configuration_id = if upload {
            self.ensure_upload_allowed(&target.stack).await?;
            let poll = &self.options.poll;
            self.client
                .upload_stack_config(
                    &target.stack.id,
                    &desired.config_file_dir,
                    poll.source_poll_attempts,
                    poll.source_poll_interval,
                )
                .await?
        } else {
            target
                .stack
                .latest_configuration_id()
                .ok_or_else(|| {
                    MigrateError::NotFound(format!(
                        "latest configuration of stack '{}'",
                        target.stack.id
                    ))
                })?
                .to_string()
        };
        state.source_bundle_hash =
            config_hash(upload, &desired.source_bundle_hash, &desired.config_file_dir)?;
        state.current_configuration_id = Attr::Present(configuration_id.clone());

        let status =
            watcher::watch_until_terminal(&self.client, &configuration_id, &self.options.poll)
                .await;
        state.current_configuration_status = Attr::Present(status.to_string());

        let mut diagnostics = Diagnostics::new();
        match status {
            StackConfigurationStatus::Completed => {}
            StackConfigurationStatus::Failed => {
                diagnostics.extend(self.configuration_errors(&configuration_id).await);
                return Ok(Applied {
                    state,
                    migrations: BTreeMap::new(),
                    diagnostics,
                });
            }
            status => {
                diagnostics.add_warning(
                    "Stack configuration not yet ready for state upload",
                    format!(
                        "Stack configuration {} is {}; apply again once it has completed",
                        configuration_id, status
                    ),
                );
                return Ok(Applied {
                    state,
                    migrations: BTreeMap::new(),
                    diagnostics,
                });
            }
        }

        let ctx = Arc::new(DriverContext {
            client: Arc::clone(&self.client),
            launcher: Arc::clone(&self.launcher),
            organization: desired.organization.clone(),
            stack_id: target.stack.id.clone(),
            config_dir: desired.config_file_dir.clone(),
            components: target.declarations.components.clone(),
            options: self.options.clone(),
        });
        info!(
            "Migrating {} workspaces into stack {}",
            desired.workspace_deployment_mapping.len(),
            target.stack.id
        );
        let migrations =
            driver::migrate_workspaces(ctx, &desired.workspace_deployment_mapping).await;

        state.migration_hash = Attr::Present(fingerprint::hash_migration_data(&migrations)?);
        diagnostics.extend(migration_diagnostics(&migrations));

        Ok(Applied {
            state,
            migrations,
            diagnostics,
        })
    }

    async fn read_latest_configuration(&self, stack: &Stack) -> Result<Option<LatestConfiguration>> {
        let Some(id) = stack.latest_configuration_id() else {
            return Ok(None);
        };
        let configuration = self.client.read_stack_configuration(id).await?;
        let groups = self.client.list_deployment_groups(id).await?;
        Ok(Some(LatestConfiguration {
            configuration,
            groups,
        }))
    }

    async fn ensure_upload_allowed(&self, stack: &Stack) -> Result<()> {
        let latest = self.read_latest_configuration(stack).await?;
        let allowed = watcher::allow_source_bundle_upload(
            latest.as_ref().map(|l| &l.configuration),
            latest.as_ref().map(|l| l.groups.as_slice()).unwrap_or_default(),
        );
        if allowed {
            return Ok(());
        }
        Err(MigrateError::Conflict(format!(
            "stack '{}' has a rollout in progress; a new source bundle cannot be uploaded yet",
            stack.id
        )))
    }

    /// Error diagnostics for a failed configuration
    async fn configuration_errors(&self, configuration_id: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        match self.client.read_stack_diagnostics(configuration_id).await {
            Ok(remote) => {
                for d in &remote {
                    diagnostics.push(Diagnostic::from(d));
                }
            }
            Err(e) => warn!(
                "Failed to read diagnostics of stack configuration {}: {}",
                configuration_id, e
            ),
        }

        if !diagnostics.has_errors() {
            diagnostics.add_error(
                "Stack configuration failed",
                format!(
                    "Stack configuration {} failed; check its diagnostics in HCP Terraform",
                    configuration_id
                ),
            );
        }
        diagnostics
    }
}

fn stack_not_found(resource: &StackMigrationResource) -> MigrateError {
    MigrateError::NotFound(format!(
        "stack '{}' in project '{}' of organization '{}'",
        resource.name, resource.project, resource.organization
    ))
}

/// Drift warning for one directory hash, if any
fn hash_drift(attribute: &str, dir: &Path, persisted: &Attr<String>) -> Option<String> {
    match fingerprint::hash_directory(dir) {
        Ok(fresh) if persisted.value().is_some_and(|p| *p != fresh) => Some(format!(
            "{} of {} changed since the last apply; the next plan will upload it again",
            attribute,
            dir.display()
        )),
        Ok(_) => None,
        Err(e) => Some(format!("{} could not be recomputed: {}", attribute, e)),
    }
}

/// Fresh hash of `dir`, or the persisted one when no bundle is uploaded
fn config_hash(upload: bool, persisted: &Attr<String>, dir: &Path) -> Result<Attr<String>> {
    match persisted {
        Attr::Present(hash) if !upload => Ok(Attr::Present(hash.clone())),
        _ => Ok(Attr::Present(fingerprint::hash_directory(dir)?)),
    }
}

/// Errors for failed workspaces and warnings collected by the drivers
fn migration_diagnostics(migrations: &BTreeMap<String, StackMigrationData>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for (workspace, data) in migrations {
        for warning in &data.warnings {
            diagnostics.add_warning(
                format!("Workspace {}", workspace),
                warning.clone(),
            );
        }
        if let Some(reason) = &data.failure_reason {
            diagnostics.add_error(
                "Workspace migration failed",
                format!(
                    "{} -> {}: {}",
                    workspace, data.deployment_name, reason
                ),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::model::DeploymentGroupSnapshot;

    #[test]
    fn test_migration_diagnostics() {
        let mut ok = StackMigrationData::new("dep_a");
        ok.warnings.push("2 root module resources are not mapped".to_string());
        ok.deployment_group = DeploymentGroupSnapshot {
            id: "sdg-1".to_string(),
            status: "succeeded".to_string(),
        };
        let mut failed = StackMigrationData::new("dep_b");
        failed.failure_reason = Some("Conflict: import-state step failed".to_string());

        let migrations = BTreeMap::from([
            ("ws-a".to_string(), ok),
            ("ws-b".to_string(), failed),
        ]);
        let diagnostics = migration_diagnostics(&migrations);

        assert_eq!(diagnostics.warnings().count(), 1);
        let errors: Vec<_> = diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].detail.starts_with("ws-b -> dep_b"));
    }

    #[test]
    fn test_hash_drift() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "resource {}").unwrap();
        let fresh = fingerprint::hash_directory(dir.path()).unwrap();

        assert!(hash_drift("h", dir.path(), &Attr::Present(fresh)).is_none());
        assert!(hash_drift("h", dir.path(), &Attr::Missing).is_none());
        assert!(hash_drift("h", dir.path(), &Attr::Present("stale".to_string())).is_some());
        assert!(hash_drift("h", &dir.path().join("gone"), &Attr::Missing).is_some());
    }

    fn offline_controller() -> StackMigrationController {
        StackMigrationController::new(
            Arc::new(TfeClient::test_client("http://127.0.0.1:9")),
            Arc::new(crate::rpc::TerraformRpcLauncher::new("terraform")),
            MigrationOptions::default(),
        )
    }

    #[test]
    fn test_metadata_and_schema() {
        let controller = offline_controller();
        assert_eq!(controller.metadata(), "tfmigrate_stack_migration");
        assert!(controller
            .schema()
            .iter()
            .any(|a| a.name == "migration_hash" && a.computed));
    }

    #[test]
    fn test_delete_is_warning_only() {
        let state = StackMigrationResource::new(
            std::path::PathBuf::from("/a"),
            std::path::PathBuf::from("/b"),
            "net",
            "acme",
            "platform",
            BTreeMap::from([("ws".to_string(), "dep".to_string())]),
        );
        let diagnostics = offline_controller().delete(&state);
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics
            .iter()
            .all(|d| d.detail.contains("acme/platform/net")));
    }
}
