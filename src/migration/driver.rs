//! Per-workspace deployment driver
//!
//! One driver runs per `workspace -> deployment` pair. It walks the latest
//! deployment run through `allow-import` and `import-state`, converting and
//! uploading the workspace state on the way, then polls the deployment group
//! until it settles. Errors never escape a driver: they become the
//! workspace's `failure_reason`.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::archive;
use crate::config::LOCK_REASON;
use crate::error::{MigrateError, Result};
use crate::hcp::{
    DeploymentGroup, DeploymentGroupStatus, DeploymentRun, DeploymentStep, StepOperation,
    StepStatus, TerraformState, TfeClient,
};
use crate::rpc::{ConversionRequest, ConverterLauncher};

use super::model::{DeploymentGroupSnapshot, StackMigrationData};
use super::settings::MigrationOptions;
use super::stack_state::{StackState, ARCHIVE_ENTRY};

/// Shared inputs of every driver in one apply
pub struct DriverContext {
    pub client: Arc<TfeClient>,
    pub launcher: Arc<dyn ConverterLauncher>,
    pub organization: String,
    pub stack_id: String,
    /// Stack configuration directory handed to the converter
    pub config_dir: PathBuf,
    /// Components declared in the stack configuration
    pub components: BTreeSet<String>,
    pub options: MigrationOptions,
}

/// What to do with a step in a given status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Advance,
    UploadStateThenAdvance,
    Proceed,
}

/// Transition function over `(operation, status)`; every other pair is an error
pub fn next_action(operation: StepOperation, status: StepStatus) -> Result<StepAction> {
    use StepOperation::{AllowImport, ImportState};
    use StepStatus::{Completed, PendingOperator, Running};

    match (operation, status) {
        (AllowImport, PendingOperator) => Ok(StepAction::Advance),
        (AllowImport, Completed) => Ok(StepAction::Proceed),
        (ImportState, PendingOperator) => Ok(StepAction::Advance),
        (ImportState, Running) => Ok(StepAction::UploadStateThenAdvance),
        (ImportState, Completed) => Ok(StepAction::Proceed),
        (operation, status) => Err(MigrateError::Conflict(format!(
            "{} step is in unexpected status '{}'",
            operation, status
        ))),
    }
}

/// Run one driver per mapping entry concurrently and collect their results
pub async fn migrate_workspaces(
    ctx: Arc<DriverContext>,
    mapping: &BTreeMap<String, String>,
) -> BTreeMap<String, StackMigrationData> {
    let results: Arc<Mutex<BTreeMap<String, StackMigrationData>>> =
        Arc::new(Mutex::new(BTreeMap::new()));
    let mut tasks = JoinSet::new();

    for (workspace, deployment) in mapping {
        let ctx = Arc::clone(&ctx);
        let results = Arc::clone(&results);
        let workspace = workspace.clone();
        let deployment = deployment.clone();

        tasks.spawn(async move {
            let data = drive(&ctx, &workspace, &deployment).await;
            results.lock().await.insert(workspace, data);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Deployment driver task failed: {}", e);
        }
    }

    let mut collected = std::mem::take(&mut *results.lock().await);
    for (workspace, deployment) in mapping {
        collected.entry(workspace.clone()).or_insert_with(|| {
            let mut data = StackMigrationData::new(deployment);
            data.failure_reason = Some("deployment driver task aborted".to_string());
            data
        });
    }
    collected
}

/// Migrate one workspace; failures land in `failure_reason`
pub async fn drive(ctx: &DriverContext, workspace: &str, deployment: &str) -> StackMigrationData {
    let mut data = StackMigrationData::new(deployment);

    match run(ctx, workspace, deployment, &mut data).await {
        Ok(()) => info!(
            "Workspace {} migrated into deployment {} ({})",
            workspace, deployment, data.deployment_group.status
        ),
        Err(e) => {
            warn!(
                "Migration of workspace {} into deployment {} failed: {}",
                workspace, deployment, e
            );
            data.failure_reason = Some(e.to_string());
        }
    }
    data
}

fn record_group(data: &mut StackMigrationData, group: &DeploymentGroup) {
    data.deployment_group = DeploymentGroupSnapshot {
        id: group.id.clone(),
        status: group.status().to_string(),
    };
}

async fn read_run_group(
    client: &TfeClient,
    run: &DeploymentRun,
    deployment: &str,
) -> Result<DeploymentGroup> {
    let group_id = run.group_id().ok_or_else(|| {
        MigrateError::NotFound(format!(
            "deployment group of run '{}' for deployment '{}'",
            run.id, deployment
        ))
    })?;
    client.read_deployment_group(group_id).await
}

fn find_step<'a>(
    steps: &'a [DeploymentStep],
    operation: StepOperation,
    run_id: &str,
) -> Result<&'a DeploymentStep> {
    steps
        .iter()
        .find(|s| s.operation() == operation)
        .ok_or_else(|| {
            MigrateError::NotFound(format!("{} step in deployment run '{}'", operation, run_id))
        })
}

async fn run(
    ctx: &DriverContext,
    workspace_name: &str,
    deployment: &str,
    data: &mut StackMigrationData,
) -> Result<()> {
    let client = ctx.client.as_ref();

    let workspace = client
        .read_workspace(&ctx.organization, workspace_name)
        .await?
        .ok_or_else(|| {
            MigrateError::NotFound(format!(
                "workspace '{}' in organization '{}'",
                workspace_name, ctx.organization
            ))
        })?;
    data.workspace_id = workspace.id.clone();

    let mut run = client
        .read_latest_deployment_run(&ctx.stack_id, deployment)
        .await?;
    let mut group = read_run_group(client, &run, deployment).await?;
    record_group(data, &group);

    match group.status() {
        DeploymentGroupStatus::Succeeded => {
            debug!("Deployment {} already succeeded", deployment);
            return Ok(());
        }
        DeploymentGroupStatus::Abandoned if !ctx.options.retry_abandoned => {
            return Err(MigrateError::Conflict(format!(
                "deployment group '{}' was abandoned; fix the stack configuration and apply again",
                group.id
            )));
        }
        DeploymentGroupStatus::Abandoned | DeploymentGroupStatus::Failed => {
            client
                .rerun_deployment_group(&group.id, &[deployment.to_string()])
                .await?;
            run = client
                .read_latest_deployment_run(&ctx.stack_id, deployment)
                .await?;
            group = read_run_group(client, &run, deployment).await?;
            record_group(data, &group);
        }
        DeploymentGroupStatus::Pending | DeploymentGroupStatus::Deploying => {}
        DeploymentGroupStatus::Unknown => {
            return Err(MigrateError::Conflict(format!(
                "deployment group '{}' has an unrecognised status",
                group.id
            )));
        }
    }

    let steps = client.list_deployment_run_steps(&run.id).await?;
    let allow_import = find_step(&steps, StepOperation::AllowImport, &run.id)?;
    let import_state_id = find_step(&steps, StepOperation::ImportState, &run.id)?
        .id
        .clone();

    match next_action(allow_import.operation(), allow_import.status())? {
        StepAction::Advance => client.advance_deployment_step(&allow_import.id).await?,
        StepAction::Proceed => {}
        StepAction::UploadStateThenAdvance => {
            return Err(MigrateError::Conflict(
                "allow-import step cannot receive state".to_string(),
            ))
        }
    }

    let import_state = client.read_deployment_step(&import_state_id).await?;
    match next_action(import_state.operation(), import_state.status())? {
        StepAction::Advance => {
            client.advance_deployment_step(&import_state.id).await?;
            tokio::time::sleep(ctx.options.poll.step_quiescence).await;

            let advanced = client.read_deployment_step(&import_state.id).await?;
            if next_action(advanced.operation(), advanced.status())?
                == StepAction::UploadStateThenAdvance
            {
                convert_and_upload_state(ctx, &workspace.id, &advanced.id, data).await?;
                client.advance_deployment_step(&advanced.id).await?;
            }
        }
        StepAction::UploadStateThenAdvance => {
            convert_and_upload_state(ctx, &workspace.id, &import_state.id, data).await?;
            client.advance_deployment_step(&import_state.id).await?;
        }
        StepAction::Proceed => {}
    }

    let group = poll_group_status(ctx, &group.id).await?;
    record_group(data, &group);

    match group.status() {
        DeploymentGroupStatus::Succeeded => Ok(()),
        status => Err(MigrateError::Conflict(format!(
            "deployment group '{}' finished as {}",
            group.id, status
        ))),
    }
}

/// Poll the group until it leaves Pending/Deploying, within the attempt budget
async fn poll_group_status(ctx: &DriverContext, group_id: &str) -> Result<DeploymentGroup> {
    let poll = &ctx.options.poll;

    for attempt in 1..=poll.group_poll_attempts {
        let group = ctx.client.read_deployment_group(group_id).await?;
        if !group.status().is_running() {
            return Ok(group);
        }

        debug!(
            "Deployment group {} is {} (attempt {}/{})",
            group_id,
            group.status(),
            attempt,
            poll.group_poll_attempts
        );
        if attempt < poll.group_poll_attempts {
            tokio::time::sleep(poll.group_poll_interval).await;
        }
    }

    Err(MigrateError::Conflict(format!(
        "deployment group '{}' did not finish after {} status checks",
        group_id, poll.group_poll_attempts
    )))
}

/// Lock the workspace, convert its state and upload it; always unlock
async fn convert_and_upload_state(
    ctx: &DriverContext,
    workspace_id: &str,
    step_id: &str,
    data: &mut StackMigrationData,
) -> Result<()> {
    ctx.client.lock_workspace(workspace_id, LOCK_REASON).await?;
    debug!("Workspace {} locked", workspace_id);

    let result = convert_and_upload_locked(ctx, workspace_id, step_id, data).await;

    if let Err(e) = ctx.client.unlock_workspace(workspace_id).await {
        warn!("Failed to unlock workspace {}: {}", workspace_id, e);
        data.warnings
            .push(format!("workspace {} may still be locked: {}", workspace_id, e));
    } else {
        debug!("Workspace {} unlocked", workspace_id);
    }

    result
}

async fn convert_and_upload_locked(
    ctx: &DriverContext,
    workspace_id: &str,
    step_id: &str,
    data: &mut StackMigrationData,
) -> Result<()> {
    let raw_state = ctx.client.download_current_state(workspace_id).await?;
    let state = TerraformState::from_bytes(&raw_state)?;
    let maps = address_maps(&state, &ctx.components)?;
    data.warnings.extend(maps.warnings);

    tokio::time::sleep(ctx.options.poll.step_quiescence).await;
    let step = ctx.client.read_deployment_step(step_id).await?;
    let upload_url = step
        .upload_url()
        .ok_or_else(|| {
            MigrateError::NotFound(format!("upload URL of import-state step '{}'", step_id))
        })?
        .to_string();

    let request = ConversionRequest {
        raw_state,
        config_dir: ctx.config_dir.clone(),
        resource_address_map: maps.resources,
        module_address_map: maps.modules,
    };
    let stack_state = convert(ctx.launcher.as_ref(), &request).await?;
    info!(
        "Converted state of workspace {} into {} stack objects",
        workspace_id,
        stack_state.raw.len()
    );

    // The temp file is removed when it goes out of scope
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&stack_state.to_json()?)?;
    file.flush()?;
    let archive = archive::tar_gz_file(file.path(), ARCHIVE_ENTRY).await?;

    ctx.client.upload_stack_state(&upload_url, archive).await
}

/// Launch a converter, run one conversion and stop the converter
async fn convert(launcher: &dyn ConverterLauncher, request: &ConversionRequest) -> Result<StackState> {
    let mut converter = launcher.launch().await?;
    let events = converter.migrate_terraform_state(request).await;

    if let Err(e) = converter.stop().await {
        warn!("Failed to stop state converter: {}", e);
    }

    StackState::from_events(&events?)
}

/// Address maps handed to the converter; exactly one of them is used
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AddressMaps {
    pub resources: BTreeMap<String, String>,
    pub modules: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

/// Build the address maps for a downloaded state
///
/// Modular state maps every top-level `module.X` to `component.X`. Flat state
/// maps every managed `TYPE.NAME` into the single declared component.
pub fn address_maps(state: &TerraformState, components: &BTreeSet<String>) -> Result<AddressMaps> {
    let mut maps = AddressMaps::default();

    if state.is_modular() {
        let mut root_resources = 0;
        for resource in &state.resources {
            match resource.top_level_module() {
                Some(module) => {
                    maps.modules
                        .insert(format!("module.{}", module), format!("component.{}", module));
                }
                None => root_resources += 1,
            }
        }
        if root_resources > 0 {
            maps.warnings.push(format!(
                "{} root module resources are not mapped to any component",
                root_resources
            ));
        }
        return Ok(maps);
    }

    let managed: Vec<_> = state
        .resources
        .iter()
        .filter(|r| r.mode != "data")
        .collect();
    if managed.is_empty() {
        return Ok(maps);
    }

    let component = match components.len() {
        1 => components.iter().next().map(String::as_str).unwrap_or_default(),
        n => {
            return Err(MigrateError::Validation(format!(
                "state without modules needs exactly one component in the stack configuration, found {}",
                n
            )))
        }
    };

    for resource in managed {
        let address = resource.local_address();
        maps.resources
            .insert(address.clone(), format!("component.{}.{}", component, address));
    }
    Ok(maps)
}
