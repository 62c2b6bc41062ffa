//! Lifecycle command handlers

use std::sync::Arc;

use log::{debug, info};

use crate::cli::{ApplyArgs, Cli, DestroyArgs, HashArgs, PlanArgs, RefreshArgs, SchemaArgs};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::hcp::{ProviderConfig, TfeClient};
use crate::output::{
    output_applied, output_diagnostics, output_plan, output_schema, output_state,
};
use crate::rpc::TerraformRpcLauncher;
use crate::state::StateStore;
use crate::ui::{confirm_action, create_spinner, finish_spinner, finish_spinner_with_status};

use super::fingerprint;
use super::manifest;
use super::model::{PlannedChange, Refreshed, StackMigrationResource, UpdateStrategy};
use super::schema;
use super::settings::MigrationOptions;
use super::StackMigrationController;

/// Build a controller from the global connection flags
fn controller(cli: &Cli, options: MigrationOptions) -> Result<StackMigrationController> {
    let provider = ProviderConfig::configure(Some(&cli.host), cli.token.as_deref())?;
    debug!("Configured provider for host {}", provider.hostname);

    let client = Arc::new(TfeClient::new(provider.token, provider.hostname));
    let launcher = Arc::new(TerraformRpcLauncher::from_env());
    Ok(StackMigrationController::new(client, launcher, options))
}

/// Desired resource, persisted state refreshed against the remote, and the plan
struct Planned {
    desired: StackMigrationResource,
    prior: Option<StackMigrationResource>,
    change: PlannedChange,
    diagnostics: Diagnostics,
}

/// Load, validate, refresh and plan. `None` when validation failed.
async fn plan_migration(
    controller: &StackMigrationController,
    store: &StateStore,
    file: &std::path::Path,
    batch: bool,
) -> Result<Option<Planned>> {
    let desired = manifest::load_resource(file)?;
    let mut diagnostics = controller.validate(&desired);
    if diagnostics.has_errors() {
        output_diagnostics(&diagnostics);
        return Ok(None);
    }

    let spinner = create_spinner(
        &format!("Planning stack migration {}...", desired.target()),
        batch,
    );

    let prior = match store.load()? {
        Some(state) => match controller.read(&state).await? {
            Refreshed::Present {
                state,
                diagnostics: refresh_diagnostics,
            } => {
                diagnostics.extend(refresh_diagnostics);
                Some(state)
            }
            Refreshed::Gone => {
                info!(
                    "{} no longer exists; planning a new migration",
                    state.target()
                );
                None
            }
        },
        None => None,
    };

    let change = controller.modify_plan(&desired, prior.as_ref()).await;
    finish_spinner(spinner, "Plan ready");
    let change = change?;

    diagnostics.extend(change.diagnostics.clone());
    Ok(Some(Planned {
        desired,
        prior,
        change,
        diagnostics,
    }))
}

/// Run the plan command
pub async fn run_plan_command(cli: &Cli, args: &PlanArgs) -> Result<bool> {
    let controller = controller(cli, args.poll.options())?;
    let store = StateStore::new(args.resource.state.clone());

    let Some(planned) =
        plan_migration(&controller, &store, &args.resource.file, cli.batch).await?
    else {
        return Ok(false);
    };

    output_plan(
        controller.metadata(),
        &planned.change,
        planned.prior.as_ref(),
        &args.output,
    );
    output_diagnostics(&planned.diagnostics);
    Ok(!planned.diagnostics.has_errors())
}

/// Run the apply command
pub async fn run_apply_command(cli: &Cli, args: &ApplyArgs) -> Result<bool> {
    let controller = controller(cli, args.poll.options())?;
    let store = StateStore::new(args.resource.state.clone());

    let Some(planned) =
        plan_migration(&controller, &store, &args.resource.file, cli.batch).await?
    else {
        return Ok(false);
    };
    let Planned {
        desired,
        prior,
        change,
        mut diagnostics,
    } = planned;

    if diagnostics.has_errors() {
        output_plan(controller.metadata(), &change, prior.as_ref(), &args.output);
        output_diagnostics(&diagnostics);
        return Ok(false);
    }

    let no_changes = matches!(change.strategy(), Some(UpdateStrategy::NoAction));
    if no_changes {
        println!("No changes. {} is up to date.", desired.target());
    } else {
        output_plan(controller.metadata(), &change, prior.as_ref(), &args.output);
        let approved = confirm_action(
            &format!("Apply stack migration {}?", desired.target()),
            cli.batch,
            args.auto_approve,
        )?;
        if !approved {
            println!("Apply cancelled.");
            return Ok(false);
        }
    }

    let spinner = create_spinner(
        &format!("Applying stack migration {}...", desired.target()),
        cli.batch || no_changes,
    );

    let applied = match (prior.as_ref(), change.strategy()) {
        (Some(state), Some(UpdateStrategy::RequiresReplace)) => {
            info!("Replacing stack migration {}", state.target());
            diagnostics.extend(controller.delete(state));
            store.remove()?;
            controller.create(&desired).await
        }
        (Some(state), Some(_)) => controller.update(&change, state).await,
        _ => controller.create(&desired).await,
    };

    let applied = match applied {
        Ok(applied) => applied,
        Err(e) => {
            finish_spinner_with_status(spinner, true);
            return Err(e);
        }
    };
    finish_spinner_with_status(spinner, applied.diagnostics.has_errors());

    store.save(&applied.state)?;
    diagnostics.extend(applied.diagnostics.clone());

    if !no_changes {
        output_applied(
            &applied.state,
            &applied.migrations,
            &diagnostics,
            &args.output,
        );
    }
    output_diagnostics(&diagnostics);
    Ok(!diagnostics.has_errors())
}

/// Run the refresh command
pub async fn run_refresh_command(cli: &Cli, args: &RefreshArgs) -> Result<bool> {
    let store = StateStore::new(args.state.clone());
    let Some(state) = store.load()? else {
        println!(
            "No state at {}; nothing to refresh.",
            store.path().display()
        );
        return Ok(true);
    };

    let controller = controller(cli, MigrationOptions::default())?;
    let spinner = create_spinner(&format!("Refreshing {}...", state.target()), cli.batch);
    let refreshed = controller.read(&state).await;
    finish_spinner(spinner, "Refreshed");

    match refreshed? {
        Refreshed::Present { state, diagnostics } => {
            store.save(&state)?;
            output_state(&state, &args.output);
            output_diagnostics(&diagnostics);
            Ok(!diagnostics.has_errors())
        }
        Refreshed::Gone => {
            store.remove()?;
            println!(
                "Stack {} no longer exists; removed {}.",
                state.target(),
                store.path().display()
            );
            Ok(true)
        }
    }
}

/// Run the destroy command
pub async fn run_destroy_command(cli: &Cli, args: &DestroyArgs) -> Result<bool> {
    let store = StateStore::new(args.state.clone());
    let Some(state) = store.load()? else {
        println!("No state at {}; nothing to destroy.", store.path().display());
        return Ok(true);
    };

    let approved = confirm_action(
        &format!("Forget stack migration {}?", state.target()),
        cli.batch,
        args.auto_approve,
    )?;
    if !approved {
        println!("Destroy cancelled.");
        return Ok(false);
    }

    let controller = controller(cli, MigrationOptions::default())?;
    let diagnostics = controller.delete(&state);
    store.remove()?;

    println!("Removed {}.", store.path().display());
    output_diagnostics(&diagnostics);
    Ok(!diagnostics.has_errors())
}

/// Run the hash command
pub fn run_hash_command(args: &HashArgs) -> Result<bool> {
    println!("{}", fingerprint::hash_directory(&args.dir)?);
    Ok(true)
}

/// Run the schema command
pub fn run_schema_command(args: &SchemaArgs) -> Result<bool> {
    output_schema(schema::RESOURCE_TYPE_NAME, schema::ATTRIBUTES, &args.output);
    Ok(true)
}
