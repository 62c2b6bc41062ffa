//! hcpmigrate - Main entry point

use std::time::Duration;

use clap::Parser;
use log::{debug, error};

use hcpmigrate::migration::{
    run_apply_command, run_destroy_command, run_hash_command, run_plan_command,
    run_refresh_command, run_schema_command,
};
use hcpmigrate::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    debug!(
        "Starting hcpmigrate v{} (host={}, batch={}, timeout={}s)",
        env!("CARGO_PKG_VERSION"),
        cli.host,
        cli.batch,
        cli.timeout
    );

    let deadline = Duration::from_secs(cli.timeout);
    let outcome = tokio::time::timeout(deadline, run(&cli)).await;

    let code = match outcome {
        Ok(Ok(true)) => 0,
        Ok(Ok(false)) => 1,
        Ok(Err(e)) => {
            error!("{:?}", e);
            eprintln!("Error: {}", e);
            1
        }
        Err(_) => {
            eprintln!(
                "Error: command did not finish within {}s (see --timeout)",
                cli.timeout
            );
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> hcpmigrate::Result<bool> {
    match &cli.command {
        Command::Plan(args) => run_plan_command(cli, args).await,
        Command::Apply(args) => run_apply_command(cli, args).await,
        Command::Refresh(args) => run_refresh_command(cli, args).await,
        Command::Destroy(args) => run_destroy_command(cli, args).await,
        Command::Hash(args) => run_hash_command(args),
        Command::Schema(args) => run_schema_command(args),
    }
}
