//! CLI argument parsing

mod common;
mod migrate;

use clap::{Parser, Subcommand};

use crate::config::{defaults, env};

pub use common::{OutputFormat, PollArgs, ResourceArgs};
pub use migrate::{ApplyArgs, DestroyArgs, HashArgs, PlanArgs, RefreshArgs, SchemaArgs};

/// Migrate HCP Terraform workspaces into a Stack
#[derive(Parser, Debug)]
#[command(name = "hcpmigrate")]
#[command(version)]
#[command(about = "Migrate HCP Terraform workspaces into a Stack", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// HCP Terraform host
    #[arg(short = 'H', long, global = true, default_value = defaults::HOST)]
    pub host: String,

    /// API token (overrides env vars and credentials file)
    #[arg(short = 't', long, global = true)]
    pub token: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Batch mode: no spinners, no prompts
    #[arg(short, long, global = true, default_value_t = false)]
    pub batch: bool,

    /// Deadline for the whole command, in seconds
    #[arg(long, global = true, default_value_t = defaults::TIMEOUT_SECS)]
    pub timeout: u64,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what the next apply would do
    ///
    /// Refreshes the persisted state against HCP Terraform, then plans the
    /// migration declared in the migration file.
    ///
    /// Examples:
    ///   hcpmigrate plan -f migration.yaml
    ///   hcpmigrate plan -f migration.yaml -o json
    #[command(verbatim_doc_comment)]
    Plan(PlanArgs),

    /// Upload the stack configuration and migrate workspace state
    ///
    /// Creates the migration when no state file exists; otherwise runs
    /// the planned update strategy. A change of name, organization or
    /// project recreates the migration.
    ///
    /// Examples:
    ///   hcpmigrate apply -f migration.yaml
    ///   hcpmigrate apply -f migration.yaml --auto-approve --batch
    #[command(verbatim_doc_comment)]
    Apply(ApplyArgs),

    /// Refresh the persisted state from HCP Terraform
    ///
    /// Removes the state file when the target stack no longer exists.
    ///
    /// Examples:
    ///   hcpmigrate refresh
    ///   hcpmigrate refresh --state other.state.json
    #[command(verbatim_doc_comment)]
    Refresh(RefreshArgs),

    /// Forget the migration
    ///
    /// Only the local state file is removed. The stack, its
    /// configurations and deployments are left untouched.
    ///
    /// Examples:
    ///   hcpmigrate destroy --auto-approve
    #[command(verbatim_doc_comment)]
    Destroy(DestroyArgs),

    /// Print the fingerprint of a directory
    ///
    /// Examples:
    ///   hcpmigrate hash ./stack
    #[command(verbatim_doc_comment)]
    Hash(HashArgs),

    /// Print the attribute schema of the migration resource
    ///
    /// Examples:
    ///   hcpmigrate schema
    ///   hcpmigrate schema -o json
    #[command(verbatim_doc_comment)]
    Schema(SchemaArgs),
}

impl Cli {
    /// Log filter: `TF_MIGRATE_LOG_LEVEL` when `TF_MIGRATE_ENABLE_LOG` is truthy, else `--log-level`
    pub fn log_filter(&self) -> String {
        resolve_log_filter(
            &self.log_level,
            std::env::var(env::ENABLE_LOG).ok().as_deref(),
            std::env::var(env::LOG_LEVEL).ok().as_deref(),
        )
    }
}

fn resolve_log_filter(cli_level: &str, enable: Option<&str>, env_level: Option<&str>) -> String {
    let enabled = enable
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    match (enabled, env_level.map(str::trim).filter(|l| !l.is_empty())) {
        (true, Some(level)) => level.to_string(),
        (true, None) => "info".to_string(),
        (false, _) => cli_level.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["hcpmigrate", "plan"]);
        assert_eq!(cli.host, defaults::HOST);
        assert_eq!(cli.log_level, defaults::LOG_LEVEL);
        assert_eq!(cli.timeout, defaults::TIMEOUT_SECS);
        assert!(!cli.batch);
        assert!(cli.token.is_none());

        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.resource.file, PathBuf::from("migration.yaml"));
                assert_eq!(args.resource.state, PathBuf::from(defaults::STATE_FILE));
                assert_eq!(args.output, OutputFormat::Table);
                assert!(!args.poll.retry_abandoned);
            }
            other => panic!("Expected plan, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::parse_from([
            "hcpmigrate",
            "apply",
            "-f",
            "m.yaml",
            "--state",
            "s.json",
            "--auto-approve",
            "--retry-abandoned",
            "--group-poll-attempts",
            "3",
            "-o",
            "json",
            "--batch",
        ]);
        assert!(cli.batch);
        match cli.command {
            Command::Apply(args) => {
                assert!(args.auto_approve);
                assert_eq!(args.resource.file, PathBuf::from("m.yaml"));
                assert_eq!(args.resource.state, PathBuf::from("s.json"));
                assert_eq!(args.output, OutputFormat::Json);

                let options = args.poll.options();
                assert!(options.retry_abandoned);
                assert_eq!(options.poll.group_poll_attempts, 3);
                assert_eq!(options.poll.group_poll_interval, Duration::from_secs(10));
            }
            other => panic!("Expected apply, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["hcpmigrate", "refresh", "-t", "tok", "--timeout", "60"]);
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert_eq!(cli.timeout, 60);
    }

    #[test]
    fn test_hash_requires_dir() {
        assert!(Cli::try_parse_from(["hcpmigrate", "hash"]).is_err());
        let cli = Cli::parse_from(["hcpmigrate", "hash", "./stack"]);
        match cli.command {
            Command::Hash(args) => assert_eq!(args.dir, PathBuf::from("./stack")),
            other => panic!("Expected hash, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_log_filter() {
        assert_eq!(resolve_log_filter("warn", None, Some("trace")), "warn");
        assert_eq!(resolve_log_filter("warn", Some("0"), Some("trace")), "warn");
        assert_eq!(resolve_log_filter("warn", Some("true"), Some("trace")), "trace");
        assert_eq!(resolve_log_filter("warn", Some("1"), None), "info");
    }

    #[test]
    fn test_invalid_output_format() {
        assert!(Cli::try_parse_from(["hcpmigrate", "schema", "-o", "csv"]).is_err());
    }
}
