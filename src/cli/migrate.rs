//! Lifecycle command arguments

use std::path::PathBuf;

use clap::Parser;

use super::common::{OutputFormat, PollArgs, ResourceArgs};

/// Arguments for 'plan'
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'apply'
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Skip the confirmation prompt
    #[arg(long, default_value_t = false)]
    pub auto_approve: bool,
}

/// Arguments for 'refresh'
#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// State file holding the persisted migration attributes
    #[arg(short = 's', long = "state", default_value = crate::config::defaults::STATE_FILE)]
    pub state: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'destroy'
#[derive(Parser, Debug)]
pub struct DestroyArgs {
    /// State file holding the persisted migration attributes
    #[arg(short = 's', long = "state", default_value = crate::config::defaults::STATE_FILE)]
    pub state: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, default_value_t = false)]
    pub auto_approve: bool,
}

/// Arguments for 'hash'
#[derive(Parser, Debug)]
pub struct HashArgs {
    /// Directory to fingerprint
    pub dir: PathBuf,
}

/// Arguments for 'schema'
#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}
