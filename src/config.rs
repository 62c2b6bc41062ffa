/// Configuration constants for TFE API
pub mod api {
    /// Base path for TFE API v2
    pub const BASE_PATH: &str = "/api/v2";

    /// Organizations endpoint
    pub const ORGANIZATIONS: &str = "organizations";

    /// Projects endpoint
    pub const PROJECTS: &str = "projects";

    /// Workspaces endpoint
    pub const WORKSPACES: &str = "workspaces";

    /// Stacks endpoint
    pub const STACKS: &str = "stacks";

    /// Stack sources endpoint (source bundle uploads)
    pub const STACK_SOURCES: &str = "stack-sources";

    /// Stack configurations endpoint
    pub const STACK_CONFIGURATIONS: &str = "stack-configurations";

    /// Stack deployments endpoint (scoped under a stack)
    pub const DEPLOYMENTS: &str = "stack-deployments";

    /// Stack configuration diagnostics endpoint
    pub const DIAGNOSTICS: &str = "stack-diagnostics";

    /// Stack deployment groups endpoint
    pub const DEPLOYMENT_GROUPS: &str = "stack-deployment-groups";

    /// Stack deployment runs endpoint
    pub const DEPLOYMENT_RUNS: &str = "stack-deployment-runs";

    /// Stack deployment steps endpoint
    pub const DEPLOYMENT_STEPS: &str = "stack-deployment-steps";

    /// Default page size for API requests
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Maximum concurrent page requests during parallel pagination
    pub const MAX_CONCURRENT_PAGE_REQUESTS: usize = 10;

    /// JSON:API content type used by HCP Terraform
    pub const CONTENT_TYPE: &str = "application/vnd.api+json";
}

/// Configuration constants for credentials
pub mod credentials {
    /// Credentials file name
    pub const FILE_NAME: &str = "terraform.d/credentials.tfrc.json";

    /// Path to Terraform credentials file on Unix (relative to HOME)
    pub const FILE_PATH_UNIX: &str = ".terraform.d/credentials.tfrc.json";

    /// Environment variable names for token (checked in order)
    pub const TOKEN_ENV_VARS: &[&str] = &["TFE_TOKEN", "TFC_TOKEN", "HCP_TOKEN"];
}

/// Environment variables read by the CLI host
pub mod env {
    /// Default organization for migration files
    pub const ORGANIZATION: &str = "TFE_ORGANIZATION";

    /// Default project for migration files
    pub const PROJECT: &str = "TFE_PROJECT";

    /// Enables logging when set to a truthy value
    pub const ENABLE_LOG: &str = "TF_MIGRATE_ENABLE_LOG";

    /// Log level used when logging is enabled through the environment
    pub const LOG_LEVEL: &str = "TF_MIGRATE_LOG_LEVEL";

    /// Terraform binary used to launch the state-conversion service
    pub const TERRAFORM_BINARY: &str = "TF_MIGRATE_TERRAFORM_BINARY";
}

/// Default values for CLI
pub mod defaults {
    /// The only supported HCP Terraform host
    pub const HOST: &str = "app.terraform.io";

    /// Default log level
    pub const LOG_LEVEL: &str = "warn";

    /// Default state file name
    pub const STATE_FILE: &str = "hcpmigrate.state.json";

    /// Default lifecycle deadline in seconds
    pub const TIMEOUT_SECS: u64 = 3600;

    /// Default Terraform binary
    pub const TERRAFORM_BINARY: &str = "terraform";
}

/// Polling budgets for the remote state machines
pub mod polling {
    /// Stack configuration watcher timeout
    pub const WATCH_TIMEOUT_SECS: u64 = 300;

    /// Stack configuration watcher interval
    pub const WATCH_INTERVAL_SECS: u64 = 5;

    /// Deployment group poll attempts after the import-state advance
    pub const GROUP_POLL_ATTEMPTS: u32 = 10;

    /// Deployment group poll interval
    pub const GROUP_POLL_INTERVAL_SECS: u64 = 10;

    /// Quiescence before re-reading a step for its upload URL
    pub const STEP_QUIESCENCE_SECS: u64 = 5;

    /// Attempts while waiting for an uploaded source to produce a configuration
    pub const SOURCE_POLL_ATTEMPTS: u32 = 30;

    /// Interval while waiting for an uploaded source to produce a configuration
    pub const SOURCE_POLL_INTERVAL_SECS: u64 = 2;
}

/// State-conversion RPC service constants
pub mod rpc {
    /// go-plugin magic cookie key
    pub const MAGIC_COOKIE_KEY: &str = "TERRAFORM_RPCAPI_COOKIE";

    /// go-plugin magic cookie value
    pub const MAGIC_COOKIE_VALUE: &str = "fba0991c9bcd453982f0d88e2da95940";

    /// go-plugin core protocol version
    pub const CORE_PROTOCOL_VERSION: u32 = 1;

    /// Application protocol version
    pub const APP_PROTOCOL_VERSION: u32 = 1;

    /// Subcommand that starts the RPC API server
    pub const SUBCOMMAND: &str = "rpcapi";

    /// How long to wait for the handshake line
    pub const HANDSHAKE_TIMEOUT_SECS: u64 = 30;
}

/// Workspace lock reason used during state conversion
pub const LOCK_REASON: &str = "preparing to convert workspace state";
