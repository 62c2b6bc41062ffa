use std::fmt;

/// Custom error type for migration operations
#[derive(Debug)]
pub enum MigrateError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// API returned an error response
    Api { status: u16, message: String },
    /// Token not found in any source
    TokenNotFound(String),
    /// Failed to read or parse credentials file
    Credentials(String),
    /// JSON parsing error
    Json(String),
    /// Configuration error (provider configuration, migration file, state file)
    Config(String),
    /// Attribute or precondition validation failed
    Validation(String),
    /// A remote object (org, project, stack, workspace, deployment) does not exist
    NotFound(String),
    /// The remote refused the operation in its current state
    Conflict(String),
    /// The state-conversion service reported a diagnostic
    Conversion(String),
    /// Local file or archive I/O failed
    Io { message: String },
    /// The state-conversion RPC transport failed
    Rpc(String),
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateError::Http(e) => write!(f, "HTTP request failed: {}", e),
            MigrateError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            MigrateError::TokenNotFound(msg) => write!(f, "{}", msg),
            MigrateError::Credentials(msg) => write!(f, "{}", msg),
            MigrateError::Json(msg) => write!(f, "JSON error: {}", msg),
            MigrateError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MigrateError::Validation(msg) => write!(f, "Validation error: {}", msg),
            MigrateError::NotFound(msg) => write!(f, "Not found: {}", msg),
            MigrateError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            MigrateError::Conversion(msg) => write!(f, "State conversion failed: {}", msg),
            MigrateError::Io { message } => write!(f, "I/O error: {}", message),
            MigrateError::Rpc(msg) => write!(f, "RPC error: {}", msg),
        }
    }
}

impl std::error::Error for MigrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrateError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl MigrateError {
    /// Short label used as the diagnostic summary
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::Http(_) | MigrateError::Api { .. } => "Remote API error",
            MigrateError::TokenNotFound(_) | MigrateError::Credentials(_) => "Missing credentials",
            MigrateError::Json(_) => "Invalid response",
            MigrateError::Config(_) => "Invalid configuration",
            MigrateError::Validation(_) => "Invalid attribute value",
            MigrateError::NotFound(_) => "Remote object not found",
            MigrateError::Conflict(_) => "Remote conflict",
            MigrateError::Conversion(_) => "State conversion error",
            MigrateError::Io { .. } => "I/O error",
            MigrateError::Rpc(_) => "State conversion service error",
        }
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        MigrateError::Http(err)
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Json(err.to_string())
    }
}

impl From<serde_yml::Error> for MigrateError {
    fn from(err: serde_yml::Error) -> Self {
        MigrateError::Config(err.to_string())
    }
}

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::Io {
            message: err.to_string(),
        }
    }
}

impl From<tonic::Status> for MigrateError {
    fn from(status: tonic::Status) -> Self {
        MigrateError::Rpc(format!("{:?}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for MigrateError {
    fn from(err: tonic::transport::Error) -> Self {
        MigrateError::Rpc(err.to_string())
    }
}

/// Result type alias for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;
