//! Stack configuration data models

use std::fmt;

use serde::Deserialize;

use crate::diagnostics::Diagnostic;

/// Stack configuration data from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct StackConfiguration {
    pub id: String,
    pub attributes: StackConfigurationAttributes,
}

/// Stack configuration attributes from TFE API
#[derive(Deserialize, Debug, Clone)]
pub struct StackConfigurationAttributes {
    pub status: StackConfigurationStatus,

    #[serde(rename = "sequence-number")]
    pub sequence_number: Option<u64>,
}

impl StackConfiguration {
    pub fn status(&self) -> StackConfigurationStatus {
        self.attributes.status
    }
}

/// Processing status of an uploaded stack configuration
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StackConfigurationStatus {
    Pending,
    #[serde(alias = "enqueueing")]
    Queued,
    Preparing,
    Converging,
    #[serde(alias = "converged")]
    Completed,
    #[serde(alias = "errored")]
    Failed,
    #[serde(alias = "cancelled")]
    Canceled,
    #[serde(other)]
    Unknown,
}

impl StackConfigurationStatus {
    /// Parse a persisted status string
    pub fn parse(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .unwrap_or(StackConfigurationStatus::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StackConfigurationStatus::Pending => "pending",
            StackConfigurationStatus::Queued => "queued",
            StackConfigurationStatus::Preparing => "preparing",
            StackConfigurationStatus::Converging => "converging",
            StackConfigurationStatus::Completed => "completed",
            StackConfigurationStatus::Failed => "failed",
            StackConfigurationStatus::Canceled => "canceled",
            StackConfigurationStatus::Unknown => "unknown",
        }
    }

    /// Completed, Failed and Canceled are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StackConfigurationStatus::Completed
                | StackConfigurationStatus::Failed
                | StackConfigurationStatus::Canceled
        )
    }
}

impl fmt::Display for StackConfigurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic attached to a stack configuration
#[derive(Deserialize, Debug, Clone)]
pub struct StackDiagnostic {
    pub id: String,
    pub attributes: StackDiagnosticAttributes,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StackDiagnosticAttributes {
    pub severity: String,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
}

impl From<&StackDiagnostic> for Diagnostic {
    fn from(diag: &StackDiagnostic) -> Self {
        let attrs = &diag.attributes;
        if attrs.severity.eq_ignore_ascii_case("warning") {
            Diagnostic::warning(&attrs.summary, &attrs.detail)
        } else {
            Diagnostic::error(&attrs.summary, &attrs.detail)
        }
    }
}
