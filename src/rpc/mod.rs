//! State-conversion RPC client
//!
//! The converter is an external `terraform rpcapi` process speaking gRPC over
//! the go-plugin handshake. Lifecycle code only sees the [`ConverterLauncher`]
//! and [`StateConverter`] traits, so tests can substitute an in-process fake.

mod client;
mod plugin;
pub mod proto;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::diagnostics::Diagnostic;
use crate::error::Result;

pub use client::RpcStateConverter;
pub use plugin::{parse_handshake, Handshake, Network, TerraformRpcLauncher};

/// Inputs for one `MigrateTerraformState` call
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Raw Terraform state as downloaded from the workspace
    pub raw_state: Vec<u8>,
    /// Stack configuration directory (source bundle root)
    pub config_dir: PathBuf,
    /// `TYPE.NAME` -> `component.C.TYPE.NAME`, used for flat state
    pub resource_address_map: BTreeMap<String, String>,
    /// `module.X` -> `component.X`, used for modular state
    pub module_address_map: BTreeMap<String, String>,
}

/// One decoded event of the `MigrateTerraformState` stream
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    AppliedChange(proto::AppliedChange),
    Diagnostic(Diagnostic),
}

/// A running state converter
#[async_trait]
pub trait StateConverter: Send {
    /// Open every handle the conversion needs, run `MigrateTerraformState`
    /// to the end of its stream and close the handles again.
    async fn migrate_terraform_state(
        &mut self,
        request: &ConversionRequest,
    ) -> Result<Vec<MigrationEvent>>;

    /// Shut the converter down
    async fn stop(self: Box<Self>) -> Result<()>;
}

/// Starts converters; one converter serves one conversion
#[async_trait]
pub trait ConverterLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn StateConverter>>;
}

impl From<&proto::Diagnostic> for Diagnostic {
    fn from(diag: &proto::Diagnostic) -> Self {
        match proto::DiagnosticSeverity::try_from(diag.severity) {
            Ok(proto::DiagnosticSeverity::Warning) => {
                Diagnostic::warning(&diag.summary, &diag.detail)
            }
            _ => Diagnostic::error(&diag.summary, &diag.detail),
        }
    }
}
