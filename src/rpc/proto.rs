//! Message definitions for the Terraform RPC API services used during state
//! conversion. Hand-maintained subset of the `terraform1` protocol.

#![allow(missing_docs)]

use std::collections::BTreeMap;

/// Fully qualified RPC method paths
pub mod paths {
    pub const SETUP_HANDSHAKE: &str = "/terraform1.setup.Setup/Handshake";
    pub const SETUP_STOP: &str = "/terraform1.setup.Setup/Stop";

    pub const OPEN_SOURCE_BUNDLE: &str = "/terraform1.dependencies.Dependencies/OpenSourceBundle";
    pub const CLOSE_SOURCE_BUNDLE: &str = "/terraform1.dependencies.Dependencies/CloseSourceBundle";
    pub const OPEN_DEPENDENCY_LOCK_FILE: &str =
        "/terraform1.dependencies.Dependencies/OpenDependencyLockFile";
    pub const CLOSE_DEPENDENCY_LOCKS: &str =
        "/terraform1.dependencies.Dependencies/CloseDependencyLocks";
    pub const OPEN_PROVIDER_PLUGIN_CACHE: &str =
        "/terraform1.dependencies.Dependencies/OpenProviderPluginCache";
    pub const CLOSE_PROVIDER_PLUGIN_CACHE: &str =
        "/terraform1.dependencies.Dependencies/CloseProviderPluginCache";

    pub const OPEN_STACK_CONFIGURATION: &str = "/terraform1.stacks.Stacks/OpenStackConfiguration";
    pub const CLOSE_STACK_CONFIGURATION: &str = "/terraform1.stacks.Stacks/CloseStackConfiguration";
    pub const OPEN_TERRAFORM_STATE: &str = "/terraform1.stacks.Stacks/OpenTerraformState";
    pub const CLOSE_TERRAFORM_STATE: &str = "/terraform1.stacks.Stacks/CloseTerraformState";
    pub const MIGRATE_TERRAFORM_STATE: &str = "/terraform1.stacks.Stacks/MigrateTerraformState";
}

// Setup

#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientCapabilities {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerCapabilities {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HandshakeRequest {
    #[prost(message, optional, tag = "1")]
    pub capabilities: Option<ClientCapabilities>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HandshakeResponse {
    #[prost(message, optional, tag = "2")]
    pub capabilities: Option<ServerCapabilities>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StopRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StopResponse {}

// Shared

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DiagnosticSeverity {
    Invalid = 0,
    Error = 1,
    Warning = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Diagnostic {
    #[prost(enumeration = "DiagnosticSeverity", tag = "1")]
    pub severity: i32,
    #[prost(string, tag = "2")]
    pub summary: String,
    #[prost(string, tag = "3")]
    pub detail: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SourceAddress {
    #[prost(string, tag = "1")]
    pub source: String,
}

/// Response shared by every `Close*` call
#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseResponse {
    #[prost(message, repeated, tag = "1")]
    pub diagnostics: Vec<Diagnostic>,
}

// Dependencies

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenSourceBundleRequest {
    #[prost(string, tag = "1")]
    pub local_path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenSourceBundleResponse {
    #[prost(int64, tag = "1")]
    pub source_bundle_handle: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseSourceBundleRequest {
    #[prost(int64, tag = "1")]
    pub source_bundle_handle: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenDependencyLockFileRequest {
    #[prost(int64, tag = "1")]
    pub source_bundle_handle: i64,
    #[prost(message, optional, tag = "2")]
    pub source_address: Option<SourceAddress>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenDependencyLockFileResponse {
    #[prost(int64, tag = "1")]
    pub dependency_locks_handle: i64,
    #[prost(message, repeated, tag = "2")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseDependencyLocksRequest {
    #[prost(int64, tag = "1")]
    pub dependency_locks_handle: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenProviderPluginCacheRequest {
    #[prost(string, tag = "1")]
    pub cache_dir: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenProviderPluginCacheResponse {
    #[prost(int64, tag = "1")]
    pub provider_cache_handle: i64,
    #[prost(message, repeated, tag = "2")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseProviderPluginCacheRequest {
    #[prost(int64, tag = "1")]
    pub provider_cache_handle: i64,
}

// Stacks

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenStackConfigurationRequest {
    #[prost(int64, tag = "1")]
    pub source_bundle_handle: i64,
    #[prost(message, optional, tag = "2")]
    pub source_address: Option<SourceAddress>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenStackConfigurationResponse {
    #[prost(int64, tag = "1")]
    pub stack_config_handle: i64,
    #[prost(message, repeated, tag = "2")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseStackConfigurationRequest {
    #[prost(int64, tag = "1")]
    pub stack_config_handle: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenTerraformStateRequest {
    #[prost(oneof = "open_terraform_state_request::State", tags = "1, 2")]
    pub state: Option<open_terraform_state_request::State>,
}

pub mod open_terraform_state_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum State {
        #[prost(string, tag = "1")]
        ConfigPath(String),
        #[prost(bytes, tag = "2")]
        Raw(Vec<u8>),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenTerraformStateResponse {
    #[prost(int64, tag = "1")]
    pub state_handle: i64,
    #[prost(message, repeated, tag = "2")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CloseTerraformStateRequest {
    #[prost(int64, tag = "1")]
    pub state_handle: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AddressMapping {
    #[prost(btree_map = "string, string", tag = "1")]
    pub resource_address_map: BTreeMap<String, String>,
    #[prost(btree_map = "string, string", tag = "2")]
    pub module_address_map: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MigrateTerraformStateRequest {
    #[prost(int64, tag = "1")]
    pub state_handle: i64,
    #[prost(int64, tag = "2")]
    pub config_handle: i64,
    #[prost(int64, tag = "3")]
    pub dependency_locks_handle: i64,
    #[prost(int64, tag = "4")]
    pub provider_cache_handle: i64,
    #[prost(message, optional, tag = "5")]
    pub mapping: Option<AddressMapping>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RawChange {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<prost_types::Any>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChangeDescription {
    #[prost(string, tag = "1")]
    pub key: String,
    /// Address of the described object (`component.app.aws_vpc.main`)
    #[prost(string, tag = "2")]
    pub address: String,
    /// Object kind (`component_instance`, `resource_instance`, ...)
    #[prost(string, tag = "3")]
    pub kind: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AppliedChange {
    #[prost(message, repeated, tag = "1")]
    pub raw: Vec<RawChange>,
    #[prost(message, repeated, tag = "2")]
    pub descriptions: Vec<ChangeDescription>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MigrateTerraformStateEvent {
    #[prost(oneof = "migrate_terraform_state_event::Event", tags = "1, 2")]
    pub event: Option<migrate_terraform_state_event::Event>,
}

pub mod migrate_terraform_state_event {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Diagnostic(super::Diagnostic),
        #[prost(message, tag = "2")]
        AppliedChange(super::AppliedChange),
    }
}
