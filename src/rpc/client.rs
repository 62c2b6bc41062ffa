//! gRPC client for the Terraform RPC API

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Child;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use crate::diagnostics::Diagnostic;
use crate::error::{MigrateError, Result};

use super::proto::{self, paths};
use super::{ConversionRequest, MigrationEvent, StateConverter};

/// Source address of the stack configuration inside the source bundle
const STACK_SOURCE_ADDRESS: &str = "./";

/// Dependency lock file inside the source bundle
const LOCK_FILE_SOURCE_ADDRESS: &str = "./.terraform.lock.hcl";

/// Provider plugin cache relative to the configuration directory
const PROVIDER_CACHE_DIR: &str = ".terraform/providers";

/// A handle opened on the converter, closed in reverse acquisition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle {
    SourceBundle(i64),
    StackConfiguration(i64),
    DependencyLocks(i64),
    ProviderCache(i64),
    TerraformState(i64),
}

/// State converter backed by a `terraform rpcapi` child process
pub struct RpcStateConverter {
    grpc: Grpc<Channel>,
    child: Child,
}

impl RpcStateConverter {
    pub fn new(channel: Channel, child: Child) -> Self {
        Self {
            grpc: Grpc::new(channel),
            child,
        }
    }

    /// Initial `Setup.Handshake`; the server rejects other calls before it
    pub async fn setup(&mut self) -> Result<()> {
        let _: proto::HandshakeResponse = self
            .unary(
                paths::SETUP_HANDSHAKE,
                proto::HandshakeRequest {
                    capabilities: Some(proto::ClientCapabilities {}),
                },
            )
            .await?;
        debug!("RPC API handshake complete");
        Ok(())
    }

    async fn unary<Req, Resp>(&mut self, path: &'static str, request: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.grpc
            .ready()
            .await
            .map_err(|e| MigrateError::Rpc(format!("Service was not ready: {}", e)))?;

        let codec = ProstCodec::<Req, Resp>::default();
        let response = self
            .grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }

    async fn migrate_with_handles(
        &mut self,
        request: &ConversionRequest,
        handles: &mut Vec<Handle>,
    ) -> Result<Vec<MigrationEvent>> {
        let config_dir = request.config_dir.to_string_lossy().to_string();

        let bundle: proto::OpenSourceBundleResponse = self
            .unary(
                paths::OPEN_SOURCE_BUNDLE,
                proto::OpenSourceBundleRequest {
                    local_path: config_dir,
                },
            )
            .await?;
        let bundle_handle = bundle.source_bundle_handle;
        handles.push(Handle::SourceBundle(bundle_handle));

        let config: proto::OpenStackConfigurationResponse = self
            .unary(
                paths::OPEN_STACK_CONFIGURATION,
                proto::OpenStackConfigurationRequest {
                    source_bundle_handle: bundle_handle,
                    source_address: Some(proto::SourceAddress {
                        source: STACK_SOURCE_ADDRESS.to_string(),
                    }),
                },
            )
            .await?;
        handles.push(Handle::StackConfiguration(config.stack_config_handle));
        check_diagnostics("open stack configuration", &config.diagnostics)?;

        let locks: proto::OpenDependencyLockFileResponse = self
            .unary(
                paths::OPEN_DEPENDENCY_LOCK_FILE,
                proto::OpenDependencyLockFileRequest {
                    source_bundle_handle: bundle_handle,
                    source_address: Some(proto::SourceAddress {
                        source: LOCK_FILE_SOURCE_ADDRESS.to_string(),
                    }),
                },
            )
            .await?;
        handles.push(Handle::DependencyLocks(locks.dependency_locks_handle));
        check_diagnostics("open dependency lock file", &locks.diagnostics)?;

        let cache: proto::OpenProviderPluginCacheResponse = self
            .unary(
                paths::OPEN_PROVIDER_PLUGIN_CACHE,
                proto::OpenProviderPluginCacheRequest {
                    cache_dir: request
                        .config_dir
                        .join(PROVIDER_CACHE_DIR)
                        .to_string_lossy()
                        .to_string(),
                },
            )
            .await?;
        handles.push(Handle::ProviderCache(cache.provider_cache_handle));
        check_diagnostics("open provider plugin cache", &cache.diagnostics)?;

        let state: proto::OpenTerraformStateResponse = self
            .unary(
                paths::OPEN_TERRAFORM_STATE,
                proto::OpenTerraformStateRequest {
                    state: Some(proto::open_terraform_state_request::State::Raw(
                        request.raw_state.clone(),
                    )),
                },
            )
            .await?;
        handles.push(Handle::TerraformState(state.state_handle));
        check_diagnostics("open Terraform state", &state.diagnostics)?;

        let migrate = proto::MigrateTerraformStateRequest {
            state_handle: state.state_handle,
            config_handle: config.stack_config_handle,
            dependency_locks_handle: locks.dependency_locks_handle,
            provider_cache_handle: cache.provider_cache_handle,
            mapping: Some(proto::AddressMapping {
                resource_address_map: request.resource_address_map.clone(),
                module_address_map: request.module_address_map.clone(),
            }),
        };

        self.grpc
            .ready()
            .await
            .map_err(|e| MigrateError::Rpc(format!("Service was not ready: {}", e)))?;
        let codec =
            ProstCodec::<proto::MigrateTerraformStateRequest, proto::MigrateTerraformStateEvent>::default();
        let mut stream = self
            .grpc
            .server_streaming(
                tonic::Request::new(migrate),
                PathAndQuery::from_static(paths::MIGRATE_TERRAFORM_STATE),
                codec,
            )
            .await?
            .into_inner();

        let mut events = Vec::new();
        while let Some(message) = stream.message().await? {
            match message.event {
                Some(proto::migrate_terraform_state_event::Event::AppliedChange(change)) => {
                    events.push(MigrationEvent::AppliedChange(change));
                }
                Some(proto::migrate_terraform_state_event::Event::Diagnostic(diag)) => {
                    events.push(MigrationEvent::Diagnostic(Diagnostic::from(&diag)));
                }
                None => debug!("Ignoring empty MigrateTerraformState event"),
            }
        }

        debug!("MigrateTerraformState produced {} events", events.len());
        Ok(events)
    }

    async fn close(&mut self, handle: Handle) -> Result<()> {
        let response: proto::CloseResponse = match handle {
            Handle::SourceBundle(h) => {
                self.unary(
                    paths::CLOSE_SOURCE_BUNDLE,
                    proto::CloseSourceBundleRequest {
                        source_bundle_handle: h,
                    },
                )
                .await?
            }
            Handle::StackConfiguration(h) => {
                self.unary(
                    paths::CLOSE_STACK_CONFIGURATION,
                    proto::CloseStackConfigurationRequest {
                        stack_config_handle: h,
                    },
                )
                .await?
            }
            Handle::DependencyLocks(h) => {
                self.unary(
                    paths::CLOSE_DEPENDENCY_LOCKS,
                    proto::CloseDependencyLocksRequest {
                        dependency_locks_handle: h,
                    },
                )
                .await?
            }
            Handle::ProviderCache(h) => {
                self.unary(
                    paths::CLOSE_PROVIDER_PLUGIN_CACHE,
                    proto::CloseProviderPluginCacheRequest {
                        provider_cache_handle: h,
                    },
                )
                .await?
            }
            Handle::TerraformState(h) => {
                self.unary(
                    paths::CLOSE_TERRAFORM_STATE,
                    proto::CloseTerraformStateRequest { state_handle: h },
                )
                .await?
            }
        };
        check_diagnostics("close handle", &response.diagnostics)
    }
}

#[async_trait]
impl StateConverter for RpcStateConverter {
    async fn migrate_terraform_state(
        &mut self,
        request: &ConversionRequest,
    ) -> Result<Vec<MigrationEvent>> {
        let mut handles = Vec::new();
        let result = self.migrate_with_handles(request, &mut handles).await;

        // Release handles on every path, newest first
        for handle in handles.into_iter().rev() {
            if let Err(e) = self.close(handle).await {
                warn!("Failed to close converter handle {:?}: {}", handle, e);
            }
        }

        result
    }

    async fn stop(mut self: Box<Self>) -> Result<()> {
        let stopped: Result<proto::StopResponse> =
            self.unary(paths::SETUP_STOP, proto::StopRequest {}).await;
        if let Err(e) = stopped {
            debug!("Converter did not acknowledge stop: {}", e);
        }

        if let Err(e) = self.child.start_kill() {
            debug!("Converter already exited: {}", e);
        }
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(Ok(status)) => debug!("Converter exited with {}", status),
            Ok(Err(e)) => warn!("Failed to wait for converter: {}", e),
            Err(_) => warn!("Converter did not exit within 5s"),
        }
        Ok(())
    }
}

/// Fail on error diagnostics returned by an open/close call, log warnings
fn check_diagnostics(operation: &str, diagnostics: &[proto::Diagnostic]) -> Result<()> {
    let mut errors = Vec::new();
    for diag in diagnostics.iter().map(Diagnostic::from) {
        match diag.severity {
            crate::diagnostics::Severity::Warning => {
                warn!("{}: {}", operation, diag);
            }
            crate::diagnostics::Severity::Error => errors.push(diag.to_string()),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::Conversion(format!(
            "{}: {}",
            operation,
            errors.join("; ")
        )))
    }
}
