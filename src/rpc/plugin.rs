//! Launching `terraform rpcapi` and connecting to it

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tonic::transport::{Channel, Endpoint};

use crate::config::{defaults, env, rpc};
use crate::error::{MigrateError, Result};

use super::client::RpcStateConverter;
use super::{ConverterLauncher, StateConverter};

/// Transport announced in the handshake line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Unix,
    Tcp,
}

/// Parsed go-plugin handshake line (`CORE|APP|NETWORK|ADDRESS|PROTOCOL`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub core_version: u32,
    pub app_version: u32,
    pub network: Network,
    pub address: String,
}

/// Parse the first stdout line of a plugin process
pub fn parse_handshake(line: &str) -> Result<Handshake> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    if parts.len() < 5 {
        return Err(MigrateError::Rpc(format!(
            "Unexpected handshake line from converter: '{}'",
            line.trim()
        )));
    }

    let version = |s: &str, what: &str| {
        s.parse::<u32>()
            .map_err(|_| MigrateError::Rpc(format!("Invalid {} in handshake: '{}'", what, s)))
    };
    let core_version = version(parts[0], "core protocol version")?;
    let app_version = version(parts[1], "app protocol version")?;

    if core_version != rpc::CORE_PROTOCOL_VERSION {
        return Err(MigrateError::Rpc(format!(
            "Incompatible core protocol version {} (expected {})",
            core_version,
            rpc::CORE_PROTOCOL_VERSION
        )));
    }
    if app_version != rpc::APP_PROTOCOL_VERSION {
        return Err(MigrateError::Rpc(format!(
            "Incompatible app protocol version {} (expected {})",
            app_version,
            rpc::APP_PROTOCOL_VERSION
        )));
    }

    let network = match parts[2] {
        "unix" => Network::Unix,
        "tcp" => Network::Tcp,
        other => {
            return Err(MigrateError::Rpc(format!(
                "Unsupported handshake network '{}'",
                other
            )))
        }
    };

    if parts[4] != "grpc" {
        return Err(MigrateError::Rpc(format!(
            "Unsupported plugin protocol '{}'",
            parts[4]
        )));
    }

    Ok(Handshake {
        core_version,
        app_version,
        network,
        address: parts[3].to_string(),
    })
}

/// Launches `terraform rpcapi` child processes
#[derive(Debug, Clone)]
pub struct TerraformRpcLauncher {
    binary: String,
}

impl TerraformRpcLauncher {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary from `TF_MIGRATE_TERRAFORM_BINARY`, or `terraform` on PATH
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(env::TERRAFORM_BINARY)
                .ok()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| defaults::TERRAFORM_BINARY.to_string()),
        )
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl ConverterLauncher for TerraformRpcLauncher {
    async fn launch(&self) -> Result<Box<dyn StateConverter>> {
        debug!("Starting {} {}", self.binary, rpc::SUBCOMMAND);

        let mut child = Command::new(&self.binary)
            .arg(rpc::SUBCOMMAND)
            .env(rpc::MAGIC_COOKIE_KEY, rpc::MAGIC_COOKIE_VALUE)
            .env(
                "PLUGIN_PROTOCOL_VERSIONS",
                rpc::APP_PROTOCOL_VERSION.to_string(),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MigrateError::Rpc(format!("Failed to start '{}': {}", self.binary, e))
            })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[rpcapi] {}", line);
                }
            });
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MigrateError::Rpc("Converter stdout is not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let line = tokio::time::timeout(
            Duration::from_secs(rpc::HANDSHAKE_TIMEOUT_SECS),
            lines.next_line(),
        )
        .await
        .map_err(|_| {
            MigrateError::Rpc(format!(
                "Timed out after {}s waiting for the converter handshake",
                rpc::HANDSHAKE_TIMEOUT_SECS
            ))
        })??
        .ok_or_else(|| {
            MigrateError::Rpc("Converter exited before completing the handshake".to_string())
        })?;

        let handshake = parse_handshake(&line)?;
        info!(
            "Converter listening on {:?} {}",
            handshake.network, handshake.address
        );

        // Keep draining stdout so the child never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[rpcapi] {}", line);
            }
        });

        let channel = connect(&handshake).await?;
        let mut converter = RpcStateConverter::new(channel, child);
        converter.setup().await?;
        Ok(Box::new(converter))
    }
}

/// Open a gRPC channel to the address announced in the handshake
pub async fn connect(handshake: &Handshake) -> Result<Channel> {
    match handshake.network {
        Network::Tcp => {
            let endpoint = Endpoint::from_shared(format!("http://{}", handshake.address))?;
            Ok(endpoint.connect().await?)
        }
        Network::Unix => connect_unix(handshake.address.clone()).await,
    }
}

#[cfg(unix)]
async fn connect_unix(path: String) -> Result<Channel> {
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;
    use tonic::transport::Uri;

    // The URI is ignored by the connector; every connection goes to the socket
    let channel = Endpoint::try_from("http://[::]:50051")?
        .connect_with_connector(tower::service_fn(move |_: Uri| {
            let path = path.clone();
            async move {
                let stream = UnixStream::connect(path).await?;
                Ok::<_, std::io::Error>(TokioIo::new(stream))
            }
        }))
        .await?;
    Ok(channel)
}

#[cfg(not(unix))]
async fn connect_unix(path: String) -> Result<Channel> {
    Err(MigrateError::Rpc(format!(
        "Unix socket '{}' is not supported on this platform",
        path
    )))
}
