// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::fmt::Display;
use std::io;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};

use crate::grpc::server::create_config_service;
use crate::processor::txn::ConfigEngine;

use tracing::{debug, error, info, warn};

use tracectl::{LevelFilter, trace_target};
trace_target!("mgmt-launch", LevelFilter::INFO, &["mgmt"]);

/// Failures to start the management service
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to read {0}: {1}")]
    TlsFile(String, io::Error),
    #[error("Invalid TLS setup: {0}")]
    Tls(tonic::transport::Error),
    #[error("Failed to build the runtime: {0}")]
    Runtime(io::Error),
    #[error("Failed to spawn the management thread: {0}")]
    Thread(io::Error),
    #[error("Socket failure on {0}: {1}")]
    Socket(String, io::Error),
    #[error("gRPC server failure: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// PEM files for mutual TLS: the server key and certificate, and the CA that signs clients
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub key: PathBuf,
    pub cert: PathBuf,
    pub cacert: PathBuf,
}

impl TlsFiles {
    fn read(path: &Path) -> Result<Vec<u8>, LaunchError> {
        std::fs::read(path).map_err(|e| LaunchError::TlsFile(path.display().to_string(), e))
    }
    fn load(&self) -> Result<ServerTlsConfig, LaunchError> {
        let key = Self::read(&self.key)?;
        let cert = Self::read(&self.cert)?;
        let cacert = Self::read(&self.cacert)?;
        debug!(
            "Loaded TLS identity from {} and client CA from {}",
            self.cert.display(),
            self.cacert.display()
        );
        Ok(ServerTlsConfig::new()
            .identity(Identity::from_pem(cert, key))
            .client_ca_root(Certificate::from_pem(cacert)))
    }
}

fn server_builder(tls: Option<&ServerTlsConfig>) -> Result<Server, LaunchError> {
    let builder = Server::builder();
    match tls {
        Some(tls) => builder.tls_config(tls.clone()).map_err(LaunchError::Tls),
        None => Ok(builder),
    }
}

/// Start the gRPC server on TCP
async fn start_grpc_server_tcp(
    addr: SocketAddr,
    tls: Option<ServerTlsConfig>,
    engine: Arc<ConfigEngine>,
) -> Result<(), LaunchError> {
    info!("Starting gRPC server on TCP address: {addr}");
    let config_service = create_config_service(engine);

    server_builder(tls.as_ref())?
        .add_service(config_service)
        .serve(addr)
        .await?;
    Ok(())
}

/// Start the gRPC server on UNIX socket
async fn start_grpc_server_unix(
    socket_path: &Path,
    tls: Option<ServerTlsConfig>,
    engine: Arc<ConfigEngine>,
) -> Result<(), LaunchError> {
    info!(
        "Starting gRPC server on UNIX socket: {}",
        socket_path.display()
    );
    let socket_err = |e| LaunchError::Socket(socket_path.display().to_string(), e);

    if socket_path.exists()
        && let Err(e) = std::fs::remove_file(socket_path)
    {
        warn!("Failed to remove existing socket file: {e}");
    }
    if let Some(parent) = socket_path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(socket_err)?;
    }

    let listener = UnixListener::bind(socket_path).map_err(socket_err)?;
    debug!("Bound unix sock to {}", socket_path.display());

    match std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o666)) {
        Ok(()) => debug!("Socket permissions set to 0666"),
        Err(e) => error!("Failed to set socket permissions: {e}"),
    }

    let config_service = create_config_service(engine);
    let served = server_builder(tls.as_ref())?
        .add_service(config_service)
        .serve_with_incoming(UnixListenerStream::new(listener))
        .await;

    if socket_path.exists()
        && let Err(e) = std::fs::remove_file(socket_path)
    {
        error!("Failed to remove socket file: {e}");
    }
    served.map_err(LaunchError::from)
}

/// Enum for the different types of server addresses
#[derive(Debug)]
enum ServerAddress {
    Tcp(SocketAddr),
    Unix(PathBuf),
}
impl Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerAddress::Tcp(addr) => write!(f, "tcp:{addr}"),
            ServerAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Enum to represent either a TCP socket address or a UNIX socket path
#[derive(Debug, Clone, PartialEq)]
pub enum GrpcAddress {
    Tcp(SocketAddr),
    UnixSocket(PathBuf),
}

/// Start the management service with either type of socket, on its own thread.
/// TLS material and the runtime are set up before the thread starts, so that errors
/// in them are reported to the caller.
pub fn start_mgmt(
    grpc_addr: GrpcAddress,
    tls: Option<TlsFiles>,
    engine: Arc<ConfigEngine>,
) -> Result<std::thread::JoinHandle<()>, LaunchError> {
    /* build server address from provided grpc address */
    let server_address = match grpc_addr {
        GrpcAddress::Tcp(addr) => ServerAddress::Tcp(addr),
        GrpcAddress::UnixSocket(path) => ServerAddress::Unix(path),
    };
    debug!("Will start gRPC listening on {server_address}");

    let tls = tls.as_ref().map(TlsFiles::load).transpose()?;
    if tls.is_none() {
        warn!("TLS is not configured: connections to {server_address} are not authenticated");
    }

    /* the blocking pool of this runtime serves the configuration transactions */
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .map_err(LaunchError::Runtime)?;

    std::thread::Builder::new()
        .name("mgmt".to_string())
        .spawn(move || {
            debug!("Starting configuration management thread");
            rt.block_on(async {
                let result = match server_address {
                    ServerAddress::Tcp(sock_addr) => {
                        start_grpc_server_tcp(sock_addr, tls, engine).await
                    }
                    ServerAddress::Unix(path) => start_grpc_server_unix(&path, tls, engine).await,
                };
                if let Err(e) = result {
                    error!("Failed to start gRPC server: {e}");
                }
            });
        })
        .map_err(LaunchError::Thread)
}
