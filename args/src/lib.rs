// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Command line of the configuration server

pub use clap::Parser;
use mgmt::processor::launch::{GrpcAddress, TlsFiles};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_DIR: &str = "/etc/faucet";
pub const DEFAULT_CONFIG_FILE: &str = "faucet.yaml";
pub const DEFAULT_GRPC_ADDRESS: &str = "[::]:59999";

#[derive(Parser, Debug)]
#[command(name = "faucetconfrpc_server")]
#[command(version)]
#[command(about = "Remote configuration service for Faucet controllers", long_about = None)]
pub struct CmdArgs {
    #[arg(
        long,
        value_name = "DIR",
        default_value = DEFAULT_CONFIG_DIR,
        help = "Directory of the configuration files that may be read and written"
    )]
    config_dir: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE,
        help = "Configuration file, relative to --config-dir, used when requests name none"
    )]
    default_config: String,

    /// gRPC server address (IP:PORT for TCP or path for UNIX socket)
    #[arg(
        long,
        value_name = "ADDRESS",
        default_value = DEFAULT_GRPC_ADDRESS,
        help = "IP Address and port or UNIX socket path to listen for configuration requests"
    )]
    grpc_address: String,

    /// Treat grpc-address as a UNIX socket path
    #[arg(long, help = "Use a unix socket to listen for configuration requests")]
    grpc_unix_socket: bool,

    #[arg(long, value_name = "PEM", help = "Server private key", requires_all = ["cert", "cacert"])]
    key: Option<PathBuf>,

    #[arg(long, value_name = "PEM", help = "Server certificate", requires_all = ["key", "cacert"])]
    cert: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PEM",
        help = "Certificate of the CA that signs client certificates",
        requires_all = ["key", "cert"]
    )]
    cacert: Option<PathBuf>,

    #[arg(
        long,
        value_name = "COMMAND",
        help = "Command checking a candidate configuration file given as last argument, e.g. check_faucet_config.
Without it, the built-in structural rules are applied"
    )]
    check_command: Option<String>,

    #[arg(
        long,
        default_value_t = false,
        help = "Show configurable tracing targets and exit"
    )]
    show_tracing_targets: bool,

    #[arg(
        long,
        value_name = "tracing configuration",
        help = "Tracing config string as comma-separated sequence of tag=level, with level one in [off,error,warn,info,debug,trace].
Passing default=level sets the default log-level.
Passing all=level allows setting the log-level of all targets to level.
E.g. default=error,all=info,engine=debug will set the default target to error, and all the registered targets to info, but enable debug for the transaction engine"
    )]
    tracing: Option<String>,
}

impl CmdArgs {
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
    pub fn default_config(&self) -> &str {
        &self.default_config
    }
    pub fn check_command(&self) -> Option<&str> {
        self.check_command.as_deref()
    }
    pub fn show_tracing_targets(&self) -> bool {
        self.show_tracing_targets
    }
    pub fn tracing(&self) -> Option<&String> {
        self.tracing.as_ref()
    }

    /// TLS material, if all of key, certificate and CA certificate were given
    pub fn tls_files(&self) -> Option<TlsFiles> {
        match (&self.key, &self.cert, &self.cacert) {
            (Some(key), Some(cert), Some(cacert)) => Some(TlsFiles {
                key: key.clone(),
                cert: cert.clone(),
                cacert: cacert.clone(),
            }),
            _ => None,
        }
    }

    /// Get the gRPC server address configuration
    pub fn get_grpc_address(&self) -> Result<GrpcAddress, String> {
        // If UNIX socket flag is set, treat the address as a UNIX socket path
        if self.grpc_unix_socket {
            let grpc_path = PathBuf::from(&self.grpc_address);
            if !grpc_path.is_absolute() {
                return Err(format!(
                    "Invalid configuration: --grpc-unix-socket flag is set, but --grpc-address '{}' is not a valid absolute UNIX socket path",
                    self.grpc_address
                ));
            }
            return Ok(GrpcAddress::UnixSocket(grpc_path));
        }

        // Otherwise, parse as a TCP socket address
        match self.grpc_address.parse::<SocketAddr>() {
            Ok(addr) => {
                debug!("gRPC address is {addr}");
                Ok(GrpcAddress::Tcp(addr))
            }
            Err(e) => Err(format!(
                "Invalid gRPC TCP address '{}': {e}",
                self.grpc_address
            )),
        }
    }
}
