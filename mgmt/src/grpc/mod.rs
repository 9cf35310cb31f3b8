// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! gRPC handling module.
//! Implements request reception and response building for the configuration service.

pub mod proto;
pub mod server;

#[allow(clippy::all, clippy::pedantic, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod generated {
    include!(concat!(
        env!("OUT_DIR"),
        "/faucetconfserver.FaucetConfServer.rs"
    ));
}

pub use generated::faucet_conf_server_server::{FaucetConfServer, FaucetConfServerServer};
