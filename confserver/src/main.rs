// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]

use args::{CmdArgs, Parser};
use config::{ConfResult, ConfigDir, ConfigValidator, ExternalChecker, FaucetRules};
use mgmt::processor::launch::start_mgmt;
use mgmt::processor::txn::ConfigEngine;
use std::sync::Arc;
use std::sync::mpsc;

use tracectl::{custom_target, get_trace_ctl, trace_target};
use tracing::{error, info, level_filters::LevelFilter};

trace_target!("faucetconf", LevelFilter::INFO, &[]);
fn init_logging() {
    let tctl = get_trace_ctl();
    tctl.set_default_level(LevelFilter::INFO);
    custom_target!("tonic", LevelFilter::ERROR, &[]);
    custom_target!("h2", LevelFilter::ERROR, &[]);
}

/// Why the process stops
enum Stop {
    Signal,
    ServerDown,
}

fn build_validator(args: &CmdArgs) -> ConfResult<Box<dyn ConfigValidator>> {
    match args.check_command() {
        Some(line) => {
            info!("Candidate configurations are checked with '{line}'");
            Ok(Box::new(ExternalChecker::from_command_line(line)?))
        }
        None => {
            info!("Candidate configurations are checked with the built-in rules");
            Ok(Box::new(FaucetRules))
        }
    }
}

fn build_engine(args: &CmdArgs) -> ConfResult<ConfigEngine> {
    let dir = ConfigDir::new(args.config_dir())?;
    ConfigEngine::new(dir, build_validator(args)?, args.default_config())
}

fn main() {
    /* parse cmd line args */
    let args = CmdArgs::parse();

    /* initialize logging */
    init_logging();
    if let Some(tracing) = args.tracing()
        && let Err(e) = get_trace_ctl().setup_from_string(tracing)
    {
        error!("Invalid tracing configuration: {e}");
        panic!("Invalid tracing configuration: {e}");
    }
    if args.show_tracing_targets() {
        println!("{}", get_trace_ctl().dump());
        std::process::exit(0);
    }
    info!("Starting configuration server...");

    let (stop_tx, stop_rx) = mpsc::channel();
    let server_down = stop_tx.clone();
    ctrlc::set_handler(move || {
        stop_tx
            .send(Stop::Signal)
            .expect("Error sending termination signal");
    })
    .expect("failed to set SIGINT handler");

    let grpc_addr = match args.get_grpc_address() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid gRPC address configuration: {e}");
            panic!("Management service configuration error. Aborting...");
        }
    };

    let engine = match build_engine(&args) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Cannot manage configuration files: {e}");
            panic!("Configuration directory error. Aborting...");
        }
    };

    /* start management */
    let server =
        start_mgmt(grpc_addr, args.tls_files(), engine).expect("Failed to start gRPC server");
    std::thread::spawn(move || {
        if server.join().is_err() {
            error!("Management thread panicked");
        }
        let _ = server_down.send(Stop::ServerDown);
    });

    match stop_rx.recv().expect("failed to receive stop signal") {
        Stop::Signal => {
            info!("Shutting down configuration server");
            std::process::exit(0);
        }
        Stop::ServerDown => {
            error!("gRPC server stopped. Exiting");
            std::process::exit(1);
        }
    }
}
