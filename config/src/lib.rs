// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Faucet configuration files: safe storage of a YAML configuration document in a managed
//! directory, the merge and key-path deletion primitives used to compute new documents,
//! the structural model of datapaths, interfaces and ACLs, and the validators that decide
//! whether a candidate document may replace the current one.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod display;
pub mod document;
pub mod errors;
pub mod filename;
pub mod merge;
pub mod model;
pub mod staging;
pub mod store;
pub mod validator;

pub use document::{Document, KeyPath}; // re-export
pub use errors::{ConfError, ConfResult}; // re-export
pub use filename::{CONFIG_EXTENSION, SafeName}; // re-export
pub use merge::{deep_merge, delete_at_path, merge_documents}; // re-export
pub use model::{DatapathModel, ParsedModel, PortModel, PortNo, StackPeer}; // re-export
pub use store::ConfigDir; // re-export
pub use validator::{ConfigValidator, ExternalChecker, FaucetRules}; // re-export

use tracectl::{LevelFilter, trace_target};
trace_target!("config", LevelFilter::INFO, &["config"]);
