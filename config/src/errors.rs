// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type for configuration storage / transaction failures.
//! Every fallible operation of the store, the merge engine, the validators and the
//! transaction engine built on top of them returns a `ConfError`.

use std::io;
use std::path::Path;
use thiserror::Error;

/// The reasons why a configuration request may fail
#[derive(Debug, Error, PartialEq)]
pub enum ConfError {
    #[error("Invalid config filename '{0}': {1}")]
    InvalidFilename(String, &'static str),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Could not parse YAML: {0}")]
    Parse(String),
    // validator messages are relayed as-is
    #[error("{0}")]
    InvalidConfig(String),
    #[error("Cannot merge: {0}")]
    MergeConflict(String),
    #[error("Cannot descend into scalar value at '{0}'")]
    PathThroughScalar(String),
    #[error("Invalid request: {0}")]
    InvalidArgument(String),
    #[error("I/O failure on {0}: {1}")]
    Io(String, String),
}

/// Result-like type for configuration operations
pub type ConfResult<T = ()> = Result<T, ConfError>;

impl ConfError {
    /// Classify an [`io::Error`] hit while accessing `path`
    pub(crate) fn from_io(path: &Path, e: &io::Error) -> Self {
        let what = path.display().to_string();
        match e.kind() {
            io::ErrorKind::NotFound => ConfError::NotFound(what),
            io::ErrorKind::PermissionDenied => ConfError::PermissionDenied(what),
            _ => ConfError::Io(what, e.to_string()),
        }
    }
}

impl From<serde_yaml_ng::Error> for ConfError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        ConfError::Parse(e.to_string())
    }
}
