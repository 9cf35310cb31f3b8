// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Testing utilities for the configuration service

#![allow(clippy::missing_panics_doc)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Two switches with a stack link between port 5 of sw1 and port 5 of sw2, some mirroring
/// on sw1 and two ACLs.
pub const TWO_SWITCHES: &str = "
acls:
  allow_all:
  - rule: {actions: {allow: 1}}
  deny_all:
  - rule: {actions: {allow: 0}}
vlans:
  office: {vid: 100}
dps:
  sw1:
    dp_id: 1
    description: first switch
    interfaces:
      1: {name: host1, description: first host, native_vlan: office}
      2: {name: host2, description: second host, native_vlan: office, acls_in: [allow_all]}
      3: {description: mirror port, mirror: [1, 2]}
      4: {description: mirror port too, mirror: [2]}
      5: {description: stack to sw2, stack: {dp: sw2, port: 5}}
  sw2:
    dp_id: 2
    description: second switch
    interfaces:
      1: {name: host3, native_vlan: office}
      5: {description: stack to sw1, stack: {dp: sw1, port: 5}}
";

/// A throwaway managed configuration directory, removed on drop
pub struct TempConfigDir {
    dir: TempDir,
}

impl TempConfigDir {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("faucetconf-test-")
            .tempdir()
            .unwrap_or_else(|e| panic!("failed to create temporary directory: {e}"));
        debug!("Test config dir is {}", dir.path().display());
        Self { dir }
    }
    /// Create a directory holding `name` with the given content
    #[must_use]
    pub fn with_file(name: &str, content: &str) -> Self {
        let tmp = Self::new();
        tmp.write(name, content);
        tmp
    }
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
    /// Write `content` to `name`, relative to the directory. Parent directories are created.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }
    /// Create a sub-directory
    pub fn mkdir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", path.display()));
        path
    }
    /// Raw bytes of a file
    #[must_use]
    pub fn bytes(&self, name: &str) -> Vec<u8> {
        let path = self.dir.path().join(name);
        std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
    }
    /// Sorted names of the entries at the top of the directory
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap_or_else(|e| panic!("failed to list directory: {e}"))
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TempConfigDir {
    fn default() -> Self {
        Self::new()
    }
}
