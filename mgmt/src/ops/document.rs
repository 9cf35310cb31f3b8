// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Whole-document operations

use tracing::debug;

use config::ConfResult;
use config::document::{parse_document, parse_key_path};

use crate::processor::txn::{Changeset, ConfigEngine};

impl ConfigEngine {
    /// Merge `text` into a configuration file or, if `merge` is false, replace the file
    /// with it. When merging, the value `del_keys` addresses, if given, is deleted first.
    /// A replacement ignores `del_keys`.
    pub fn set_document(&self, name: &str, text: &str, merge: bool, del_keys: &str) -> ConfResult {
        let new = parse_document(text)?;
        if !merge {
            if !del_keys.trim().is_empty() {
                debug!("Ignoring deletion of {del_keys} from {name:?}: it is replaced");
            }
            debug!("Replacing configuration {name:?}");
            return self.apply(name, Changeset::replace(new));
        }
        let deletions = if del_keys.trim().is_empty() {
            vec![]
        } else {
            vec![parse_key_path(del_keys)?]
        };
        debug!(
            "Merging into configuration {name:?} ({} deletion(s))",
            deletions.len()
        );
        self.apply(name, Changeset::merge(new).with_deletions(deletions))
    }

    /// Delete the value at a key path, given as a YAML sequence of keys
    pub fn delete_from_document(&self, name: &str, keys: &str) -> ConfResult {
        let path = parse_key_path(keys)?;
        self.apply(name, Changeset::delete(vec![path]))
    }
}
