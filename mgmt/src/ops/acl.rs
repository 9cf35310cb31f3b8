// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Inbound ACLs of ports. `acls_in` is an ordered list: ACLs are enforced in list order.
//! That the ACLs exist is for the validator to say.

use serde_yaml_ng::Value;
use tracing::debug;

use config::document::{key, nest};
use config::{ConfError, ConfResult, DatapathModel, Document, ParsedModel, PortNo};

use crate::ops::{has_path, port_path};
use crate::processor::txn::{Changeset, ConfigEngine};

const ACLS_IN: &str = "acls_in";

/// Changes to make so that the inbound ACLs of `port` are exactly `acls`
fn acls_update(
    doc: &Document,
    model: &ParsedModel,
    dp: &DatapathModel,
    port: PortNo,
    acls: &[String],
) -> Changeset {
    let mut path = port_path(dp, port);
    path.push(key(ACLS_IN));
    if !acls.is_empty() {
        let list = Value::Sequence(acls.iter().map(|acl| model.acl_ref(acl)).collect());
        Changeset::merge(nest(&path, list))
    } else if has_path(doc, &path) {
        Changeset::delete(vec![path])
    } else {
        Changeset::default()
    }
}

/// Split a comma-separated list of ACL names, dropping blanks and repetitions
fn split_acls(acls: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for acl in acls.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        if !out.iter().any(|a| a == acl) {
            out.push(acl.to_owned());
        }
    }
    out
}

impl ConfigEngine {
    /// Append `acl` to the inbound ACLs of a port, unless it is there already
    pub fn add_port_acl(&self, dp: &str, port: PortNo, acl: &str) -> ConfResult {
        let acl = acl.trim();
        if acl.is_empty() {
            return Err(ConfError::InvalidArgument("no ACL to add".to_owned()));
        }
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            let mut acls = dpm.port(port)?.acls_in.clone();
            if acls.iter().any(|a| a == acl) {
                debug!("Port {port} of {dp} already has ACL {acl}");
                return Ok(Changeset::default());
            }
            acls.push(acl.to_owned());
            Ok(acls_update(doc, model, dpm, port, &acls))
        })
    }

    /// Remove `acl` from the inbound ACLs of a port. An empty name removes them all.
    pub fn remove_port_acl(&self, dp: &str, port: PortNo, acl: &str) -> ConfResult {
        let acl = acl.trim();
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            let mut acls = dpm.port(port)?.acls_in.clone();
            if acl.is_empty() {
                acls.clear();
            } else if acls.iter().any(|a| a == acl) {
                acls.retain(|a| a != acl);
            } else {
                debug!("Port {port} of {dp} does not have ACL {acl}");
                return Ok(Changeset::default());
            }
            Ok(acls_update(doc, model, dpm, port, &acls))
        })
    }

    /// Set the inbound ACLs of a port from a comma-separated list of names. An empty list
    /// removes them all.
    pub fn set_port_acl(&self, dp: &str, port: PortNo, acls: &str) -> ConfResult {
        let acls = split_acls(acls);
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            if dpm.port(port)?.acls_in == acls {
                return Ok(Changeset::default());
            }
            Ok(acls_update(doc, model, dpm, port, &acls))
        })
    }
}
