// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bulk configuration and removal of datapath interfaces

use serde_yaml_ng::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use config::document::{key, nest};
use config::{ConfError, ConfResult, DatapathModel, Document, ParsedModel, PortNo, deep_merge};

use crate::ops::{MIRROR, dp_path, has_path, port_list, port_path};
use crate::processor::txn::{Changeset, ConfigEngine, Update};

/// Configuration fragment for one interface
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterfaceSpec {
    pub port: PortNo,
    pub config: Document, /* mapping of interface attributes, or null */
}

/// Interfaces of one datapath
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DpSpec {
    pub dp: String,
    pub interfaces: Vec<InterfaceSpec>,
}

/// Ports and datapaths deleted together, with what their removal drags along: the stack
/// peers of removed ports are removed as well, and removed ports are scrubbed from the
/// mirror lists of the remaining ports of their datapath.
#[derive(Default)]
pub(crate) struct Removal<'a> {
    ports: BTreeMap<&'a str, BTreeSet<PortNo>>,
    dps: BTreeSet<&'a str>,
}

impl<'a> Removal<'a> {
    pub(crate) fn remove_port(
        &mut self,
        model: &'a ParsedModel,
        dp: &'a DatapathModel,
        port: PortNo,
    ) -> ConfResult {
        let removed = dp.port(port)?;
        self.ports.entry(&dp.name).or_default().insert(port);
        if let Some(peer) = &removed.stack {
            match model.dp(&peer.dp) {
                Ok(peer_dp) if peer_dp.has_port(peer.port) => {
                    debug!(
                        "Port {port} of {} is stacked to port {} of {}: removing it too",
                        dp.name, peer.port, peer.dp
                    );
                    self.ports.entry(&peer_dp.name).or_default().insert(peer.port);
                }
                _ => debug!(
                    "Stack peer {}:{} of {}:{port} is gone",
                    peer.dp, peer.port, dp.name
                ),
            }
        }
        Ok(())
    }

    pub(crate) fn remove_dp(
        &mut self,
        model: &'a ParsedModel,
        dp: &'a DatapathModel,
    ) -> ConfResult {
        self.dps.insert(&dp.name);
        for port in dp.ports.keys() {
            self.remove_port(model, dp, *port)?;
        }
        Ok(())
    }

    /// Build the changes. With `delete_empty_dp`, datapaths left without interfaces are
    /// removed as well.
    pub(crate) fn changeset(
        &self,
        doc: &Document,
        model: &ParsedModel,
        delete_empty_dp: bool,
    ) -> ConfResult<Changeset> {
        let mut deletions = vec![];
        let mut overlay = Value::Null;

        for dp_name in self.dps.iter().filter(|dp| !self.ports.contains_key(*dp)) {
            deletions.push(dp_path(model.dp(dp_name)?));
        }
        for (dp_name, ports) in &self.ports {
            let dp = model.dp(dp_name)?;
            let emptied = dp.ports.keys().all(|p| ports.contains(p));
            if self.dps.contains(dp_name) || (delete_empty_dp && emptied) {
                debug!("Datapath {dp_name} will be removed");
                deletions.push(dp_path(dp));
                continue;
            }
            deletions.extend(ports.iter().map(|port| port_path(dp, *port)));

            /* scrub removed ports from the mirror lists of the remaining ones */
            for kept in dp.ports.values().filter(|p| !ports.contains(&p.number)) {
                if !kept.mirror.iter().any(|m| ports.contains(m)) {
                    continue;
                }
                let mirror: Vec<PortNo> = kept
                    .mirror
                    .iter()
                    .copied()
                    .filter(|m| !ports.contains(m))
                    .collect();
                let mut path = port_path(dp, kept.number);
                path.push(key(MIRROR));
                if !mirror.is_empty() {
                    overlay = deep_merge(overlay, nest(&path, port_list(&mirror)));
                } else if has_path(doc, &path) {
                    deletions.push(path);
                }
            }
        }
        let update = if overlay.is_null() {
            Update::Keep
        } else {
            Update::Merge(overlay)
        };
        Ok(Changeset { deletions, update })
    }
}

impl ConfigEngine {
    /// Set the configuration of interfaces of one or more datapaths. The configuration of
    /// an existing interface is replaced by the new one; interfaces that do not exist are
    /// created. All changes are made in a single transaction.
    pub fn set_dp_interfaces(&self, dps: &[DpSpec]) -> ConfResult {
        self.transact("", |_, model| {
            let mut deletions = Vec::new();
            let mut overlay = Value::Null;
            for spec in dps {
                let dp = model.dp(&spec.dp)?;
                for iface in &spec.interfaces {
                    let config = match &iface.config {
                        Value::Null => Value::Mapping(Mapping::new()),
                        Value::Mapping(_) => iface.config.clone(),
                        _ => {
                            return Err(ConfError::InvalidArgument(format!(
                                "configuration of port {} of {} is not a mapping",
                                iface.port, spec.dp
                            )));
                        }
                    };
                    let path = port_path(dp, iface.port);
                    if dp.has_port(iface.port) && !deletions.contains(&path) {
                        deletions.push(path.clone());
                    }
                    overlay = deep_merge(overlay, nest(&path, config));
                }
            }
            if overlay.is_null() {
                return Ok(Changeset::default());
            }
            Ok(Changeset::merge(overlay).with_deletions(deletions))
        })
    }

    /// Delete interfaces of one or more datapaths, with their stack peers. The ports removed
    /// are scrubbed from the mirror lists of the other ports of their datapath. With
    /// `delete_empty_dp`, datapaths left without interfaces are deleted too.
    pub fn del_dp_interfaces(&self, dps: &[DpSpec], delete_empty_dp: bool) -> ConfResult {
        self.transact("", |doc, model| {
            let mut removal = Removal::default();
            for spec in dps {
                let dp = model.dp(&spec.dp)?;
                for iface in &spec.interfaces {
                    removal.remove_port(model, dp, iface.port)?;
                }
            }
            removal.changeset(doc, model, delete_empty_dp)
        })
    }
}
