// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration operations offered to remote callers, built as transactions of the
//! [`ConfigEngine`](crate::processor::txn::ConfigEngine). Operations on datapaths and ports
//! act on the default configuration file.

pub mod acl;
pub mod document;
pub mod dps;
pub mod interfaces;
pub mod mirror;
pub mod query;
pub mod tunnel;

use serde_yaml_ng::Value;

use config::document::{DPS, INTERFACES, key, port_key};
use config::{DatapathModel, Document, KeyPath, PortNo};

/// Interface attribute listing the ports mirrored to it
pub(crate) const MIRROR: &str = "mirror";

/// Path of a datapath in the document
pub(crate) fn dp_path(dp: &DatapathModel) -> KeyPath {
    vec![key(DPS), dp.key.clone()]
}

/// Path of an interface in the document. Existing interfaces keep the key they have.
pub(crate) fn port_path(dp: &DatapathModel, port: PortNo) -> KeyPath {
    let port_key = dp
        .ports
        .get(&port)
        .map_or_else(|| port_key(port), |p| p.key.clone());
    vec![key(DPS), dp.key.clone(), key(INTERFACES), port_key]
}

/// The value at `path` in `doc`, walking mappings only
pub(crate) fn node_at<'a>(doc: &'a Document, path: &[Value]) -> Option<&'a Value> {
    path.iter()
        .try_fold(doc, |node, k| node.as_mapping().and_then(|m| m.get(k)))
}

/// Tell if `path` leads to a value in `doc`
pub(crate) fn has_path(doc: &Document, path: &[Value]) -> bool {
    node_at(doc, path).is_some()
}

/// The YAML sequence of port numbers for a mirror list
pub(crate) fn port_list(ports: &[PortNo]) -> Value {
    Value::Sequence(ports.iter().map(|p| port_key(*p)).collect())
}
