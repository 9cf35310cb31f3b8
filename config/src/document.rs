// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The configuration document: a YAML tree of mappings, sequences and scalars.

use serde_yaml_ng::{Mapping, Number, Value};

use crate::{ConfError, ConfResult, PortNo};

/// A whole configuration document, or any subtree of it
pub type Document = Value;

/// A sequence of keys addressing a node in a [`Document`]
pub type KeyPath = Vec<Value>;

/// Top-level section holding datapaths
pub const DPS: &str = "dps";
/// Top-level section holding ACLs
pub const ACLS: &str = "acls";
/// Datapath section holding interfaces
pub const INTERFACES: &str = "interfaces";

/// Parse the YAML text of a document. Empty text is the null document.
pub fn parse_document(text: &str) -> ConfResult<Document> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml_ng::from_str(text)?)
}

/// Render a document as YAML text
pub fn render_document(doc: &Document) -> ConfResult<String> {
    serde_yaml_ng::to_string(doc).map_err(|e| ConfError::InvalidArgument(e.to_string()))
}

/// Parse a key path given as YAML, e.g. `[dps, sw1, interfaces, 3]`. A scalar is a path
/// of length one.
pub fn parse_key_path(text: &str) -> ConfResult<KeyPath> {
    match parse_document(text)? {
        Value::Sequence(keys) if keys.is_empty() => {
            Err(ConfError::InvalidArgument("empty key path".to_owned()))
        }
        Value::Sequence(keys) => Ok(keys),
        Value::Null => Err(ConfError::InvalidArgument("empty key path".to_owned())),
        Value::Mapping(_) => Err(ConfError::InvalidArgument(format!(
            "key path must be a sequence of keys, not a mapping: {text}"
        ))),
        scalar => Ok(vec![scalar]),
    }
}

/// Document key for a string
#[must_use]
pub fn key(name: &str) -> Value {
    Value::String(name.to_owned())
}

/// Document key for a port number
#[must_use]
pub fn port_key(port: PortNo) -> Value {
    Value::Number(Number::from(port))
}

/// Build `{k0: {k1: {... leaf}}}` from a path and a leaf value
#[must_use]
pub fn nest(path: &[Value], leaf: Value) -> Document {
    path.iter().rev().fold(leaf, |inner, k| {
        let mut m = Mapping::new();
        m.insert(k.clone(), inner);
        Value::Mapping(m)
    })
}

/// Render a key for messages
#[must_use]
pub fn fmt_key(k: &Value) -> String {
    match k {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_owned(),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// Render a key path for messages, e.g. `dps.sw1.interfaces.3`
#[must_use]
pub fn fmt_path(path: &[Value]) -> String {
    path.iter().map(fmt_key).collect::<Vec<_>>().join(".")
}
