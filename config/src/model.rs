// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Structural model of a configuration document: datapaths, their ports and the ACLs.
//! The model is what operations query to compute their changes (is this port mirrored
//! already? which ACLs does it have?). It is built from a [`Document`] without judging
//! whether the configuration makes sense; that is the job of the validators.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;

use crate::document::{ACLS, DPS, fmt_key};
use crate::{ConfError, ConfResult, Document};

/// Port number of an interface, unique within a datapath
pub type PortNo = u32;

/// The far end of a stack link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackPeer {
    pub dp: String,
    pub port: PortNo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortModel {
    pub number: PortNo,
    pub key: Value, /* key of the interface in the document */
    pub name: Option<String>,
    pub description: Option<String>,
    pub acls_in: Vec<String>, /* enforcement order */
    pub mirror: Vec<PortNo>,  /* ports mirrored to this one */
    pub stack: Option<StackPeer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatapathModel {
    pub name: String,
    pub key: Value, /* key of the datapath in the document */
    pub dp_id: Option<u64>,
    pub description: Option<String>,
    pub ports: BTreeMap<PortNo, PortModel>,
}

impl DatapathModel {
    /// Look up a port of this datapath
    pub fn port(&self, port: PortNo) -> ConfResult<&PortModel> {
        self.ports
            .get(&port)
            .ok_or_else(|| ConfError::NotFound(format!("port {port} of datapath '{}'", self.name)))
    }
    #[must_use]
    pub fn has_port(&self, port: PortNo) -> bool {
        self.ports.contains_key(&port)
    }
}

/// Datapaths and ACL names declared by a configuration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedModel {
    dps: BTreeMap<String, DatapathModel>,
    acls: BTreeMap<String, Value>, /* name to key in the document */
}

impl ParsedModel {
    /// Build the model of a single document. A null document has no datapaths.
    pub fn from_document(doc: &Document) -> ConfResult<Self> {
        let root = match doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(root) => root,
            _ => {
                return Err(ConfError::InvalidConfig(
                    "configuration must be a mapping".to_owned(),
                ));
            }
        };
        let mut model = Self::default();
        if let Some(acls) = section(root, ACLS)? {
            model.acls = acls.keys().map(|k| (fmt_key(k), k.clone())).collect();
        }
        if let Some(dps) = section(root, DPS)? {
            for (k, v) in dps {
                let dp = parse_datapath(k, v)?;
                model.dps.insert(dp.name.clone(), dp);
            }
        }
        Ok(model)
    }

    /// Tell if no datapath is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dps.is_empty()
    }
    pub fn dps(&self) -> impl Iterator<Item = &DatapathModel> {
        self.dps.values()
    }
    pub fn dp_names(&self) -> impl Iterator<Item = &str> {
        self.dps.keys().map(String::as_str)
    }
    pub fn acl_names(&self) -> impl Iterator<Item = &str> {
        self.acls.keys().map(String::as_str)
    }
    #[must_use]
    pub fn has_acl(&self, name: &str) -> bool {
        self.acls.contains_key(name)
    }
    /// How to refer to ACL `name` in the document: ACLs may be keyed by numbers
    #[must_use]
    pub fn acl_ref(&self, name: &str) -> Value {
        self.acls
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::String(name.to_owned()))
    }
    /// Look up a datapath by name
    pub fn dp(&self, name: &str) -> ConfResult<&DatapathModel> {
        self.dps
            .get(name)
            .ok_or_else(|| ConfError::NotFound(format!("datapath '{name}'")))
    }
    /// Look up a port of a datapath
    pub fn port(&self, dp: &str, port: PortNo) -> ConfResult<&PortModel> {
        self.dp(dp)?.port(port)
    }
    /// The ports mirrored to `mirror_port` of datapath `dp`
    pub fn mirror_set(&self, dp: &str, mirror_port: PortNo) -> ConfResult<&[PortNo]> {
        Ok(&self.port(dp, mirror_port)?.mirror)
    }
    /// The inbound ACLs of a port, in enforcement order
    pub fn acls_in(&self, dp: &str, port: PortNo) -> ConfResult<&[String]> {
        Ok(&self.port(dp, port)?.acls_in)
    }
}

/// Get a top-level section, which, if present and not null, has to be a mapping
fn section<'a>(root: &'a Mapping, name: &str) -> ConfResult<Option<&'a Mapping>> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(m)) => Ok(Some(m)),
        Some(_) => Err(ConfError::InvalidConfig(format!(
            "'{name}' must be a mapping"
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDpId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRef {
    Number(PortNo),
    Name(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Default, Deserialize)]
struct RawDatapath {
    dp_id: Option<RawDpId>,
    description: Option<String>,
    interfaces: Option<Mapping>,
}

#[derive(Default, Deserialize)]
struct RawInterface {
    name: Option<String>,
    description: Option<String>,
    number: Option<PortNo>,
    acls_in: Option<Vec<Value>>,
    mirror: Option<OneOrMany<PortRef>>,
    stack: Option<RawStack>,
}

#[derive(Deserialize)]
struct RawStack {
    dp: Value,
    port: PortRef,
}

/// Deserialize a section of the document; null stands for an empty section
fn from_node<T: DeserializeOwned + Default>(node: &Value, what: &str) -> ConfResult<T> {
    if node.is_null() {
        return Ok(T::default());
    }
    serde_yaml_ng::from_value(node.clone())
        .map_err(|e| ConfError::InvalidConfig(format!("{what}: {e}")))
}

fn parse_dp_id(raw: RawDpId, dp: &str) -> ConfResult<u64> {
    let bad = || ConfError::InvalidConfig(format!("datapath '{dp}': invalid dp_id"));
    match raw {
        RawDpId::Number(id) => Ok(id),
        RawDpId::Text(text) => {
            let text = text.trim();
            match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| bad()),
                None => text.parse().map_err(|_| bad()),
            }
        }
    }
}

fn parse_datapath(key: &Value, node: &Value) -> ConfResult<DatapathModel> {
    let name = fmt_key(key);
    let raw: RawDatapath = from_node(node, &format!("datapath '{name}'"))?;
    let dp_id = raw.dp_id.map(|id| parse_dp_id(id, &name)).transpose()?;

    let mut ports = BTreeMap::new();
    let mut mirror_refs = Vec::new();
    for (ikey, inode) in raw.interfaces.iter().flatten() {
        let what = format!("interface '{}' of datapath '{name}'", fmt_key(ikey));
        let iface: RawInterface = from_node(inode, &what)?;
        let number = match (iface.number, ikey) {
            (Some(number), _) => number,
            (None, Value::Number(n)) => n
                .as_u64()
                .and_then(|n| PortNo::try_from(n).ok())
                .ok_or_else(|| ConfError::InvalidConfig(format!("{what}: bad port number")))?,
            (None, Value::String(s)) => s.parse().map_err(|_| {
                ConfError::InvalidConfig(format!("{what}: no port number configured"))
            })?,
            (None, _) => {
                return Err(ConfError::InvalidConfig(format!("{what}: bad port key")));
            }
        };
        let stack = match iface.stack {
            None => None,
            Some(RawStack { dp, port }) => Some(StackPeer {
                dp: fmt_key(&dp),
                port: match port {
                    PortRef::Number(port) => port,
                    PortRef::Name(port) => port.parse().map_err(|_| {
                        ConfError::InvalidConfig(format!("{what}: stack port must be a number"))
                    })?,
                },
            }),
        };
        let port = PortModel {
            number,
            key: ikey.clone(),
            name: iface.name,
            description: iface.description,
            acls_in: iface.acls_in.iter().flatten().map(fmt_key).collect(),
            mirror: vec![],
            stack,
        };
        if ports.insert(number, port).is_some() {
            return Err(ConfError::InvalidConfig(format!(
                "datapath '{name}': port {number} is configured more than once"
            )));
        }
        let refs = match iface.mirror {
            None => vec![],
            Some(OneOrMany::One(r)) => vec![r],
            Some(OneOrMany::Many(refs)) => refs,
        };
        mirror_refs.push((number, refs));
    }

    /* mirror sources may be given by port name: resolve once all ports are known */
    for (number, refs) in mirror_refs {
        let mut mirror = Vec::with_capacity(refs.len());
        for r in refs {
            let source = match r {
                PortRef::Number(n) => n,
                PortRef::Name(ref pname) => resolve_port_name(&ports, pname).ok_or_else(|| {
                    ConfError::InvalidConfig(format!(
                        "datapath '{name}': port {number} mirrors unknown port '{pname}'"
                    ))
                })?,
            };
            if !mirror.contains(&source) {
                mirror.push(source);
            }
        }
        if let Some(port) = ports.get_mut(&number) {
            port.mirror = mirror;
        }
    }

    Ok(DatapathModel {
        name,
        key: key.clone(),
        dp_id,
        description: raw.description,
        ports,
    })
}

fn resolve_port_name(ports: &BTreeMap<PortNo, PortModel>, pname: &str) -> Option<PortNo> {
    if let Ok(n) = pname.parse() {
        return Some(n);
    }
    ports
        .values()
        .find(|p| p.name.as_deref() == Some(pname) || p.key.as_str() == Some(pname))
        .map(|p| p.number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // valid in tests
mod test {
    use super::*;
    use crate::document::{parse_document, port_key};
    use pretty_assertions::assert_eq;
    use test_utils::TWO_SWITCHES;

    #[test]
    fn model_of_two_switches() {
        let model = ParsedModel::from_document(&parse_document(TWO_SWITCHES).unwrap()).unwrap();
        assert_eq!(model.dp_names().collect::<Vec<_>>(), ["sw1", "sw2"]);
        assert_eq!(model.acl_names().collect::<Vec<_>>(), ["allow_all", "deny_all"]);

        let sw1 = model.dp("sw1").unwrap();
        assert_eq!(sw1.dp_id, Some(1));
        assert_eq!(sw1.description.as_deref(), Some("first switch"));
        assert_eq!(sw1.ports.len(), 5);
        assert_eq!(model.mirror_set("sw1", 3).unwrap(), [1, 2]);
        assert_eq!(model.acls_in("sw1", 2).unwrap(), ["allow_all".to_owned()]);
        assert_eq!(
            model.port("sw1", 5).unwrap().stack,
            Some(StackPeer {
                dp: "sw2".to_owned(),
                port: 5
            })
        );
        assert_eq!(model.port("sw1", 1).unwrap().key, port_key(1));
    }

    #[test]
    fn lookups_name_the_missing_entity() {
        let model = ParsedModel::from_document(&parse_document(TWO_SWITCHES).unwrap()).unwrap();
        assert_eq!(
            model.dp("sw9"),
            Err(ConfError::NotFound("datapath 'sw9'".to_owned()))
        );
        assert_eq!(
            model.port("sw2", 3).map(|p| p.number),
            Err(ConfError::NotFound("port 3 of datapath 'sw2'".to_owned()))
        );
    }

    #[test]
    fn named_interfaces_and_loose_shapes() {
        let doc = parse_document(
            "
dps:
  br0:
    dp_id: '0x1a'
    interfaces:
      eth0: {number: 7, name: eth0}
      eth1: {number: 8, mirror: eth0}
      '9':
      10: {mirror: [7, eth0, 9]}
",
        )
        .unwrap();
        let model = ParsedModel::from_document(&doc).unwrap();
        let br0 = model.dp("br0").unwrap();
        assert_eq!(br0.dp_id, Some(0x1a));
        assert_eq!(br0.ports.keys().copied().collect::<Vec<_>>(), [7, 8, 9, 10]);
        assert_eq!(br0.port(7).unwrap().key.as_str(), Some("eth0"));
        assert_eq!(model.mirror_set("br0", 8).unwrap(), [7]);
        /* duplicates collapse */
        assert_eq!(model.mirror_set("br0", 10).unwrap(), [7, 9]);
    }

    #[test]
    fn numeric_acl_and_datapath_names() {
        let doc = parse_document(
            "
acls:
  1:
  - rule: {actions: {allow: 1}}
dps:
  7:
    dp_id: 7
    interfaces:
      1: {acls_in: [1], stack: {dp: 8, port: 1}}
  8:
    dp_id: 8
    interfaces:
      1: {stack: {dp: 7, port: 1}}
",
        )
        .unwrap();
        let model = ParsedModel::from_document(&doc).unwrap();
        assert_eq!(model.dp_names().collect::<Vec<_>>(), ["7", "8"]);
        assert!(model.has_acl("1"));
        assert_eq!(model.acl_ref("1"), Value::from(1));
        assert_eq!(model.acl_ref("other"), Value::from("other"));
        assert_eq!(model.acls_in("7", 1).unwrap(), ["1".to_owned()]);
        assert_eq!(model.port("7", 1).unwrap().stack.as_ref().unwrap().dp, "8");
    }

    #[test]
    fn structural_errors() {
        for text in [
            "[1, 2]",
            "dps: [sw1]",
            "dps: {sw1: {dp_id: 1, interfaces: {1: {}, x: {number: 1}}}}",
            "dps: {sw1: {dp_id: 1, interfaces: {eth0: {}}}}",
            "dps: {sw1: {dp_id: 'one'}}",
            "dps: {sw1: {dp_id: 1, interfaces: {1: {mirror: [nope]}}}}",
        ] {
            let doc = parse_document(text).unwrap();
            assert!(
                matches!(ParsedModel::from_document(&doc), Err(ConfError::InvalidConfig(_))),
                "{text} should be rejected"
            );
        }
        assert!(ParsedModel::from_document(&Value::Null).unwrap().is_empty());
    }
}
