// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Remote mirroring: traffic received on a coprocessor port, tagged with a VLAN id, is
//! tunnelled to a port of another datapath.

use serde_yaml_ng::{Mapping, Value};

use config::document::{ACLS, key, nest};
use config::{ConfError, ConfResult, PortNo, deep_merge};

use crate::ops::port_path;
use crate::processor::txn::{Changeset, ConfigEngine};

/// Name of the ACL tunnelling VLAN `tunnel_vid` traffic to `remote_port` of `remote_dp`
#[must_use]
pub fn remote_mirror_acl_name(tunnel_vid: u16, remote_dp: &str, remote_port: PortNo) -> String {
    format!("remote-mirror-{tunnel_vid}-{remote_dp}-{remote_port}")
}

fn mapping<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    Value::Mapping(pairs.into_iter().map(|(k, v)| (key(k), v)).collect::<Mapping>())
}

fn rule(body: Value) -> Value {
    mapping([("rule", body)])
}

/// The rules of the remote mirror ACL: allow the tunnel VLAN, then send everything into
/// the tunnel towards the remote port.
fn remote_mirror_rules(tunnel_vid: u16, remote_dp: &str, remote_port: PortNo) -> Value {
    let vid = Value::from(tunnel_vid);
    let tunnel = mapping([
        ("type", key("vlan")),
        ("tunnel_id", vid.clone()),
        ("dp", key(remote_dp)),
        ("port", Value::from(remote_port)),
    ]);
    Value::Sequence(vec![
        rule(mapping([
            ("vlan_vid", vid),
            ("actions", mapping([("allow", Value::from(1))])),
        ])),
        rule(mapping([(
            "actions",
            mapping([
                ("allow", Value::from(1)),
                ("output", mapping([("tunnel", tunnel)])),
            ]),
        )])),
    ])
}

impl ConfigEngine {
    /// Make `port` of datapath `dp` a coprocessor port whose VLAN `tunnel_vid` traffic is
    /// tunnelled to `remote_port` of `remote_dp`. Any previous configuration of the port is
    /// replaced. The ACL and the interface are written in the same transaction.
    pub fn set_remote_mirror_port(
        &self,
        dp: &str,
        port: PortNo,
        tunnel_vid: u16,
        remote_dp: &str,
        remote_port: PortNo,
    ) -> ConfResult {
        if !(1..=4094).contains(&tunnel_vid) {
            return Err(ConfError::InvalidArgument(format!(
                "invalid tunnel VLAN id {tunnel_vid}"
            )));
        }
        self.transact("", |_, model| {
            let dpm = model.dp(dp)?;
            model.port(remote_dp, remote_port)?;

            let acl = remote_mirror_acl_name(tunnel_vid, remote_dp, remote_port);
            let acl_doc = nest(
                &[key(ACLS), key(&acl)],
                remote_mirror_rules(tunnel_vid, remote_dp, remote_port),
            );
            let iface = mapping([
                ("description", key("remote mirror")),
                ("acls_in", Value::Sequence(vec![key(&acl)])),
                ("coprocessor", mapping([("strategy", key("vlan_vid"))])),
            ]);
            let path = port_path(dpm, port);
            let deletions = if dpm.has_port(port) {
                vec![path.clone()]
            } else {
                vec![]
            };
            let iface_doc = nest(&path, iface);
            Ok(Changeset::merge(deep_merge(acl_doc, iface_doc)).with_deletions(deletions))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // valid in tests
mod test {
    use super::remote_mirror_acl_name;
    use crate::ops::test_env::TestEnv;
    use config::ConfError;
    use config::document::parse_document;
    use pretty_assertions::assert_eq;
    use test_utils::TWO_SWITCHES;

    #[test]
    fn remote_mirror_port() {
        let env = TestEnv::new(TWO_SWITCHES);
        env.engine
            .set_remote_mirror_port("sw1", 8, 333, "sw2", 1)
            .unwrap();
        let model = env.engine.read_model("").unwrap();
        assert!(model.has_acl(&remote_mirror_acl_name(333, "sw2", 1)));
        assert_eq!(model.acls_in("sw1", 8).unwrap(), ["remote-mirror-333-sw2-1"]);
        assert_eq!(
            env.at("acls.remote-mirror-333-sw2-1"),
            Some(
                parse_document(
                    "
- rule: {vlan_vid: 333, actions: {allow: 1}}
- rule:
    actions:
      allow: 1
      output: {tunnel: {type: vlan, tunnel_id: 333, dp: sw2, port: 1}}
"
                )
                .unwrap()
            )
        );
        assert_eq!(
            env.at("dps.sw1.interfaces.8.coprocessor"),
            Some(parse_document("{strategy: vlan_vid}").unwrap())
        );
    }

    #[test]
    fn remote_mirror_port_replaces_existing_port() {
        let env = TestEnv::new(TWO_SWITCHES);
        env.engine
            .set_remote_mirror_port("sw1", 3, 333, "sw2", 1)
            .unwrap();
        assert_eq!(
            env.at("dps.sw1.interfaces.3"),
            Some(
                parse_document(
                    "
description: remote mirror
acls_in: [remote-mirror-333-sw2-1]
coprocessor: {strategy: vlan_vid}
"
                )
                .unwrap()
            )
        );
        let model = env.engine.read_model("").unwrap();
        assert!(model.mirror_set("sw1", 3).unwrap().is_empty());
    }

    #[test]
    fn remote_mirror_port_errors() {
        let env = TestEnv::new(TWO_SWITCHES);
        let before = env.bytes();
        assert_eq!(
            env.engine.set_remote_mirror_port("sw1", 8, 333, "sw2", 9),
            Err(ConfError::NotFound("port 9 of datapath 'sw2'".to_owned()))
        );
        assert_eq!(
            env.engine.set_remote_mirror_port("sw9", 8, 333, "sw2", 1),
            Err(ConfError::NotFound("datapath 'sw9'".to_owned()))
        );
        assert!(matches!(
            env.engine.set_remote_mirror_port("sw1", 8, 0, "sw2", 1),
            Err(ConfError::InvalidArgument(_))
        ));
        assert_eq!(env.bytes(), before);
    }
}
