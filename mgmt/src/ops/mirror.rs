// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Port mirroring. The `mirror` attribute of an interface lists the ports whose traffic is
//! copied to it. It is a set: a port is never listed twice.

use tracing::debug;

use config::document::{key, nest};
use config::{ConfResult, DatapathModel, Document, PortNo};

use crate::ops::{MIRROR, has_path, port_list, port_path};
use crate::processor::txn::{Changeset, ConfigEngine};

/// Changes to make so that `mirror_port` of `dp` mirrors exactly `mirror`
fn mirror_update(
    doc: &Document,
    dp: &DatapathModel,
    mirror_port: PortNo,
    mirror: &[PortNo],
) -> Changeset {
    let mut path = port_path(dp, mirror_port);
    path.push(key(MIRROR));
    if !mirror.is_empty() {
        Changeset::merge(nest(&path, port_list(mirror)))
    } else if has_path(doc, &path) {
        Changeset::delete(vec![path])
    } else {
        Changeset::default()
    }
}

impl ConfigEngine {
    /// Mirror `port` of datapath `dp` to `mirror_port`
    pub fn add_port_mirror(&self, dp: &str, port: PortNo, mirror_port: PortNo) -> ConfResult {
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            dpm.port(port)?;
            let mut mirror = dpm.port(mirror_port)?.mirror.clone();
            if mirror.contains(&port) {
                debug!("Port {port} of {dp} is already mirrored to port {mirror_port}");
                return Ok(Changeset::default());
            }
            mirror.push(port);
            Ok(mirror_update(doc, dpm, mirror_port, &mirror))
        })
    }

    /// Stop mirroring `port` of datapath `dp` to `mirror_port`
    pub fn remove_port_mirror(&self, dp: &str, port: PortNo, mirror_port: PortNo) -> ConfResult {
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            let mut mirror = dpm.port(mirror_port)?.mirror.clone();
            if !mirror.contains(&port) {
                debug!("Port {port} of {dp} is not mirrored to port {mirror_port}");
                return Ok(Changeset::default());
            }
            mirror.retain(|p| *p != port);
            Ok(mirror_update(doc, dpm, mirror_port, &mirror))
        })
    }

    /// Stop mirroring any port to `mirror_port`
    pub fn clear_port_mirror(&self, dp: &str, mirror_port: PortNo) -> ConfResult {
        self.transact("", |doc, model| {
            let dpm = model.dp(dp)?;
            dpm.port(mirror_port)?;
            Ok(mirror_update(doc, dpm, mirror_port, &[]))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // valid in tests
mod test {
    use crate::ops::test_env::TestEnv;
    use config::ConfError;
    use config::document::parse_document;
    use pretty_assertions::assert_eq;
    use test_utils::TWO_SWITCHES;

    fn mirror_of(env: &TestEnv, port: u32) -> Vec<u32> {
        env.engine
            .read_model("")
            .unwrap()
            .mirror_set("sw1", port)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn add_is_idempotent() {
        let env = TestEnv::new(TWO_SWITCHES);
        env.engine.add_port_mirror("sw1", 1, 4).unwrap();
        let once = env.bytes();
        env.engine.add_port_mirror("sw1", 1, 4).unwrap();
        assert_eq!(env.bytes(), once);
        assert_eq!(mirror_of(&env, 4), [2, 1]);

        /* a port with no mirror attribute yet */
        env.engine.add_port_mirror("sw1", 2, 1).unwrap();
        assert_eq!(mirror_of(&env, 1), [2]);
    }

    #[test]
    fn remove_and_clear() {
        let env = TestEnv::new(TWO_SWITCHES);
        env.engine.remove_port_mirror("sw1", 1, 3).unwrap();
        assert_eq!(mirror_of(&env, 3), [2]);

        /* not mirrored: nothing to do */
        let before = env.bytes();
        env.engine.remove_port_mirror("sw1", 1, 3).unwrap();
        assert_eq!(env.bytes(), before);

        /* the last one removes the attribute */
        env.engine.remove_port_mirror("sw1", 2, 3).unwrap();
        assert_eq!(
            env.at("dps.sw1.interfaces.3"),
            Some(parse_document("{description: mirror port}").unwrap())
        );

        env.engine.clear_port_mirror("sw1", 4).unwrap();
        assert!(env.at("dps.sw1.interfaces.4.mirror").is_none());
        env.engine.clear_port_mirror("sw1", 4).unwrap();
    }

    #[test]
    fn unknown_entities() {
        let env = TestEnv::new(TWO_SWITCHES);
        assert_eq!(
            env.engine.add_port_mirror("sw9", 1, 3),
            Err(ConfError::NotFound("datapath 'sw9'".to_owned()))
        );
        assert_eq!(
            env.engine.add_port_mirror("sw1", 9, 3),
            Err(ConfError::NotFound("port 9 of datapath 'sw1'".to_owned()))
        );
        assert_eq!(
            env.engine.clear_port_mirror("sw2", 3),
            Err(ConfError::NotFound("port 3 of datapath 'sw2'".to_owned()))
        );
    }
}
