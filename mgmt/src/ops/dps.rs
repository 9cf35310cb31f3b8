// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Removal of whole datapaths

use tracing::info;

use config::ConfResult;

use crate::ops::interfaces::Removal;
use crate::processor::txn::ConfigEngine;

impl ConfigEngine {
    /// Delete datapaths. Interfaces of other datapaths stacked to them are deleted as well.
    pub fn del_dps(&self, dps: &[String]) -> ConfResult {
        self.transact("", |doc, model| {
            let mut removal = Removal::default();
            for name in dps {
                removal.remove_dp(model, model.dp(name)?)?;
            }
            info!("Deleting datapath(s) {}", dps.join(", "));
            removal.changeset(doc, model, false)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // valid in tests
mod test {
    use crate::ops::test_env::TestEnv;
    use config::ConfError;
    use pretty_assertions::assert_eq;
    use test_utils::TWO_SWITCHES;

    const THREE_SWITCHES: &str = "
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {name: host1}
      5: {stack: {dp: sw2, port: 5}}
      6: {stack: {dp: sw3, port: 6}}
      7: {mirror: [5, 6]}
  sw2:
    dp_id: 2
    interfaces:
      5: {stack: {dp: sw1, port: 5}}
  sw3:
    dp_id: 3
    interfaces:
      6: {stack: {dp: sw1, port: 6}}
      7: {name: host7}
";

    #[test]
    fn deleting_a_datapath_deletes_stacked_peers() {
        let env = TestEnv::new(TWO_SWITCHES);
        env.engine.del_dps(&["sw2".to_owned()]).unwrap();
        let model = env.engine.read_model("").unwrap();
        assert_eq!(model.dp_names().collect::<Vec<_>>(), ["sw1"]);
        assert!(model.port("sw1", 5).is_err());
        assert!(env.at("dps.sw1.interfaces.5").is_none());
    }

    #[test]
    fn deleting_several_datapaths() {
        let env = TestEnv::new(THREE_SWITCHES);
        env.engine
            .del_dps(&["sw2".to_owned(), "sw3".to_owned()])
            .unwrap();
        let model = env.engine.read_model("").unwrap();
        assert_eq!(model.dp_names().collect::<Vec<_>>(), ["sw1"]);
        let sw1 = model.dp("sw1").unwrap();
        assert_eq!(sw1.ports.keys().copied().collect::<Vec<_>>(), [1, 7]);
        /* port 7 mirrored the removed stack ports only */
        assert!(env.at("dps.sw1.interfaces.7.mirror").is_none());
    }

    #[test]
    fn deleting_everything_or_unknown() {
        let env = TestEnv::new(TWO_SWITCHES);
        let before = env.bytes();
        assert_eq!(
            env.engine.del_dps(&["sw2".to_owned(), "sw9".to_owned()]),
            Err(ConfError::NotFound("datapath 'sw9'".to_owned()))
        );
        assert!(matches!(
            env.engine.del_dps(&["sw1".to_owned(), "sw2".to_owned()]),
            Err(ConfError::InvalidConfig(_))
        ));
        assert_eq!(env.bytes(), before);
    }
}
