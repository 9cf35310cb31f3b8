// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Read-only queries. They read the live file without taking the engine lock.

use config::document::render_document;
use config::{ConfResult, DatapathModel, Document, ParsedModel, PortNo};

use crate::ops::{node_at, port_path};
use crate::processor::txn::ConfigEngine;

/// An interface as reported to callers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterfaceInfo {
    pub port: PortNo,
    pub name: String,
    pub description: String,
    pub config: String, /* YAML of the interface */
}

/// A datapath as reported to callers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DpInfo {
    pub name: String,
    pub dp_id: u64,
    pub description: String,
    pub interfaces: Vec<InterfaceInfo>,
}

fn dp_info(doc: &Document, dp: &DatapathModel) -> ConfResult<DpInfo> {
    let mut interfaces = Vec::with_capacity(dp.ports.len());
    for port in dp.ports.values() {
        let config = match node_at(doc, &port_path(dp, port.number)) {
            Some(node) if !node.is_null() => render_document(node)?,
            _ => String::new(),
        };
        interfaces.push(InterfaceInfo {
            port: port.number,
            name: port.name.clone().unwrap_or_default(),
            description: port.description.clone().unwrap_or_default(),
            config,
        });
    }
    Ok(DpInfo {
        name: dp.name.clone(),
        dp_id: dp.dp_id.unwrap_or_default(),
        description: dp.description.clone().unwrap_or_default(),
        interfaces,
    })
}

impl ConfigEngine {
    fn live_model(&self) -> ConfResult<(Document, ParsedModel)> {
        let doc = self.read("")?;
        let model = ParsedModel::from_document(&doc)?;
        Ok((doc, model))
    }

    /// Describe the datapaths of a configuration file, or only `dp` if not empty
    pub fn get_dp_info(&self, name: &str, dp: &str) -> ConfResult<Vec<DpInfo>> {
        let doc = self.read(name)?;
        let model = ParsedModel::from_document(&doc)?;
        if dp.is_empty() {
            model.dps().map(|dpm| dp_info(&doc, dpm)).collect()
        } else {
            Ok(vec![dp_info(&doc, model.dp(dp)?)?])
        }
    }

    /// Names of the datapaths of the default file
    pub fn get_dp_names(&self) -> ConfResult<Vec<String>> {
        let (_, model) = self.live_model()?;
        Ok(model.dp_names().map(str::to_owned).collect())
    }

    /// Ids of the datapaths of the default file
    pub fn get_dp_ids(&self) -> ConfResult<Vec<u64>> {
        let (_, model) = self.live_model()?;
        Ok(model.dps().filter_map(|dp| dp.dp_id).collect())
    }

    /// Names of the ACLs of the default file
    pub fn get_acl_names(&self) -> ConfResult<Vec<String>> {
        let (_, model) = self.live_model()?;
        Ok(model.acl_names().map(str::to_owned).collect())
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

    #[test]
    fn names_and_ids() {
        let env = TestEnv::new(TWO_SWITCHES);
        assert_eq!(env.engine.get_dp_names().unwrap(), ["sw1", "sw2"]);
        assert_eq!(env.engine.get_dp_ids().unwrap(), [1, 2]);
        assert_eq!(env.engine.get_acl_names().unwrap(), ["allow_all", "deny_all"]);
    }

    #[test]
    fn dp_info() {
        let env = TestEnv::new(TWO_SWITCHES);
        let all = env.engine.get_dp_info("", "").unwrap();
        assert_eq!(all.len(), 2);

        let info = env.engine.get_dp_info("faucet.yaml", "sw2").unwrap();
        assert_eq!(info.len(), 1);
        let sw2 = &info[0];
        assert_eq!((sw2.name.as_str(), sw2.dp_id), ("sw2", 2));
        assert_eq!(sw2.description, "second switch");
        let ports: Vec<u32> = sw2.interfaces.iter().map(|i| i.port).collect();
        assert_eq!(ports, [1, 5]);
        assert_eq!(sw2.interfaces[0].name, "host3");
        assert_eq!(
            parse_document(&sw2.interfaces[1].config).unwrap(),
            parse_document("{description: stack to sw1, stack: {dp: sw1, port: 5}}").unwrap()
        );

        assert_eq!(
            env.engine.get_dp_info("", "sw9"),
            Err(ConfError::NotFound("datapath 'sw9'".to_owned()))
        );
    }
}
