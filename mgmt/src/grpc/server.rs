// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

// mgmt/src/grpc/server.rs

use async_trait::async_trait;
use serde_yaml_ng::{Mapping, Value};
use std::fmt::Debug;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info};

use config::document::{key, parse_document};
use config::{ConfError, ConfResult};

use crate::grpc::proto::{
    AddPortAclReply, AddPortAclRequest, AddPortMirrorReply, AddPortMirrorRequest,
    ClearPortMirrorReply, ClearPortMirrorRequest, DelConfigFromFileReply,
    DelConfigFromFileRequest, DelDpInterfacesReply, DelDpInterfacesRequest, DelDpsReply,
    DelDpsRequest, DpInfo, GetAclNamesReply, GetAclNamesRequest, GetConfigFileReply,
    GetConfigFileRequest, GetDpIdsReply, GetDpIdsRequest, GetDpInfoReply, GetDpInfoRequest,
    GetDpNamesReply, GetDpNamesRequest, InterfaceInfo, RemovePortAclReply, RemovePortAclRequest,
    RemovePortMirrorReply, RemovePortMirrorRequest, SetConfigFileReply, SetConfigFileRequest,
    SetDpInterfacesReply, SetDpInterfacesRequest, SetPortAclReply, SetPortAclRequest,
    SetRemoteMirrorPortReply, SetRemoteMirrorPortRequest,
};
use crate::grpc::{FaucetConfServer, FaucetConfServerServer};
use crate::ops::interfaces::{DpSpec, InterfaceSpec};
use crate::ops::query;
use crate::processor::txn::ConfigEngine;

use tracectl::{LevelFilter, trace_target};
trace_target!("grpc", LevelFilter::INFO, &["mgmt"]);

/// Build the configuration fragment of an interface out of its description in a request.
/// The name and description, if given, complement the YAML configuration.
fn interface_config(iface: &InterfaceInfo) -> ConfResult<Value> {
    let mut config = match parse_document(&iface.config_yaml)? {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        _ => {
            return Err(ConfError::InvalidArgument(format!(
                "configuration of port {} is not a mapping",
                iface.port_no
            )));
        }
    };
    if !iface.name.is_empty() {
        config.insert(key("name"), key(&iface.name));
    }
    if !iface.description.is_empty() {
        config.insert(key("description"), key(&iface.description));
    }
    Ok(Value::Mapping(config))
}

/// Convert the datapaths of a request
fn dp_specs(dps: &[DpInfo], with_config: bool) -> ConfResult<Vec<DpSpec>> {
    dps.iter()
        .map(|dp| {
            let interfaces = dp
                .interfaces
                .iter()
                .map(|iface| {
                    Ok(InterfaceSpec {
                        port: iface.port_no,
                        config: if with_config {
                            interface_config(iface)?
                        } else {
                            Value::Null
                        },
                    })
                })
                .collect::<ConfResult<Vec<_>>>()?;
            Ok(DpSpec {
                dp: dp.name.clone(),
                interfaces,
            })
        })
        .collect()
}

impl From<query::DpInfo> for DpInfo {
    fn from(info: query::DpInfo) -> Self {
        DpInfo {
            name: info.name,
            dp_id: info.dp_id,
            description: info.description,
            interfaces: info
                .interfaces
                .into_iter()
                .map(|iface| InterfaceInfo {
                    port_no: iface.port,
                    name: iface.name,
                    description: iface.description,
                    config_yaml: iface.config,
                })
                .collect(),
        }
    }
}

/// Implementation of the gRPC server
pub struct ConfServerImpl {
    engine: Arc<ConfigEngine>,
}

impl ConfServerImpl {
    pub fn new(engine: Arc<ConfigEngine>) -> Self {
        Self { engine }
    }

    /// Run an operation on a blocking worker and build the response. Requests are logged
    /// with their reply or, on failure, with the error, which is reported with a single
    /// status code.
    async fn run<R, T, F>(
        &self,
        method: &'static str,
        request: R,
        op: F,
    ) -> Result<Response<T>, Status>
    where
        R: Debug + Send + 'static,
        T: Debug + Send + 'static,
        F: FnOnce(&ConfigEngine, &R) -> ConfResult<T> + Send + 'static,
    {
        debug!("{method}: {request:?}");
        let engine = Arc::clone(&self.engine);
        let outcome = tokio::task::spawn_blocking(move || {
            let result = op(&engine, &request);
            (request, result)
        })
        .await;

        match outcome {
            Ok((request, Ok(reply))) => {
                info!("{method}: request {request:?}: reply {reply:?}");
                Ok(Response::new(reply))
            }
            Ok((request, Err(e))) => {
                error!("{method} failed: {e}. Request was: {request:?}");
                Err(Status::unknown(e.to_string()))
            }
            Err(e) => {
                error!("{method} aborted: {e}");
                Err(Status::unknown(format!("{method} aborted")))
            }
        }
    }
}

#[async_trait]
impl FaucetConfServer for ConfServerImpl {
    async fn get_config_file(
        &self,
        request: Request<GetConfigFileRequest>,
    ) -> Result<Response<GetConfigFileReply>, Status> {
        self.run("GetConfigFile", request.into_inner(), |engine, req| {
            let config_yaml = engine.read_text(&req.config_filename)?;
            Ok(GetConfigFileReply { config_yaml })
        })
        .await
    }

    async fn set_config_file(
        &self,
        request: Request<SetConfigFileRequest>,
    ) -> Result<Response<SetConfigFileReply>, Status> {
        self.run("SetConfigFile", request.into_inner(), |engine, req| {
            engine.set_document(
                &req.config_filename,
                &req.config_yaml,
                req.merge,
                &req.del_config_yaml_keys,
            )?;
            Ok(SetConfigFileReply {})
        })
        .await
    }

    async fn del_config_from_file(
        &self,
        request: Request<DelConfigFromFileRequest>,
    ) -> Result<Response<DelConfigFromFileReply>, Status> {
        self.run("DelConfigFromFile", request.into_inner(), |engine, req| {
            engine.delete_from_document(&req.config_filename, &req.config_yaml_keys)?;
            Ok(DelConfigFromFileReply {})
        })
        .await
    }

    async fn get_dp_info(
        &self,
        request: Request<GetDpInfoRequest>,
    ) -> Result<Response<GetDpInfoReply>, Status> {
        self.run("GetDpInfo", request.into_inner(), |engine, req| {
            let dps = engine.get_dp_info(&req.config_filename, &req.dp_name)?;
            Ok(GetDpInfoReply {
                dps: dps.into_iter().map(DpInfo::from).collect(),
            })
        })
        .await
    }

    async fn add_port_mirror(
        &self,
        request: Request<AddPortMirrorRequest>,
    ) -> Result<Response<AddPortMirrorReply>, Status> {
        self.run("AddPortMirror", request.into_inner(), |engine, req| {
            engine.add_port_mirror(&req.dp_name, req.port_no, req.mirror_port_no)?;
            Ok(AddPortMirrorReply {})
        })
        .await
    }

    async fn remove_port_mirror(
        &self,
        request: Request<RemovePortMirrorRequest>,
    ) -> Result<Response<RemovePortMirrorReply>, Status> {
        self.run("RemovePortMirror", request.into_inner(), |engine, req| {
            engine.remove_port_mirror(&req.dp_name, req.port_no, req.mirror_port_no)?;
            Ok(RemovePortMirrorReply {})
        })
        .await
    }

    async fn clear_port_mirror(
        &self,
        request: Request<ClearPortMirrorRequest>,
    ) -> Result<Response<ClearPortMirrorReply>, Status> {
        self.run("ClearPortMirror", request.into_inner(), |engine, req| {
            engine.clear_port_mirror(&req.dp_name, req.mirror_port_no)?;
            Ok(ClearPortMirrorReply {})
        })
        .await
    }

    async fn add_port_acl(
        &self,
        request: Request<AddPortAclRequest>,
    ) -> Result<Response<AddPortAclReply>, Status> {
        self.run("AddPortAcl", request.into_inner(), |engine, req| {
            engine.add_port_acl(&req.dp_name, req.port_no, &req.acl)?;
            Ok(AddPortAclReply {})
        })
        .await
    }

    async fn remove_port_acl(
        &self,
        request: Request<RemovePortAclRequest>,
    ) -> Result<Response<RemovePortAclReply>, Status> {
        self.run("RemovePortAcl", request.into_inner(), |engine, req| {
            engine.remove_port_acl(&req.dp_name, req.port_no, &req.acl)?;
            Ok(RemovePortAclReply {})
        })
        .await
    }

    async fn set_port_acl(
        &self,
        request: Request<SetPortAclRequest>,
    ) -> Result<Response<SetPortAclReply>, Status> {
        self.run("SetPortAcl", request.into_inner(), |engine, req| {
            engine.set_port_acl(&req.dp_name, req.port_no, &req.acls)?;
            Ok(SetPortAclReply {})
        })
        .await
    }

    async fn set_dp_interfaces(
        &self,
        request: Request<SetDpInterfacesRequest>,
    ) -> Result<Response<SetDpInterfacesReply>, Status> {
        self.run("SetDpInterfaces", request.into_inner(), |engine, req| {
            engine.set_dp_interfaces(&dp_specs(&req.interfaces_config, true)?)?;
            Ok(SetDpInterfacesReply {})
        })
        .await
    }

    async fn del_dp_interfaces(
        &self,
        request: Request<DelDpInterfacesRequest>,
    ) -> Result<Response<DelDpInterfacesReply>, Status> {
        self.run("DelDpInterfaces", request.into_inner(), |engine, req| {
            let dps = dp_specs(&req.interfaces_config, false)?;
            engine.del_dp_interfaces(&dps, req.delete_empty_dp)?;
            Ok(DelDpInterfacesReply {})
        })
        .await
    }

    async fn del_dps(
        &self,
        request: Request<DelDpsRequest>,
    ) -> Result<Response<DelDpsReply>, Status> {
        self.run("DelDps", request.into_inner(), |engine, req| {
            let names: Vec<String> = req
                .interfaces_config
                .iter()
                .map(|dp| dp.name.clone())
                .collect();
            engine.del_dps(&names)?;
            Ok(DelDpsReply {})
        })
        .await
    }

    async fn set_remote_mirror_port(
        &self,
        request: Request<SetRemoteMirrorPortRequest>,
    ) -> Result<Response<SetRemoteMirrorPortReply>, Status> {
        self.run("SetRemoteMirrorPort", request.into_inner(), |engine, req| {
            let vid = u16::try_from(req.tunnel_vid).map_err(|_| {
                ConfError::InvalidArgument(format!("invalid tunnel VLAN id {}", req.tunnel_vid))
            })?;
            engine.set_remote_mirror_port(
                &req.dp_name,
                req.port_no,
                vid,
                &req.remote_dp_name,
                req.remote_port_no,
            )?;
            Ok(SetRemoteMirrorPortReply {})
        })
        .await
    }

    async fn get_dp_names(
        &self,
        request: Request<GetDpNamesRequest>,
    ) -> Result<Response<GetDpNamesReply>, Status> {
        self.run("GetDpNames", request.into_inner(), |engine, _| {
            Ok(GetDpNamesReply {
                dp_name: engine.get_dp_names()?,
            })
        })
        .await
    }

    async fn get_dp_ids(
        &self,
        request: Request<GetDpIdsRequest>,
    ) -> Result<Response<GetDpIdsReply>, Status> {
        self.run("GetDpIds", request.into_inner(), |engine, _| {
            Ok(GetDpIdsReply {
                dp_id: engine.get_dp_ids()?,
            })
        })
        .await
    }

    async fn get_acl_names(
        &self,
        request: Request<GetAclNamesRequest>,
    ) -> Result<Response<GetAclNamesReply>, Status> {
        self.run("GetAclNames", request.into_inner(), |engine, _| {
            Ok(GetAclNamesReply {
                acl_name: engine.get_acl_names()?,
            })
        })
        .await
    }
}

/// Function to create the gRPC service
pub fn create_config_service(engine: Arc<ConfigEngine>) -> FaucetConfServerServer<ConfServerImpl> {
    FaucetConfServerServer::new(ConfServerImpl::new(engine))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // valid in tests
mod test {
    use super::*;
    use crate::ops::test_env::TestEnv;
    use pretty_assertions::assert_eq;
    use test_utils::TWO_SWITCHES;
    use tonic::Code;
    use tracing_test::traced_test;

    fn server(env: &TestEnv) -> ConfServerImpl {
        let dir = env.engine.dir().clone();
        let engine =
            ConfigEngine::new(dir, Box::new(config::FaucetRules), "faucet.yaml").unwrap();
        ConfServerImpl::new(Arc::new(engine))
    }

    fn iface(port_no: u32, name: &str, config_yaml: &str) -> InterfaceInfo {
        InterfaceInfo {
            port_no,
            name: name.to_owned(),
            description: String::new(),
            config_yaml: config_yaml.to_owned(),
        }
    }

    #[test]
    fn interface_fragments() {
        let config = interface_config(&iface(3, "host", "{acls_in: [a]}")).unwrap();
        assert_eq!(config, parse_document("{acls_in: [a], name: host}").unwrap());
        assert_eq!(
            interface_config(&iface(3, "", "")).unwrap(),
            parse_document("{}").unwrap()
        );
        assert!(interface_config(&iface(3, "", "[a]")).is_err());
    }

    #[tokio::test]
    async fn config_file_round_trip() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        let reply = svc
            .get_config_file(Request::new(GetConfigFileRequest::default()))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(reply.config_yaml, TWO_SWITCHES);

        svc.set_config_file(Request::new(SetConfigFileRequest {
            config_filename: "faucet.yaml".to_owned(),
            config_yaml: "dps: {sw2: {description: changed}}".to_owned(),
            merge: true,
            del_config_yaml_keys: String::new(),
        }))
        .await
        .unwrap();
        assert_eq!(
            env.at("dps.sw2.description"),
            Some(parse_document("changed").unwrap())
        );

        svc.del_config_from_file(Request::new(DelConfigFromFileRequest {
            config_filename: String::new(),
            config_yaml_keys: "[vlans]".to_owned(),
        }))
        .await
        .unwrap();
        assert!(env.at("vlans").is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_unknown() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        let status = svc
            .add_port_mirror(Request::new(AddPortMirrorRequest {
                dp_name: "sw9".to_owned(),
                port_no: 1,
                mirror_port_no: 3,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), "Not found: datapath 'sw9'");
        assert!(logs_contain("AddPortMirror failed"));

        let status = svc
            .get_config_file(Request::new(GetConfigFileRequest {
                config_filename: "../../etc/passwd".to_owned(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unknown);
    }

    #[tokio::test]
    #[traced_test]
    async fn requests_are_logged_with_their_reply() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        svc.get_dp_names(Request::new(GetDpNamesRequest {}))
            .await
            .unwrap();
        assert!(logs_contain("GetDpNames: request GetDpNamesRequest"));
        assert!(logs_contain("reply GetDpNamesReply"));
    }

    async fn port_config(svc: &ConfServerImpl, dp: &str, port: u32) -> Value {
        let reply = svc
            .get_dp_info(Request::new(GetDpInfoRequest {
                config_filename: "faucet.yaml".to_owned(),
                dp_name: dp.to_owned(),
            }))
            .await
            .unwrap()
            .into_inner();
        let iface = reply.dps[0]
            .interfaces
            .iter()
            .find(|i| i.port_no == port)
            .unwrap();
        parse_document(&iface.config_yaml).unwrap()
    }

    #[tokio::test]
    async fn add_show_remove_acl() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        let acl = |name: &str| AddPortAclRequest {
            dp_name: "sw1".to_owned(),
            port_no: 1,
            acl: name.to_owned(),
        };

        svc.add_port_acl(Request::new(acl("deny_all"))).await.unwrap();
        let config = port_config(&svc, "sw1", 1).await;
        assert_eq!(
            config,
            parse_document(
                "{name: host1, description: first host, native_vlan: office, acls_in: [deny_all]}"
            )
            .unwrap()
        );

        let status = svc
            .add_port_acl(Request::new(acl("no_such_acl")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unknown);
        assert!(status.message().contains("no_such_acl"));

        svc.remove_port_acl(Request::new(RemovePortAclRequest {
            dp_name: "sw1".to_owned(),
            port_no: 1,
            acl: "deny_all".to_owned(),
        }))
        .await
        .unwrap();
        let config = port_config(&svc, "sw1", 1).await;
        assert_eq!(
            config,
            parse_document("{name: host1, description: first host, native_vlan: office}").unwrap()
        );
    }

    #[tokio::test]
    async fn interfaces_and_queries() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        svc.set_dp_interfaces(Request::new(SetDpInterfacesRequest {
            interfaces_config: vec![DpInfo {
                name: "sw2".to_owned(),
                interfaces: vec![iface(2, "host4", "{acls_in: [allow_all]}")],
                ..Default::default()
            }],
        }))
        .await
        .unwrap();

        let reply = svc
            .get_dp_info(Request::new(GetDpInfoRequest {
                config_filename: String::new(),
                dp_name: "sw2".to_owned(),
            }))
            .await
            .unwrap()
            .into_inner();
        let names: Vec<&str> = reply.dps[0]
            .interfaces
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, ["host3", "host4", ""]);

        svc.del_dp_interfaces(Request::new(DelDpInterfacesRequest {
            interfaces_config: vec![DpInfo {
                name: "sw2".to_owned(),
                interfaces: vec![iface(2, "", ""), iface(1, "", "")],
                ..Default::default()
            }],
            delete_empty_dp: false,
        }))
        .await
        .unwrap();

        svc.del_dps(Request::new(DelDpsRequest {
            interfaces_config: vec![DpInfo {
                name: "sw2".to_owned(),
                ..Default::default()
            }],
        }))
        .await
        .unwrap();

        let names = svc
            .get_dp_names(Request::new(GetDpNamesRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(names.dp_name, ["sw1"]);
        let ids = svc
            .get_dp_ids(Request::new(GetDpIdsRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(ids.dp_id, [1]);
        let acls = svc
            .get_acl_names(Request::new(GetAclNamesRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(acls.acl_name, ["allow_all", "deny_all"]);
    }

    #[tokio::test]
    async fn mirror_and_tunnel() {
        let env = TestEnv::new(TWO_SWITCHES);
        let svc = server(&env);
        svc.add_port_mirror(Request::new(AddPortMirrorRequest {
            dp_name: "sw1".to_owned(),
            port_no: 1,
            mirror_port_no: 4,
        }))
        .await
        .unwrap();
        svc.remove_port_mirror(Request::new(RemovePortMirrorRequest {
            dp_name: "sw1".to_owned(),
            port_no: 2,
            mirror_port_no: 4,
        }))
        .await
        .unwrap();
        svc.clear_port_mirror(Request::new(ClearPortMirrorRequest {
            dp_name: "sw1".to_owned(),
            mirror_port_no: 3,
        }))
        .await
        .unwrap();
        let model = env.engine.read_model("").unwrap();
        assert_eq!(model.mirror_set("sw1", 4).unwrap(), [1]);
        assert!(model.mirror_set("sw1", 3).unwrap().is_empty());

        svc.set_port_acl(Request::new(SetPortAclRequest {
            dp_name: "sw1".to_owned(),
            port_no: 1,
            acls: "deny_all,allow_all".to_owned(),
        }))
        .await
        .unwrap();
        assert_eq!(
            env.at("dps.sw1.interfaces.1.acls_in"),
            Some(parse_document("[deny_all, allow_all]").unwrap())
        );

        let status = svc
            .set_remote_mirror_port(Request::new(SetRemoteMirrorPortRequest {
                dp_name: "sw1".to_owned(),
                port_no: 8,
                tunnel_vid: 70_000,
                remote_dp_name: "sw2".to_owned(),
                remote_port_no: 1,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unknown);

        svc.set_remote_mirror_port(Request::new(SetRemoteMirrorPortRequest {
            dp_name: "sw1".to_owned(),
            port_no: 8,
            tunnel_vid: 100,
            remote_dp_name: "sw2".to_owned(),
            remote_port_no: 1,
        }))
        .await
        .unwrap();
        assert!(env.at("acls.remote-mirror-100-sw2-1").is_some());
    }
}
