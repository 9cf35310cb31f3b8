// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Generates the server side of the `faucetconfserver.FaucetConfServer` gRPC service.
//! Messages are defined in `src/grpc/proto.rs`; only the service plumbing is generated.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";

/* (method, route, request, reply) */
#[rustfmt::skip]
const METHODS: &[(&str, &str, &str, &str)] = &[
    ("get_config_file", "GetConfigFile", "GetConfigFileRequest", "GetConfigFileReply"),
    ("set_config_file", "SetConfigFile", "SetConfigFileRequest", "SetConfigFileReply"),
    ("del_config_from_file", "DelConfigFromFile", "DelConfigFromFileRequest", "DelConfigFromFileReply"),
    ("get_dp_info", "GetDpInfo", "GetDpInfoRequest", "GetDpInfoReply"),
    ("add_port_mirror", "AddPortMirror", "AddPortMirrorRequest", "AddPortMirrorReply"),
    ("remove_port_mirror", "RemovePortMirror", "RemovePortMirrorRequest", "RemovePortMirrorReply"),
    ("clear_port_mirror", "ClearPortMirror", "ClearPortMirrorRequest", "ClearPortMirrorReply"),
    ("add_port_acl", "AddPortAcl", "AddPortAclRequest", "AddPortAclReply"),
    ("remove_port_acl", "RemovePortAcl", "RemovePortAclRequest", "RemovePortAclReply"),
    ("set_port_acl", "SetPortAcl", "SetPortAclRequest", "SetPortAclReply"),
    ("set_dp_interfaces", "SetDpInterfaces", "SetDpInterfacesRequest", "SetDpInterfacesReply"),
    ("del_dp_interfaces", "DelDpInterfaces", "DelDpInterfacesRequest", "DelDpInterfacesReply"),
    ("del_dps", "DelDps", "DelDpsRequest", "DelDpsReply"),
    ("set_remote_mirror_port", "SetRemoteMirrorPort", "SetRemoteMirrorPortRequest", "SetRemoteMirrorPortReply"),
    ("get_dp_names", "GetDpNames", "GetDpNamesRequest", "GetDpNamesReply"),
    ("get_dp_ids", "GetDpIds", "GetDpIdsRequest", "GetDpIdsReply"),
    ("get_acl_names", "GetAclNames", "GetAclNamesRequest", "GetAclNamesReply"),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let service = METHODS
        .iter()
        .fold(
            Service::builder()
                .name("FaucetConfServer")
                .package("faucetconfserver"),
            |service, (name, route, request, reply)| {
                service.method(
                    Method::builder()
                        .name(*name)
                        .route_name(*route)
                        .input_type(format!("crate::grpc::proto::{request}"))
                        .output_type(format!("crate::grpc::proto::{reply}"))
                        .codec_path(CODEC)
                        .build(),
                )
            },
        )
        .build();

    Builder::new()
        .build_client(false)
        .compile(&[service]);
}
