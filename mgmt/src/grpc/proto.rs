// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Messages of the `faucetconfserver` protocol

#![allow(clippy::derive_partial_eq_without_eq)]

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct GetConfigFileRequest {
    #[prost(string, tag = "1")]
    pub config_filename: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct GetConfigFileReply {
    #[prost(string, tag = "1")]
    pub config_yaml: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetConfigFileRequest {
    #[prost(string, tag = "1")]
    pub config_filename: String,
    #[prost(string, tag = "2")]
    pub config_yaml: String,
    #[prost(bool, tag = "3")]
    pub merge: bool,
    #[prost(string, tag = "4")]
    pub del_config_yaml_keys: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct SetConfigFileReply {}

#[derive(Clone, PartialEq, Message)]
pub struct DelConfigFromFileRequest {
    #[prost(string, tag = "1")]
    pub config_filename: String,
    #[prost(string, tag = "2")]
    pub config_yaml_keys: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct DelConfigFromFileReply {}

#[derive(Clone, PartialEq, Message)]
pub struct InterfaceInfo {
    #[prost(uint32, tag = "1")]
    pub port_no: u32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub config_yaml: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DpInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub dp_id: u64,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(message, repeated, tag = "4")]
    pub interfaces: Vec<InterfaceInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDpInfoRequest {
    #[prost(string, tag = "1")]
    pub config_filename: String,
    #[prost(string, tag = "2")]
    pub dp_name: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct GetDpInfoReply {
    #[prost(message, repeated, tag = "1")]
    pub dps: Vec<DpInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AddPortMirrorRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(uint32, tag = "3")]
    pub mirror_port_no: u32,
}
#[derive(Clone, PartialEq, Message)]
pub struct AddPortMirrorReply {}

#[derive(Clone, PartialEq, Message)]
pub struct RemovePortMirrorRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(uint32, tag = "3")]
    pub mirror_port_no: u32,
}
#[derive(Clone, PartialEq, Message)]
pub struct RemovePortMirrorReply {}

#[derive(Clone, PartialEq, Message)]
pub struct ClearPortMirrorRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub mirror_port_no: u32,
}
#[derive(Clone, PartialEq, Message)]
pub struct ClearPortMirrorReply {}

#[derive(Clone, PartialEq, Message)]
pub struct AddPortAclRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(string, tag = "3")]
    pub acl: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct AddPortAclReply {}

#[derive(Clone, PartialEq, Message)]
pub struct RemovePortAclRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(string, tag = "3")]
    pub acl: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct RemovePortAclReply {}

#[derive(Clone, PartialEq, Message)]
pub struct SetPortAclRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(string, tag = "3")]
    pub acls: String,
}
#[derive(Clone, PartialEq, Message)]
pub struct SetPortAclReply {}

#[derive(Clone, PartialEq, Message)]
pub struct SetDpInterfacesRequest {
    #[prost(message, repeated, tag = "1")]
    pub interfaces_config: Vec<DpInfo>,
}
#[derive(Clone, PartialEq, Message)]
pub struct SetDpInterfacesReply {}

#[derive(Clone, PartialEq, Message)]
pub struct DelDpInterfacesRequest {
    #[prost(message, repeated, tag = "1")]
    pub interfaces_config: Vec<DpInfo>,
    #[prost(bool, tag = "2")]
    pub delete_empty_dp: bool,
}
#[derive(Clone, PartialEq, Message)]
pub struct DelDpInterfacesReply {}

#[derive(Clone, PartialEq, Message)]
pub struct DelDpsRequest {
    #[prost(message, repeated, tag = "1")]
    pub interfaces_config: Vec<DpInfo>,
}
#[derive(Clone, PartialEq, Message)]
pub struct DelDpsReply {}

#[derive(Clone, PartialEq, Message)]
pub struct SetRemoteMirrorPortRequest {
    #[prost(string, tag = "1")]
    pub dp_name: String,
    #[prost(uint32, tag = "2")]
    pub port_no: u32,
    #[prost(uint32, tag = "3")]
    pub tunnel_vid: u32,
    #[prost(string, tag = "4")]
    pub remote_dp_name: String,
    #[prost(uint32, tag = "5")]
    pub remote_port_no: u32,
}
#[derive(Clone, PartialEq, Message)]
pub struct SetRemoteMirrorPortReply {}

#[derive(Clone, PartialEq, Message)]
pub struct GetDpNamesRequest {}
#[derive(Clone, PartialEq, Message)]
pub struct GetDpNamesReply {
    #[prost(string, repeated, tag = "1")]
    pub dp_name: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDpIdsRequest {}
#[derive(Clone, PartialEq, Message)]
pub struct GetDpIdsReply {
    #[prost(uint64, repeated, tag = "1")]
    pub dp_id: Vec<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetAclNamesRequest {}
#[derive(Clone, PartialEq, Message)]
pub struct GetAclNamesReply {
    #[prost(string, repeated, tag = "1")]
    pub acl_name: Vec<String>,
}
