// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration processor.
//! Serializes the changes to the managed configuration files and serves them remotely.

pub mod launch;
pub mod txn;
