// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Link-time registry of the tracing targets declared by every crate in the process

use crate::LevelFilter;
use linkme::distributed_slice;

/// A target as declared by [`trace_target!`] or [`custom_target!`]
pub struct LogTarget {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) groups: &'static [&'static str],
}
impl LogTarget {
    #[must_use]
    pub const fn new(
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        groups: &'static [&'static str],
    ) -> Self {
        Self {
            target,
            name,
            level,
            groups,
        }
    }
}

#[distributed_slice]
pub static LOG_TARGETS: [LogTarget];

#[macro_export]
/// Declare the enclosing module as a tracing target with a short name, a default level and
/// the groups it belongs to. The name and the groups can be used to change its level.
macro_rules! trace_target {
    ($name:expr, $level:expr, $groups:expr) => {
        const _: () = {
            use linkme::distributed_slice;
            use $crate::targets::{LOG_TARGETS, LogTarget};

            #[distributed_slice(LOG_TARGETS)]
            static LOG_TGT: LogTarget = LogTarget::new(module_path!(), $name, $level, $groups);
        };
    };
}

#[macro_export]
/// Declare a target that is not a module path of ours, e.g. that of a dependency
macro_rules! custom_target {
    ($target:expr, $level:expr, $groups:expr) => {
        const _: () = {
            use linkme::distributed_slice;
            use $crate::targets::{LOG_TARGETS, LogTarget};

            #[distributed_slice(LOG_TARGETS)]
            static LOG_TGT: LogTarget = LogTarget::new($target, $target, $level, $groups);
        };
    };
}
