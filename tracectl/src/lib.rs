// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Named tracing targets, declared where they are used and controllable at runtime.

pub mod control;
pub mod display;
pub mod targets;

// re-exports
pub use control::{TracingControl, TracingError, get_trace_ctl};
pub use tracing::level_filters::LevelFilter;
