// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display implementations

use crate::control::{TargetCfg, TargetCfgDb};
use std::fmt::Display;

macro_rules! TARGET_FMT {
    () => {
        "{:<16} │ {:<40} │ {:>6} │ {}"
    };
}

impl Display for TargetCfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            TARGET_FMT!(),
            self.name,
            self.target,
            self.level,
            self.groups.join(",")
        )
    }
}

impl Display for TargetCfgDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "──────── Tracing targets ────────")?;
        writeln!(f, TARGET_FMT!(), "NAME", "TARGET", "LEVEL", "GROUPS")?;
        for cfg in self.targets.values() {
            writeln!(f, "{cfg}")?;
        }
        write!(f, TARGET_FMT!(), "(default)", "--", self.level, "--")
    }
}
