// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display of the configuration model, for logs

use std::fmt::Display;

use crate::{DatapathModel, ParsedModel, PortModel};

macro_rules! PORT_FMT {
    () => {
        "  {:>6} {:<16} {:<24} {}"
    };
}

fn fmt_list<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl Display for PortModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extra = vec![];
        if !self.acls_in.is_empty() {
            extra.push(format!("acls_in=[{}]", fmt_list(&self.acls_in)));
        }
        if !self.mirror.is_empty() {
            extra.push(format!("mirror=[{}]", fmt_list(&self.mirror)));
        }
        if let Some(peer) = &self.stack {
            extra.push(format!("stack={}:{}", peer.dp, peer.port));
        }
        writeln!(
            f,
            PORT_FMT!(),
            self.number,
            self.name.as_deref().unwrap_or("-"),
            self.description.as_deref().unwrap_or("-"),
            extra.join(" ")
        )
    }
}

impl Display for DatapathModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp_id = self
            .dp_id
            .map_or_else(|| "none".to_owned(), |id| format!("{id:#x}"));
        writeln!(f, " datapath {} (dp_id: {dp_id})", self.name)?;
        if !self.ports.is_empty() {
            writeln!(f, PORT_FMT!(), "port", "name", "description", "")?;
        }
        for port in self.ports.values() {
            write!(f, "{port}")?;
        }
        Ok(())
    }
}

impl Display for ParsedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, " ━━━━━━━━━ Configuration ━━━━━━━━━")?;
        for dp in self.dps() {
            write!(f, "{dp}")?;
        }
        let acls: Vec<&str> = self.acl_names().collect();
        writeln!(f, " acls: {}", acls.join(", "))
    }
}
