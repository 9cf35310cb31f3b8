// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Validators decide whether a configuration file, together with the files it includes,
//! is acceptable to the controller. A validator is given the path of the root file and
//! returns the structural model of the whole configuration, or the reason for refusing it.

use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::document::{fmt_key, parse_document};
use crate::{ConfError, ConfResult, Document, ParsedModel};

use tracectl::{LevelFilter, trace_target};
trace_target!("validator", LevelFilter::INFO, &["config"]);

/// Files listed under this key are loaded along with the including file
pub const INCLUDE: &str = "include";
/// Like [`INCLUDE`], but files that do not exist are skipped
pub const INCLUDE_OPTIONAL: &str = "include-optional";

/// Something able to tell whether a configuration is acceptable
pub trait ConfigValidator: Send + Sync {
    /// Check the configuration whose root file is `config_file`. Included files are
    /// looked up relative to the including file.
    fn check(&self, config_file: &Path) -> ConfResult<ParsedModel>;
}

/// The builtin validator. It loads the configuration with its includes and checks the
/// consistency rules a controller would reject a configuration for:
///  - at least one datapath is defined
///  - every datapath has a dp_id, and dp_ids are unique
///  - ACLs referenced by `acls_in` are defined
///  - mirrored ports exist on the datapath of the mirror port
///  - stack peers exist
#[derive(Clone, Copy, Debug, Default)]
pub struct FaucetRules;

impl FaucetRules {
    /// Load a configuration file and everything it includes into a single document.
    /// Datapaths and ACLs may only be defined once across all files.
    pub fn load(config_file: &Path) -> ConfResult<Document> {
        let mut loader = Loader::default();
        loader.load_file(config_file)?;
        Ok(Value::Mapping(loader.combined))
    }

    /// Load a configuration and build its model without applying any rule
    pub fn load_model(config_file: &Path) -> ConfResult<ParsedModel> {
        ParsedModel::from_document(&Self::load(config_file)?)
    }

    /// Apply the consistency rules to a model
    pub fn check_model(model: &ParsedModel) -> ConfResult {
        if model.is_empty() {
            return Err(ConfError::InvalidConfig("no DPs are defined".to_owned()));
        }
        let mut dp_ids: BTreeMap<u64, &str> = BTreeMap::new();
        for dp in model.dps() {
            let Some(dp_id) = dp.dp_id else {
                return Err(ConfError::InvalidConfig(format!(
                    "datapath '{}' has no dp_id",
                    dp.name
                )));
            };
            if let Some(other) = dp_ids.insert(dp_id, &dp.name) {
                return Err(ConfError::InvalidConfig(format!(
                    "datapaths '{other}' and '{}' have the same dp_id {dp_id}",
                    dp.name
                )));
            }
            for port in dp.ports.values() {
                let what = || format!("port {} of datapath '{}'", port.number, dp.name);
                if let Some(acl) = port.acls_in.iter().find(|acl| !model.has_acl(acl)) {
                    return Err(ConfError::InvalidConfig(format!(
                        "{} refers to unknown ACL '{acl}'",
                        what()
                    )));
                }
                if let Some(source) = port.mirror.iter().find(|p| !dp.has_port(**p)) {
                    return Err(ConfError::InvalidConfig(format!(
                        "{} mirrors port {source}, which is not configured",
                        what()
                    )));
                }
                if let Some(peer) = &port.stack {
                    let known = model
                        .dp(&peer.dp)
                        .is_ok_and(|other| other.has_port(peer.port));
                    if !known {
                        return Err(ConfError::InvalidConfig(format!(
                            "{} is stacked to unknown port {} of datapath '{}'",
                            what(),
                            peer.port,
                            peer.dp
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ConfigValidator for FaucetRules {
    fn check(&self, config_file: &Path) -> ConfResult<ParsedModel> {
        let model = Self::load_model(config_file)?;
        Self::check_model(&model)?;
        Ok(model)
    }
}

#[derive(Default)]
struct Loader {
    stack: Vec<PathBuf>, /* files being loaded, to detect loops */
    combined: Mapping,
}

impl Loader {
    fn load_file(&mut self, path: &Path) -> ConfResult {
        let real = path.canonicalize().map_err(|e| ConfError::from_io(path, &e))?;
        if self.stack.contains(&real) {
            return Err(ConfError::InvalidConfig(format!(
                "include loop detected at {}",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(|e| ConfError::from_io(path, &e))?;
        let mut root = match parse_document(&text)
            .map_err(|e| ConfError::InvalidConfig(format!("{}: {e}", path.display())))?
        {
            Value::Null => return Ok(()),
            Value::Mapping(root) => root,
            _ => {
                return Err(ConfError::InvalidConfig(format!(
                    "{}: configuration must be a mapping",
                    path.display()
                )));
            }
        };
        let required = take_includes(&mut root, INCLUDE, path)?;
        let optional = take_includes(&mut root, INCLUDE_OPTIONAL, path)?;
        self.absorb(root, path)?;

        let base = path.parent().unwrap_or(Path::new("."));
        self.stack.push(real);
        for name in required {
            self.load_file(&base.join(name))?;
        }
        for name in optional {
            let included = base.join(&name);
            if included.exists() {
                self.load_file(&included)?;
            } else {
                debug!("Skipping missing optional include {}", included.display());
            }
        }
        self.stack.pop();
        Ok(())
    }

    /// Add the sections of a file to the combined configuration
    fn absorb(&mut self, root: Mapping, path: &Path) -> ConfResult {
        for (section, content) in root {
            if !self.combined.contains_key(&section) {
                self.combined.insert(section, content);
                continue;
            }
            match (self.combined.get_mut(&section), content) {
                (Some(Value::Mapping(have)), Value::Mapping(more)) => {
                    for (name, item) in more {
                        if have.contains_key(&name) {
                            return Err(ConfError::InvalidConfig(format!(
                                "{}: {} '{}' is defined more than once",
                                path.display(),
                                fmt_key(&section),
                                fmt_key(&name)
                            )));
                        }
                        have.insert(name, item);
                    }
                }
                (_, Value::Null) => {}
                _ => warn!(
                    "{}: ignoring redefinition of '{}'",
                    path.display(),
                    fmt_key(&section)
                ),
            }
        }
        Ok(())
    }
}

/// Remove an include list from the root of a file and return the names it holds
fn take_includes(root: &mut Mapping, key: &str, path: &Path) -> ConfResult<Vec<String>> {
    let bad = || {
        ConfError::InvalidConfig(format!(
            "{}: '{key}' must be a list of file names",
            path.display()
        ))
    };
    match root.shift_remove(key) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Sequence(names)) => names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(name),
                _ => Err(bad()),
            })
            .collect(),
        Some(_) => Err(bad()),
    }
}

/// Delegates the decision to an external program, e.g. the controller's own config
/// checker. The program is run with the path of the root file as last argument and the
/// configuration is accepted if it exits successfully.
#[derive(Clone, Debug)]
pub struct ExternalChecker {
    command: PathBuf,
    args: Vec<String>,
}

impl ExternalChecker {
    #[must_use]
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Build a checker from a whitespace-separated command line
    pub fn from_command_line(line: &str) -> ConfResult<Self> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err(ConfError::InvalidArgument(
                "empty check command".to_owned(),
            ));
        };
        Ok(Self::new(command, words.map(str::to_owned).collect()))
    }
}

impl ConfigValidator for ExternalChecker {
    fn check(&self, config_file: &Path) -> ConfResult<ParsedModel> {
        debug!(
            "Running {} {:?} on {}",
            self.command.display(),
            self.args,
            config_file.display()
        );
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(config_file)
            .output()
            .map_err(|e| ConfError::Io(self.command.display().to_string(), e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let msg = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .map_or_else(
                    || format!("{} exited with {}", self.command.display(), output.status),
                    str::to_owned,
                );
            return Err(ConfError::InvalidConfig(msg));
        }
        FaucetRules::load_model(config_file)
    }
}
