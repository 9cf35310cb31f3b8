// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration transaction engine.
//! Every change to a configuration file goes through [`ConfigEngine::transact`] or
//! [`ConfigEngine::apply`]: under the engine lock, the current document is loaded, a
//! [`Changeset`] is computed and applied to it, the resulting candidate is validated on a
//! staged copy of the configuration directory and, only if it is accepted, the file is
//! atomically replaced. Whole-document replacements skip the loading.

use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

use config::merge::remove_at_path;
use config::staging::validate_candidate;
use config::{
    ConfError, ConfResult, ConfigDir, ConfigValidator, Document, KeyPath, ParsedModel, SafeName,
    merge_documents,
};

use tracectl::{LevelFilter, trace_target};
trace_target!("engine", LevelFilter::INFO, &["mgmt"]);

/// What to do with the document once deletions have been applied
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Update {
    #[default]
    Keep,
    Merge(Document),
    Replace(Document),
}

/// A change to a configuration document: deletions by key path, applied in order, then an
/// update. Deleting a subtree and merging a new one replaces that subtree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changeset {
    pub deletions: Vec<KeyPath>,
    pub update: Update,
}

impl Changeset {
    #[must_use]
    pub fn merge(overlay: Document) -> Self {
        Self {
            deletions: vec![],
            update: Update::Merge(overlay),
        }
    }
    #[must_use]
    pub fn replace(doc: Document) -> Self {
        Self {
            deletions: vec![],
            update: Update::Replace(doc),
        }
    }
    #[must_use]
    pub fn delete(deletions: Vec<KeyPath>) -> Self {
        Self {
            deletions,
            update: Update::Keep,
        }
    }
    #[must_use]
    pub fn with_deletions(mut self, deletions: Vec<KeyPath>) -> Self {
        self.deletions = deletions;
        self
    }
    /// Tell if applying this changeset would leave any document untouched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.update == Update::Keep
    }

    /// Compute the document resulting from applying this changeset to `doc`
    pub fn apply_to(self, mut doc: Document) -> ConfResult<Document> {
        for path in &self.deletions {
            remove_at_path(&mut doc, path)?;
        }
        match self.update {
            Update::Keep => Ok(doc),
            Update::Merge(overlay) => merge_documents(doc, overlay),
            Update::Replace(new) => Ok(new),
        }
    }
}

/// Owner of a managed configuration directory. All mutations of the files in it are
/// serialized by the engine lock.
pub struct ConfigEngine {
    dir: ConfigDir,
    validator: Box<dyn ConfigValidator>,
    default_file: SafeName,
    lock: Mutex<()>,
}

impl ConfigEngine {
    pub fn new(
        dir: ConfigDir,
        validator: Box<dyn ConfigValidator>,
        default_file: &str,
    ) -> ConfResult<Self> {
        let default_file = dir.check_name(default_file)?;
        info!(
            "Managing configuration files in {} (default file is {default_file})",
            dir.root().display()
        );
        Ok(Self {
            dir,
            validator,
            default_file,
            lock: Mutex::new(()),
        })
    }
    #[must_use]
    pub fn dir(&self) -> &ConfigDir {
        &self.dir
    }
    #[must_use]
    pub fn default_file(&self) -> &SafeName {
        &self.default_file
    }

    /// Resolve a file name given by a caller; the empty name stands for the default file
    pub fn resolve_name(&self, name: &str) -> ConfResult<SafeName> {
        if name.is_empty() {
            Ok(self.default_file.clone())
        } else {
            self.dir.check_name(name)
        }
    }

    /// Raw text of a configuration file. No lock is taken: files are only ever replaced
    /// atomically, so this sees either the old or the new content.
    pub fn read_text(&self, name: &str) -> ConfResult<String> {
        self.dir.read_text(self.resolve_name(name)?.as_str())
    }
    /// Parsed content of a configuration file, without locking
    pub fn read(&self, name: &str) -> ConfResult<Document> {
        self.dir.read(self.resolve_name(name)?.as_str())
    }
    /// Model of the datapaths and ACLs of a configuration file, without locking
    pub fn read_model(&self, name: &str) -> ConfResult<ParsedModel> {
        ParsedModel::from_document(&self.read(name)?)
    }

    /// Apply a precomputed changeset. Replacing the whole document does not look at the
    /// current content, so it also creates a missing file or repairs a broken one.
    pub fn apply(&self, name: &str, changes: Changeset) -> ConfResult {
        match changes {
            Changeset {
                deletions,
                update: Update::Replace(doc),
            } if deletions.is_empty() => self.overwrite(name, doc),
            changes => self.run(name, |_| Ok(changes)),
        }
    }

    /// Read-modify-write transaction. `compute` is given the current document and its model
    /// and returns the changes to make; nobody else can modify the file in the meantime.
    pub fn transact<F>(&self, name: &str, compute: F) -> ConfResult
    where
        F: FnOnce(&Document, &ParsedModel) -> ConfResult<Changeset>,
    {
        self.run(name, |current| {
            let model = ParsedModel::from_document(current)?;
            compute(current, &model)
        })
    }

    fn run<F>(&self, name: &str, compute: F) -> ConfResult
    where
        F: FnOnce(&Document) -> ConfResult<Changeset>,
    {
        let name = self.resolve_name(name)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Starting transaction on {name}");

        let current = self.dir.read(name.as_str())?;
        let changes = compute(&current)?;
        if changes.is_empty() {
            debug!("Nothing to change in {name}");
            return Ok(());
        }
        let candidate = changes.apply_to(current.clone())?;
        if candidate == current {
            debug!("Transaction on {name} leaves it unchanged");
            return Ok(());
        }
        self.commit(&name, &candidate)
    }

    fn overwrite(&self, name: &str, doc: Document) -> ConfResult {
        let name = self.resolve_name(name)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Overwriting {name}");

        match self.dir.read(name.as_str()) {
            Ok(current) if current == doc => {
                debug!("{name} already has the requested content");
                return Ok(());
            }
            Ok(_) => {}
            Err(ConfError::NotFound(_)) => debug!("{name} does not exist and will be created"),
            Err(e) => debug!("Current content of {name} is discarded: {e}"),
        }
        self.commit(&name, &doc)
    }

    /// Validate a candidate and, if it is accepted, make it the content of the file
    fn commit(&self, name: &SafeName, candidate: &Document) -> ConfResult {
        let model = validate_candidate(&self.dir, self.validator.as_ref(), name, candidate)
            .inspect_err(|e| error!("Rejected new content for {name}: {e}"))?;
        self.dir.write(name.as_str(), candidate)?;
        info!("Committed new configuration to {name}");
        debug!("Configuration is now:\n{model}");
        Ok(())
    }
}
