// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Document store: reads and atomically replaces configuration files in a managed directory.
//! The directory is always given explicitly; nothing here depends on the process' working
//! directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::document::{parse_document, render_document};
use crate::{ConfError, ConfResult, Document, SafeName};

use tracectl::{LevelFilter, trace_target};
trace_target!("store", LevelFilter::INFO, &["config"]);

/// Handle on the directory holding the managed configuration files
#[derive(Clone, Debug)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// Build a handle on an existing directory
    pub fn new(root: impl Into<PathBuf>) -> ConfResult<Self> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|e| ConfError::from_io(&root, &e))?;
        if !meta.is_dir() {
            return Err(ConfError::NotFound(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        debug!("Managing configuration files in {}", root.display());
        Ok(Self { root })
    }
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
    #[must_use]
    pub fn path_of(&self, name: &SafeName) -> PathBuf {
        self.root.join(name)
    }

    /// Validate a file name for use in this directory: it must be a [`SafeName`] and, if
    /// something already exists under that name, it must be a regular file.
    pub fn check_name(&self, name: &str) -> ConfResult<SafeName> {
        let name = SafeName::new(name)?;
        let path = self.path_of(&name);
        match fs::symlink_metadata(&path) {
            Ok(meta) if !meta.is_file() => Err(ConfError::InvalidFilename(
                name.to_string(),
                "exists but is not a regular file",
            )),
            _ => Ok(name),
        }
    }

    /// Read the raw text of a configuration file
    pub fn read_text(&self, name: &str) -> ConfResult<String> {
        let name = self.check_name(name)?;
        let path = self.path_of(&name);
        fs::read_to_string(&path).map_err(|e| ConfError::from_io(&path, &e))
    }

    /// Read and parse a configuration file
    pub fn read(&self, name: &str) -> ConfResult<Document> {
        let text = self.read_text(name)?;
        parse_document(&text)
    }

    /// Replace a configuration file with `doc`. The new content is written to a temporary
    /// file in the same directory which is then renamed over the target, so readers see
    /// either the old or the new file, never a partial one.
    pub fn write(&self, name: &str, doc: &Document) -> ConfResult {
        let name = self.check_name(name)?;
        let target = self.path_of(&name);
        let text = render_document(doc)?;
        let io_err = |e: std::io::Error| ConfError::from_io(&self.root, &e);

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        /* keep the mode of the file we replace */
        if let Ok(meta) = fs::metadata(&target) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(io_err)?;
        }

        tmp.persist(&target)
            .map_err(|e| ConfError::from_io(&target, &e.error))?;
        sync_dir(&self.root);
        info!("Wrote {} ({} bytes)", target.display(), text.len());
        Ok(())
    }
}

/// Flush the directory entry of a rename. Best effort: not every platform allows it.
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!("Could not sync directory {}: {e}", dir.display());
    }
}
