// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration file names accepted from remote callers

use std::fmt::Display;
use std::path::Path;

use crate::{ConfError, ConfResult};

/// Extension every managed configuration file must have
pub const CONFIG_EXTENSION: &str = ".yaml";

/// A configuration file name that cannot escape the managed directory: a single path
/// component made of ASCII alphanumerics, `.` and `_`, ending in [`CONFIG_EXTENSION`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SafeName(String);

impl SafeName {
    pub fn new(name: &str) -> ConfResult<Self> {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let sanitized: String = base
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
            .collect();
        if !sanitized.ends_with(CONFIG_EXTENSION) || sanitized.len() == CONFIG_EXTENSION.len() {
            return Err(ConfError::InvalidFilename(
                name.to_owned(),
                "must be a name ending in .yaml",
            ));
        }
        if sanitized != name {
            return Err(ConfError::InvalidFilename(
                name.to_owned(),
                "only a plain file name made of alphanumerics, '.' and '_' is allowed",
            ));
        }
        Ok(Self(sanitized))
    }
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for SafeName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl TryFrom<&str> for SafeName {
    type Error = ConfError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for SafeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
