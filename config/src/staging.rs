// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Validation of candidate documents. A candidate is never checked in place: the managed
//! directory is copied to a private staging directory, the candidate is written there
//! under its final name and the validator runs on that copy, so that included files are
//! resolved exactly as they would be once the candidate is committed.

use std::fs;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::{ConfError, ConfResult, ConfigDir, ConfigValidator, Document, ParsedModel, SafeName};

use tracectl::{LevelFilter, trace_target};
trace_target!("staging", LevelFilter::INFO, &["config"]);

/// Check that `candidate`, written as `name` in `dir`, would be an acceptable configuration.
/// Nothing in `dir` is modified.
pub fn validate_candidate(
    dir: &ConfigDir,
    validator: &dyn ConfigValidator,
    name: &SafeName,
    candidate: &Document,
) -> ConfResult<ParsedModel> {
    let staging = tempfile::Builder::new()
        .prefix("faucetconf-staging-")
        .tempdir()
        .map_err(|e| ConfError::Io("staging directory".to_owned(), e.to_string()))?;
    copy_tree(dir.root(), staging.path())?;

    let stage = ConfigDir::new(staging.path())?;
    stage.write(name.as_str(), candidate)?;
    let model = validator.check(&stage.path_of(name))?;
    if model.is_empty() {
        return Err(ConfError::InvalidConfig("no DPs are defined".to_owned()));
    }
    debug!(
        "Candidate {name} is valid: {} datapath(s)",
        model.dps().count()
    );
    Ok(model)
}

/// Copy the directories and regular files found under `from` into `to`
fn copy_tree(from: &Path, to: &Path) -> ConfResult {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).display().to_string();
            ConfError::Io(path, e.to_string())
        })?;
        let Ok(rel) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| ConfError::from_io(&dest, &e))?;
        } else if file_type.is_file() {
            trace!("Staging {}", rel.display());
            fs::copy(entry.path(), &dest).map_err(|e| ConfError::from_io(entry.path(), &e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // valid in tests
mod test {
    use super::validate_candidate;
    use crate::document::parse_document;
    use crate::{ConfError, ConfigDir, FaucetRules, SafeName};
    use pretty_assertions::assert_eq;
    use test_utils::{TWO_SWITCHES, TempConfigDir};

    #[test]
    fn candidate_sees_included_files() {
        let tmp = TempConfigDir::with_file("faucet.yaml", TWO_SWITCHES);
        tmp.write("inc/acls.yaml", "acls: {extra: [{rule: {actions: {allow: 1}}}]}");
        let dir = ConfigDir::new(tmp.path()).unwrap();
        let name = SafeName::new("faucet.yaml").unwrap();
        let before = tmp.bytes("faucet.yaml");

        let candidate = parse_document(
            "
include: [inc/acls.yaml]
dps: {sw3: {dp_id: 3, interfaces: {1: {acls_in: [extra]}}}}
",
        )
        .unwrap();
        let model = validate_candidate(&dir, &FaucetRules, &name, &candidate).unwrap();
        assert_eq!(model.dp_names().collect::<Vec<_>>(), ["sw3"]);

        /* the managed directory is untouched */
        assert_eq!(tmp.bytes("faucet.yaml"), before);
        assert_eq!(tmp.file_names(), ["faucet.yaml", "inc"]);
    }

    #[test]
    fn invalid_candidate_is_refused() {
        let tmp = TempConfigDir::with_file("faucet.yaml", TWO_SWITCHES);
        let dir = ConfigDir::new(tmp.path()).unwrap();
        let name = SafeName::new("faucet.yaml").unwrap();

        let candidate = parse_document("dps: {sw1: {dp_id: 1, interfaces: {1: {acls_in: [nope]}}}}")
            .unwrap();
        assert!(matches!(
            validate_candidate(&dir, &FaucetRules, &name, &candidate),
            Err(ConfError::InvalidConfig(_))
        ));
        let candidate = parse_document("vlans: {office: {vid: 100}}").unwrap();
        assert_eq!(
            validate_candidate(&dir, &FaucetRules, &name, &candidate).map(|_| ()),
            Err(ConfError::InvalidConfig("no DPs are defined".to_owned()))
        );
    }
}
