// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Pure document transformations: recursive merge and deletion by key path.

use serde_yaml_ng::Value;

use crate::document::{fmt_key, fmt_path};
use crate::{ConfError, ConfResult, Document};

/// Merge `overlay` into `base`.
/// Two mappings merge key by key, recursing into keys present on both sides; keys only in
/// `overlay` are appended after those of `base`. In every other case, including two
/// sequences, the overlay value replaces the base value.
#[must_use]
pub fn deep_merge(base: Document, overlay: Document) -> Document {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (k, v) in overlay {
                if let Some(existing) = base.get_mut(&k) {
                    let prior = std::mem::replace(existing, Value::Null);
                    *existing = deep_merge(prior, v);
                } else {
                    base.insert(k, v);
                }
            }
            Value::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}

/// Merge a whole document into another. Merging nothing (null) leaves `base` as is;
/// the root of a document is a mapping, so merging anything else into one is refused.
pub fn merge_documents(base: Document, overlay: Document) -> ConfResult<Document> {
    if overlay.is_null() {
        return Ok(base);
    }
    if !overlay.is_mapping() {
        return Err(ConfError::MergeConflict(
            "only a mapping can be merged into a document".to_owned(),
        ));
    }
    if !base.is_mapping() && !base.is_null() {
        return Err(ConfError::MergeConflict(
            "the current document is not a mapping".to_owned(),
        ));
    }
    Ok(deep_merge(base, overlay))
}

/// Return a copy of `doc` without the value at `path`.
/// All keys but the last are walked down, through mappings by key and through sequences by
/// integer index. The last key is removed from a parent mapping, or, if the parent is a
/// sequence, the first element equal to the key is removed.
pub fn delete_at_path(doc: &Document, path: &[Value]) -> ConfResult<Document> {
    let mut out = doc.clone();
    remove_at_path(&mut out, path)?;
    Ok(out)
}

/// In-place version of [`delete_at_path`]. `doc` is left untouched on failure.
pub fn remove_at_path(doc: &mut Document, path: &[Value]) -> ConfResult {
    let Some((last, parents)) = path.split_last() else {
        return Err(ConfError::InvalidArgument("empty key path".to_owned()));
    };
    let mut node = doc;
    for (depth, k) in parents.iter().enumerate() {
        node = descend(node, k, &path[..=depth])?;
    }
    match node {
        Value::Mapping(m) => m
            .shift_remove(last)
            .map(|_| ())
            .ok_or_else(|| ConfError::NotFound(format!("key '{}'", fmt_path(path)))),
        Value::Sequence(s) => {
            let pos = s.iter().position(|item| item == last).ok_or_else(|| {
                ConfError::NotFound(format!(
                    "value '{}' in '{}'",
                    fmt_key(last),
                    fmt_path(parents)
                ))
            })?;
            s.remove(pos);
            Ok(())
        }
        _ => Err(ConfError::PathThroughScalar(fmt_path(parents))),
    }
}

fn descend<'a>(node: &'a mut Value, k: &Value, walked: &[Value]) -> ConfResult<&'a mut Value> {
    let not_found = || ConfError::NotFound(format!("key '{}'", fmt_path(walked)));
    match node {
        Value::Mapping(m) => m.get_mut(k).ok_or_else(not_found),
        Value::Sequence(s) => k
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| s.get_mut(i))
            .ok_or_else(not_found),
        Value::Tagged(tagged) => descend(&mut tagged.value, k, walked),
        _ => Err(ConfError::PathThroughScalar(fmt_path(
            &walked[..walked.len() - 1],
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // valid in tests
mod test {
    use super::*;
    use crate::document::{parse_document, parse_key_path};
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        parse_document(text).unwrap()
    }

    #[test]
    fn merge_recurses_into_mappings() {
        let merged = deep_merge(doc("{a: {x: 0, y: 2}}"), doc("{a: {x: 1}}"));
        assert_eq!(merged, doc("{a: {x: 1, y: 2}}"));
    }

    #[test]
    fn merge_replaces_sequences() {
        let base = doc("{dps: {sw1: {interfaces: {1: {acls_in: [a, b], mirror: [2]}}}}}");
        let overlay = doc("{dps: {sw1: {interfaces: {1: {acls_in: [c]}}}}}");
        let merged = deep_merge(base, overlay);
        assert_eq!(
            merged,
            doc("{dps: {sw1: {interfaces: {1: {acls_in: [c], mirror: [2]}}}}}")
        );
    }

    #[test]
    fn merge_overlay_wins_on_shape_mismatch() {
        assert_eq!(deep_merge(doc("{a: {x: 1}}"), doc("{a: 3}")), doc("{a: 3}"));
        assert_eq!(deep_merge(doc("{a: 3}"), doc("{a: {x: 1}}")), doc("{a: {x: 1}}"));
        assert_eq!(deep_merge(doc("{a: [1]}"), doc("{a: {x: 1}}")), doc("{a: {x: 1}}"));
    }

    #[test]
    fn merge_is_deterministic() {
        let base = doc("{b: 1, a: {y: 2, x: 1}}");
        let overlay = doc("{c: 3, a: {z: 4, x: 5}}");
        let once = deep_merge(base.clone(), overlay.clone());
        let twice = deep_merge(base, overlay);
        assert_eq!(once, twice);
        let keys: Vec<String> = once
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_owned())
            .collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn merge_documents_shapes() {
        let base = doc("{dps: {sw1: {dp_id: 1}}}");
        assert_eq!(merge_documents(base.clone(), Value::Null).unwrap(), base);
        assert_eq!(
            merge_documents(Value::Null, doc("{a: 1}")).unwrap(),
            doc("{a: 1}")
        );
        assert!(matches!(
            merge_documents(base, doc("[1, 2]")),
            Err(ConfError::MergeConflict(_))
        ));
    }

    #[test]
    fn delete_removes_only_the_target() {
        let base = doc("{dps: {sw1: {interfaces: {3: {mirror: [1], description: m}, 4: {}}}}}");
        let path = parse_key_path("[dps, sw1, interfaces, 3, mirror]").unwrap();
        let out = delete_at_path(&base, &path).unwrap();
        assert_eq!(
            out,
            doc("{dps: {sw1: {interfaces: {3: {description: m}, 4: {}}}}}")
        );
    }

    #[test]
    fn delete_from_sequence_by_value() {
        let base = doc("{dps: {sw1: {interfaces: {3: {acls_in: [a, b, a]}}}}}");
        let path = parse_key_path("[dps, sw1, interfaces, 3, acls_in, a]").unwrap();
        let out = delete_at_path(&base, &path).unwrap();
        assert_eq!(out, doc("{dps: {sw1: {interfaces: {3: {acls_in: [b, a]}}}}}"));
    }

    #[test]
    fn delete_through_sequence_index() {
        let base = doc("{acls: {a: [{rule: {x: 1}}, {rule: {y: 2}}]}}");
        let path = parse_key_path("[acls, a, 1, rule]").unwrap();
        let out = delete_at_path(&base, &path).unwrap();
        assert_eq!(out, doc("{acls: {a: [{rule: {x: 1}}, {}]}}"));
    }

    #[test]
    fn delete_missing_path_fails_and_keeps_document() {
        let base = doc("{dps: {sw1: {interfaces: {3: {mirror: [1]}}}}}");
        let before = base.clone();
        let path = parse_key_path("[dps, sw2, interfaces]").unwrap();
        assert_eq!(
            delete_at_path(&base, &path),
            Err(ConfError::NotFound("key 'dps.sw2'".to_owned()))
        );
        let path = parse_key_path("[dps, sw1, interfaces, 9]").unwrap();
        assert!(matches!(
            delete_at_path(&base, &path),
            Err(ConfError::NotFound(_))
        ));
        assert_eq!(base, before);
    }

    #[test]
    fn delete_through_scalar_fails() {
        let base = doc("{dps: {sw1: {dp_id: 1}}}");
        let path = parse_key_path("[dps, sw1, dp_id, x, y]").unwrap();
        assert_eq!(
            delete_at_path(&base, &path),
            Err(ConfError::PathThroughScalar("dps.sw1.dp_id".to_owned()))
        );
        let path = parse_key_path("[dps, sw1, dp_id, x]").unwrap();
        assert_eq!(
            delete_at_path(&base, &path),
            Err(ConfError::PathThroughScalar("dps.sw1.dp_id".to_owned()))
        );
    }
}
