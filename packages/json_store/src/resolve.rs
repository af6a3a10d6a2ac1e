//! Path resolution against the live document.
//!
//! Nodes have no identity of their own. A node is always "the value at key K
//! inside container C", found by walking from the root on every call, so a
//! mutation elsewhere in the tree can never leave a stale handle behind.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::Path;

/// The position of a node inside its parent container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Member(String),
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Member(name) => write!(f, "{}", name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

/// The (container, key, node) triple produced by resolution.
///
/// `parent` and `key` are `None` only for the document root.
#[derive(Debug)]
pub struct Resolution<'tree> {
    pub parent: Option<&'tree JsonValue>,
    pub key: Option<Key>,
    pub node: &'tree JsonValue,
}

/// Interpret a path segment as a key into `container`.
///
/// Objects take the segment verbatim. Arrays need a non-negative integer.
/// Scalars cannot be descended into at all.
pub fn child_key(container: &JsonValue, segment: &str) -> Option<Key> {
    match container {
        JsonValue::Object(_) => Some(Key::Member(segment.to_string())),
        JsonValue::Array(_) => segment.parse::<usize>().ok().map(Key::Index),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => None,
    }
}

pub fn child<'tree>(container: &'tree JsonValue, key: &Key) -> Option<&'tree JsonValue> {
    match (container, key) {
        (JsonValue::Object(map), Key::Member(name)) => map.get(name),
        (JsonValue::Array(arr), Key::Index(index)) => arr.get(*index),
        _ => None,
    }
}

fn child_mut<'tree>(container: &'tree mut JsonValue, key: &Key) -> Option<&'tree mut JsonValue> {
    match (container, key) {
        (JsonValue::Object(map), Key::Member(name)) => map.get_mut(name),
        (JsonValue::Array(arr), Key::Index(index)) => arr.get_mut(*index),
        _ => None,
    }
}

/// Walk `path` from the root, tracking the enclosing container and key.
pub fn resolve<'tree>(tree: &'tree JsonValue, path: &Path) -> Result<Resolution<'tree>> {
    let mut resolution = Resolution {
        parent: None,
        key: None,
        node: tree,
    };

    for component in path.iter() {
        let cursor = resolution.node;
        let key = child_key(cursor, component).ok_or_else(|| Error::not_found(path))?;
        let next = child(cursor, &key).ok_or_else(|| Error::not_found(path))?;
        resolution = Resolution {
            parent: Some(cursor),
            key: Some(key),
            node: next,
        };
    }

    Ok(resolution)
}

/// Get a mutable reference to the node at `path`.
pub fn resolve_mut<'tree>(tree: &'tree mut JsonValue, path: &Path) -> Result<&'tree mut JsonValue> {
    let mut cursor = tree;
    for component in path.iter() {
        let key = child_key(cursor, component).ok_or_else(|| Error::not_found(path))?;
        cursor = child_mut(cursor, &key).ok_or_else(|| Error::not_found(path))?;
    }

    Ok(cursor)
}

/// Replace the node at `path` inside its parent.
///
/// Nodes are never edited in place by the coercion and I/O engines; they
/// compute a new value and swap it in here. The root has no parent and
/// cannot be replaced.
pub fn replace(tree: &mut JsonValue, path: &Path, value: JsonValue) -> Result<()> {
    let (parent_path, name) = path
        .split_last()
        .ok_or_else(|| Error::invalid("the document root cannot be replaced"))?;

    let parent = resolve_mut(tree, &parent_path)?;
    let key = child_key(parent, name).ok_or_else(|| Error::not_found(path))?;
    let slot = child_mut(parent, &key).ok_or_else(|| Error::not_found(path))?;
    *slot = value;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn test_tree() -> JsonValue {
        json!({
            "a": 1,
            "b": [10, 20],
            "address": {"city": "NYC"},
            "name": "Alice",
        })
    }

    #[test]
    fn resolve_root() {
        let tree = test_tree();
        let resolution = resolve(&tree, &path!("/")).unwrap();
        assert!(resolution.parent.is_none());
        assert!(resolution.key.is_none());
        assert_eq!(resolution.node, &tree);
    }

    #[test]
    fn resolve_array_element_tracks_container() {
        let tree = test_tree();
        let resolution = resolve(&tree, &path!("/b/1")).unwrap();
        assert_eq!(resolution.node, &json!(20));
        assert_eq!(resolution.parent, Some(&json!([10, 20])));
        assert_eq!(resolution.key, Some(Key::Index(1)));
    }

    #[test]
    fn resolve_nested_member() {
        let tree = test_tree();
        let resolution = resolve(&tree, &path!("/address/city")).unwrap();
        assert_eq!(resolution.node, &json!("NYC"));
        assert_eq!(resolution.key, Some(Key::Member("city".to_string())));
    }

    #[test]
    fn missing_key_is_not_found() {
        let tree = test_tree();
        let err = resolve(&tree, &path!("/nonexistent")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn non_integer_array_segment_is_not_found() {
        let tree = test_tree();
        let err = resolve(&tree, &path!("/b/abc")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = resolve(&tree, &path!("/b/-1")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn out_of_range_index_is_not_found() {
        let tree = test_tree();
        let err = resolve(&tree, &path!("/b/2")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn descending_through_scalar_is_not_found() {
        let tree = test_tree();
        assert!(matches!(
            resolve(&tree, &path!("/name/invalid")).unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            resolve(&tree, &path!("/a/0")).unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn missing_intermediate_is_not_found() {
        let tree = test_tree();
        let err = resolve(&tree, &path!("/address/missing/deep")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn resolve_mut_edits_the_tree() {
        let mut tree = test_tree();
        *resolve_mut(&mut tree, &path!("/b/0")).unwrap() = json!(11);
        assert_eq!(tree["b"], json!([11, 20]));
    }

    #[test]
    fn replace_swaps_value_in_parent() {
        let mut tree = test_tree();
        replace(&mut tree, &path!("/address"), json!("unknown")).unwrap();
        assert_eq!(tree["address"], json!("unknown"));
    }

    #[test]
    fn replace_root_is_rejected() {
        let mut tree = test_tree();
        let err = replace(&mut tree, &path!("/"), json!(null)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(tree, test_tree());
    }

    #[test]
    fn replace_missing_is_not_found() {
        let mut tree = test_tree();
        let err = replace(&mut tree, &path!("/b/5"), json!(1)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
