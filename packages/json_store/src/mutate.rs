//! Structural changes to the document: create, mkdir, unlink/rmdir, rename.
//!
//! Arrays stay contiguous from index 0 after every operation. Creating past
//! the end pads the gap; deleting shifts later elements down by one. A caller
//! still holding the path of a later element will find a different node
//! there afterwards.

use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::resolve;
use crate::Path;

/// Create an empty-string leaf at `path`.
pub fn create(tree: &mut JsonValue, path: &Path) -> Result<()> {
    insert_default(tree, path, JsonValue::String(String::new()))
}

/// Create an empty object at `path`.
pub fn mkdir(tree: &mut JsonValue, path: &Path) -> Result<()> {
    insert_default(tree, path, JsonValue::Object(Map::new()))
}

/// Insert `fill` at `path`, padding arrays with copies of `fill` up to the
/// requested index. An existing entry at `path` is overwritten.
fn insert_default(tree: &mut JsonValue, path: &Path, fill: JsonValue) -> Result<()> {
    let (parent_path, name) = path
        .split_last()
        .ok_or_else(|| Error::invalid("the document root already exists"))?;

    match resolve::resolve_mut(tree, &parent_path)? {
        JsonValue::Array(arr) => {
            let index = array_index(name)?;
            if index < arr.len() {
                arr[index] = fill;
            } else {
                let len = index
                    .checked_add(1)
                    .ok_or_else(|| Error::invalid(format!("array index {} is too large", index)))?;
                arr.try_reserve(len - arr.len()).map_err(|error| {
                    Error::invalid(format!("cannot pad array to index {}: {}", index, error))
                })?;
                arr.resize(len, fill);
            }
        }
        JsonValue::Object(map) => {
            map.insert(name.to_string(), fill);
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
            return Err(Error::not_found(path));
        }
    }

    Ok(())
}

fn array_index(segment: &str) -> Result<usize> {
    segment.parse::<usize>().map_err(|_| {
        if segment.parse::<i64>().is_ok() {
            Error::invalid(format!("negative array index '{}'", segment))
        } else {
            Error::invalid(format!("'{}' is not an array index", segment))
        }
    })
}

/// Remove the node at `path` from its parent.
///
/// Removing array element `i` moves every element after it from `j` to
/// `j - 1`.
pub fn remove(tree: &mut JsonValue, path: &Path) -> Result<JsonValue> {
    let (parent_path, name) = path
        .split_last()
        .ok_or_else(|| Error::invalid("the document root cannot be removed"))?;

    match resolve::resolve_mut(tree, &parent_path)? {
        JsonValue::Object(map) => map.remove(name).ok_or_else(|| Error::not_found(path)),
        JsonValue::Array(arr) => {
            let index = name
                .parse::<usize>()
                .ok()
                .filter(|index| *index < arr.len())
                .ok_or_else(|| Error::not_found(path))?;
            Ok(arr.remove(index))
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
            Err(Error::not_found(path))
        }
    }
}

/// Move the node at `old` to `new`.
///
/// The value is inserted under the destination key first, silently replacing
/// whatever was there, and then removed from its original parent by its
/// original key. Array destinations follow the usual insertion rule: an
/// existing index is replaced and `len` appends.
pub fn rename(tree: &mut JsonValue, old: &Path, new: &Path) -> Result<()> {
    if old == new {
        resolve::resolve(tree, old)?;
        return Ok(());
    }
    if new.has_prefix(old) {
        return Err(Error::invalid(format!(
            "cannot move {} inside itself to {}",
            old, new
        )));
    }
    let (dest_parent_path, dest_name) = new
        .split_last()
        .ok_or_else(|| Error::invalid("the document root cannot be replaced"))?;

    let value = resolve::resolve(tree, old)?.node.clone();
    match resolve::resolve_mut(tree, &dest_parent_path)? {
        JsonValue::Object(map) => {
            map.insert(dest_name.to_string(), value);
        }
        JsonValue::Array(arr) => {
            let index = array_index(dest_name)?;
            match index.cmp(&arr.len()) {
                Ordering::Less => arr[index] = value,
                Ordering::Equal => arr.push(value),
                Ordering::Greater => return Err(Error::not_found(new)),
            }
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
            return Err(Error::not_found(new));
        }
    }

    // Overwriting an ancestor of the source already detached it.
    if !old.has_prefix(new) {
        remove(tree, old)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn assert_invalid<T: std::fmt::Debug>(result: Result<T>) {
        assert!(
            matches!(result, Err(Error::InvalidArgument { .. })),
            "expected InvalidArgument, got {:?}",
            result
        );
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T>) {
        assert!(
            matches!(result, Err(Error::NotFound { .. })),
            "expected NotFound, got {:?}",
            result
        );
    }

    #[test]
    fn create_in_object() {
        let mut tree = json!({"a": 1});
        create(&mut tree, &path!("/b")).unwrap();
        assert_eq!(tree, json!({"a": 1, "b": ""}));
    }

    #[test]
    fn create_overwrites_existing_member() {
        let mut tree = json!({"a": 1});
        create(&mut tree, &path!("/a")).unwrap();
        assert_eq!(tree, json!({"a": ""}));
    }

    #[test]
    fn create_appends_to_array() {
        let mut tree = json!({"b": [10, 20]});
        create(&mut tree, &path!("/b/2")).unwrap();
        assert_eq!(tree, json!({"b": [10, 20, ""]}));
    }

    #[test]
    fn create_past_end_pads_with_empty_strings() {
        let mut tree = json!({"b": [10, 20]});
        create(&mut tree, &path!("/b/5")).unwrap();
        assert_eq!(tree, json!({"b": [10, 20, "", "", "", ""]}));
    }

    #[test]
    fn mkdir_past_end_pads_with_empty_objects() {
        let mut tree = json!([]);
        mkdir(&mut tree, &path!("/3")).unwrap();
        assert_eq!(tree, json!([{}, {}, {}, {}]));
    }

    #[test]
    fn mkdir_in_object() {
        let mut tree = json!({});
        mkdir(&mut tree, &path!("/dir")).unwrap();
        mkdir(&mut tree, &path!("/dir/sub")).unwrap();
        assert_eq!(tree, json!({"dir": {"sub": {}}}));
    }

    #[test]
    fn create_with_bad_array_index_is_invalid() {
        let mut tree = json!({"b": [10]});
        assert_invalid(create(&mut tree, &path!("/b/-1")));
        assert_invalid(mkdir(&mut tree, &path!("/b/x")));
        assert_eq!(tree, json!({"b": [10]}));
    }

    #[test]
    fn padding_to_huge_index_is_invalid_and_leaves_array_alone() {
        let mut tree = json!({"l": [1, 2, 3]});
        for index in [usize::MAX, usize::MAX - 1, usize::MAX / 2] {
            let path = path!(&format!("/l/{}", index));
            assert_invalid(mkdir(&mut tree, &path));
            assert_invalid(create(&mut tree, &path));
        }
        assert_eq!(tree, json!({"l": [1, 2, 3]}));
    }

    #[test]
    fn create_under_scalar_is_not_found() {
        let mut tree = json!({"a": 1});
        assert_not_found(create(&mut tree, &path!("/a/x")));
        assert_not_found(create(&mut tree, &path!("/missing/x")));
    }

    #[test]
    fn create_root_is_invalid() {
        let mut tree = json!({});
        assert_invalid(create(&mut tree, &path!("/")));
    }

    #[test]
    fn remove_member() {
        let mut tree = json!({"a": 1, "b": 2});
        assert_eq!(remove(&mut tree, &path!("/a")).unwrap(), json!(1));
        assert_eq!(tree, json!({"b": 2}));
    }

    #[test]
    fn remove_array_element_shifts_later_indices_down() {
        let mut tree = json!({"b": [10, 20, 30]});
        remove(&mut tree, &path!("/b/0")).unwrap();
        assert_eq!(tree, json!({"b": [20, 30]}));
        assert_eq!(tree["b"][0], json!(20));
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut tree = json!({"b": [10]});
        assert_not_found(remove(&mut tree, &path!("/nope")));
        assert_not_found(remove(&mut tree, &path!("/b/1")));
        assert_not_found(remove(&mut tree, &path!("/b/x")));
        assert_invalid(remove(&mut tree, &path!("/")));
        assert_eq!(tree, json!({"b": [10]}));
    }

    #[test]
    fn rename_within_object() {
        let mut tree = json!({"a": 1, "b": {"c": true}});
        rename(&mut tree, &path!("/b"), &path!("/d")).unwrap();
        assert_eq!(tree, json!({"a": 1, "d": {"c": true}}));
    }

    #[test]
    fn rename_overwrites_destination() {
        let mut tree = json!({"a": 1, "b": 2});
        rename(&mut tree, &path!("/a"), &path!("/b")).unwrap();
        assert_eq!(tree, json!({"b": 1}));
    }

    #[test]
    fn rename_object_member_into_array() {
        let mut tree = json!({"a": "x", "list": [1]});
        rename(&mut tree, &path!("/a"), &path!("/list/1")).unwrap();
        assert_eq!(tree, json!({"list": [1, "x"]}));
    }

    #[test]
    fn rename_array_element_into_object() {
        let mut tree = json!({"list": [1, 2], "obj": {}});
        rename(&mut tree, &path!("/list/0"), &path!("/obj/first")).unwrap();
        assert_eq!(tree, json!({"list": [2], "obj": {"first": 1}}));
    }

    #[test]
    fn rename_within_array_inserts_then_removes_original_index() {
        let mut tree = json!(["a", "b", "c"]);
        rename(&mut tree, &path!("/0"), &path!("/3")).unwrap();
        assert_eq!(tree, json!(["b", "c", "a"]));

        let mut tree = json!(["a", "b", "c"]);
        rename(&mut tree, &path!("/2"), &path!("/0")).unwrap();
        assert_eq!(tree, json!(["c", "b"]));
    }

    #[test]
    fn rename_to_array_index_past_end_is_not_found() {
        let mut tree = json!({"a": 1, "list": []});
        assert_not_found(rename(&mut tree, &path!("/a"), &path!("/list/1")));
        assert_eq!(tree, json!({"a": 1, "list": []}));
    }

    #[test]
    fn rename_under_scalar_keeps_source() {
        let mut tree = json!({"a": 1, "s": "text"});
        assert_not_found(rename(&mut tree, &path!("/a"), &path!("/s/x")));
        assert_eq!(tree, json!({"a": 1, "s": "text"}));
    }

    #[test]
    fn rename_missing_source_is_not_found() {
        let mut tree = json!({"a": 1});
        assert_not_found(rename(&mut tree, &path!("/x"), &path!("/y")));
        assert_not_found(rename(&mut tree, &path!("/a"), &path!("/x/y")));
        assert_eq!(tree, json!({"a": 1}));
    }

    #[test]
    fn rename_onto_itself_is_a_no_op() {
        let mut tree = json!({"a": 1});
        rename(&mut tree, &path!("/a"), &path!("/a")).unwrap();
        assert_eq!(tree, json!({"a": 1}));
    }

    #[test]
    fn rename_into_own_subtree_is_invalid() {
        let mut tree = json!({"a": {"b": {}}});
        assert_invalid(rename(&mut tree, &path!("/a"), &path!("/a/b/c")));
        assert_invalid(rename(&mut tree, &path!("/"), &path!("/z")));
        assert_eq!(tree, json!({"a": {"b": {}}}));
    }

    #[test]
    fn rename_onto_ancestor_replaces_it() {
        let mut tree = json!({"x": {"y": {"z": 5, "w": 6}}});
        rename(&mut tree, &path!("/x/y/z"), &path!("/x/y")).unwrap();
        assert_eq!(tree, json!({"x": {"y": 5}}));
    }
}
