//! The mounted document and the operations a filesystem bridge calls.

use std::path::PathBuf;
use std::time::SystemTime;
use std::{env, io, path};

use serde_json::Value as JsonValue;

use crate::classify::{self, FileKind, HostStat, NodeKind, NodeStat};
use crate::coerce::{self, Attribute};
use crate::error::{Error, Result};
use crate::host::{self, VolumeStats};
use crate::resolve::{self, Key};
use crate::{mutate, persist, scalar_io, Path};

/// One child of a directory-typed node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileKind,
}

/// A JSON document backed by a file on the host.
///
/// The in-memory tree is the only source of truth between sync points. Every
/// operation resolves its path from the root again; nothing is cached. Calls
/// are expected to arrive one at a time from a single dispatcher.
///
/// # Example
///
/// ```rust
/// use jsonfs_json_store::{path, DocumentStore};
/// use serde_json::json;
///
/// let mut store = DocumentStore::with_document(json!({"a": 1, "b": [10, 20]}), "doc.json");
///
/// assert_eq!(store.read(&path!("/b/1"), 4096, 0).unwrap(), b"20");
/// store.write(&path!("/b/1"), b"5", 1).unwrap();
/// assert_eq!(store.document()["b"][1], json!(25));
/// ```
pub struct DocumentStore {
    root: JsonValue,
    backing: PathBuf,
    handles: u64,
}

impl DocumentStore {
    /// Load the document stored at `backing`.
    pub fn open(backing: impl Into<PathBuf>) -> Result<DocumentStore> {
        let backing = absolute(backing.into())?;
        let root = persist::load(&backing)?;

        log::debug!(
            "Opened {} ({} at the root)",
            backing.display(),
            NodeKind::of(&root)
        );
        Ok(DocumentStore::with_document(root, backing))
    }

    /// Wrap an already-parsed document. Nothing is read from `backing` until
    /// an operation needs the host file.
    pub fn with_document(root: JsonValue, backing: impl Into<PathBuf>) -> DocumentStore {
        DocumentStore {
            root,
            backing: backing.into(),
            handles: 0,
        }
    }

    pub fn document(&self) -> &JsonValue {
        &self.root
    }

    pub fn backing_path(&self) -> &path::Path {
        &self.backing
    }

    fn node(&self, path: &Path) -> Result<&JsonValue> {
        Ok(resolve::resolve(&self.root, path)?.node)
    }

    fn next_handle(&mut self) -> u64 {
        self.handles += 1;
        self.handles
    }

    /// Check `mode` against the backing file after resolving `path`.
    pub fn access(&self, path: &Path, mode: i32) -> Result<()> {
        self.node(path)?;
        host::access(&self.backing, mode).map_err(|error| {
            log::debug!("access({}, {:o}) denied: {}", path, mode, error);
            Error::PermissionDenied { path: path.clone() }
        })
    }

    pub fn getattr(&self, path: &Path) -> Result<NodeStat> {
        let node = self.node(path)?;
        classify::classify(node, &HostStat::of(&self.backing)?)
    }

    /// List the children of an object (its keys) or array (its indices).
    pub fn readdir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entry = |name: String, child: &JsonValue| DirEntry {
            name,
            kind: FileKind::from(NodeKind::of(child)),
        };

        match self.node(path)? {
            JsonValue::Object(map) => Ok(map
                .iter()
                .map(|(key, child)| entry(key.clone(), child))
                .collect()),
            JsonValue::Array(arr) => Ok(arr
                .iter()
                .enumerate()
                .map(|(index, child)| entry(Key::Index(index).to_string(), child))
                .collect()),
            JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
                Err(Error::not_found(path))
            }
        }
    }

    /// Issue a handle for an existing node.
    ///
    /// Handles are a counter and nothing else; later calls never check them.
    pub fn open_node(&mut self, path: &Path) -> Result<u64> {
        self.node(path)?;
        Ok(self.next_handle())
    }

    pub fn create(&mut self, path: &Path) -> Result<u64> {
        log::debug!("create {}", path);
        mutate::create(&mut self.root, path)?;
        Ok(self.next_handle())
    }

    pub fn mkdir(&mut self, path: &Path) -> Result<()> {
        log::debug!("mkdir {}", path);
        mutate::mkdir(&mut self.root, path)
    }

    /// Remove a node. Later siblings in an array move down one index.
    pub fn unlink(&mut self, path: &Path) -> Result<()> {
        log::debug!("unlink {}", path);
        mutate::remove(&mut self.root, path).map(|_| ())
    }

    pub fn rmdir(&mut self, path: &Path) -> Result<()> {
        log::debug!("rmdir {}", path);
        mutate::remove(&mut self.root, path).map(|_| ())
    }

    pub fn rename(&mut self, old: &Path, new: &Path) -> Result<()> {
        log::debug!("rename {} -> {}", old, new);
        mutate::rename(&mut self.root, old, new)
    }

    pub fn read(&self, path: &Path, size: usize, offset: u64) -> Result<Vec<u8>> {
        scalar_io::read(self.node(path)?, size, offset)
    }

    /// Write `data` at `offset`, returning the number of bytes consumed.
    ///
    /// For numbers and booleans a non-zero offset accumulates instead of
    /// replacing; the return value is `data.len()` either way.
    pub fn write(&mut self, path: &Path, data: &[u8], offset: u64) -> Result<usize> {
        let value = scalar_io::write(self.node(path)?, data, offset)?;
        log::debug!("write {} @{} -> {}", path, offset, NodeKind::of(&value));
        resolve::replace(&mut self.root, path, value)?;
        Ok(data.len())
    }

    /// Reset a scalar to its kind's zero value. `length` is not consulted;
    /// directories are left alone.
    pub fn truncate(&mut self, path: &Path, length: u64) -> Result<()> {
        log::debug!("truncate {} to {}", path, length);
        let zero = scalar_io::truncate(self.node(path)?);
        match zero {
            Some(zero) => resolve::replace(&mut self.root, path, zero),
            None => Ok(()),
        }
    }

    pub fn listxattr(&self, path: &Path) -> Result<Vec<&'static str>> {
        Ok(coerce::list_attributes(self.node(path)?)
            .iter()
            .map(Attribute::name)
            .collect())
    }

    pub fn getxattr(&self, path: &Path, name: &str) -> Result<&'static str> {
        coerce::get_attribute(self.node(path)?, Attribute::parse(name)?)
    }

    pub fn setxattr(&mut self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        let attribute = Attribute::parse(name)?;
        let converted = coerce::set_attribute(self.node(path)?, attribute, value)?;
        match converted {
            Some(converted) => {
                log::debug!(
                    "setxattr {} {} -> {}",
                    path,
                    attribute.name(),
                    NodeKind::of(&converted)
                );
                resolve::replace(&mut self.root, path, converted)
            }
            None => Ok(()),
        }
    }

    pub fn statfs(&self) -> Result<VolumeStats> {
        host::statfs(&self.backing)
    }

    /// Update the backing file's timestamps; the document has none of its own.
    pub fn utimens(&self, accessed: Option<SystemTime>, modified: Option<SystemTime>) -> Result<()> {
        host::set_times(&self.backing, accessed, modified)
    }

    /// Rewrite the backing file from the in-memory document.
    pub fn sync(&self) -> Result<()> {
        persist::sync(&self.root, &self.backing)
    }
}

fn absolute(file_path: PathBuf) -> io::Result<PathBuf> {
    if file_path.is_absolute() {
        Ok(file_path)
    } else {
        Ok(env::current_dir()?.join(file_path))
    }
}
