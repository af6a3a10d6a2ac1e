//! Filesystem metadata derived from a node's JSON kind.
//!
//! Ownership, permissions and timestamps are never computed here: the mounted
//! view inherits them from the backing file. Only the file type, link count
//! and size depend on the node itself.

use std::fmt;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Number, Value as JsonValue};

use crate::canonical;
use crate::error::{Error, Result};

const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

/// The JSON kind of a node, as exposed through `user.json.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    String,
    Number,
    Object,
    Array,
    Boolean,
    Null,
}

impl NodeKind {
    pub fn of(node: &JsonValue) -> Self {
        match node {
            JsonValue::String(_) => NodeKind::String,
            JsonValue::Number(_) => NodeKind::Number,
            JsonValue::Object(_) => NodeKind::Object,
            JsonValue::Array(_) => NodeKind::Array,
            JsonValue::Bool(_) => NodeKind::Boolean,
            JsonValue::Null => NodeKind::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(NodeKind::String),
            "number" => Ok(NodeKind::Number),
            "object" => Ok(NodeKind::Object),
            "array" => Ok(NodeKind::Array),
            "boolean" => Ok(NodeKind::Boolean),
            "null" => Ok(NodeKind::Null),
            other => Err(Error::invalid(format!("unknown JSON type '{}'", other))),
        }
    }
}

/// The representation of a number, as exposed through `user.json.number.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Integral,
    Real,
}

impl NumberKind {
    pub fn of(number: &Number) -> Self {
        if number.is_f64() {
            NumberKind::Real
        } else {
            NumberKind::Integral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::Integral => "integral",
            NumberKind::Real => "real",
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integral" => Ok(NumberKind::Integral),
            "real" => Ok(NumberKind::Real),
            other => Err(Error::invalid(format!("unknown number type '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

impl From<NodeKind> for FileKind {
    fn from(kind: NodeKind) -> Self {
        if kind.is_composite() {
            FileKind::Directory
        } else {
            FileKind::RegularFile
        }
    }
}

/// Status of the backing file that every node inherits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostStat {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub blksize: u32,
}

impl HostStat {
    /// Stat the backing file without following a final symlink.
    pub fn of(path: &std::path::Path) -> Result<Self> {
        Ok(Self::from_metadata(&fs::symlink_metadata(path)?))
    }

    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        HostStat {
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            atime: unix_time(metadata.atime(), metadata.atime_nsec()),
            mtime: unix_time(metadata.mtime(), metadata.mtime_nsec()),
            ctime: unix_time(metadata.ctime(), metadata.ctime_nsec()),
            blksize: u32::try_from(metadata.blksize()).unwrap_or(4096),
        }
    }
}

fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = u32::try_from(nsecs).unwrap_or(0);
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs.unsigned_abs(), nanos)
    } else {
        UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0)
    }
}

/// Metadata reported for one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStat {
    pub kind: FileKind,
    /// Permission bits (`mode & 0o7777`) of the backing file.
    pub perm: u16,
    pub nlink: u32,
    pub size: u64,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub blksize: u32,
}

impl NodeStat {
    /// Full `st_mode`: the host's permission bits under this node's type bits.
    pub fn mode(&self) -> u32 {
        let type_bits = match self.kind {
            FileKind::Directory => S_IFDIR,
            FileKind::RegularFile => S_IFREG,
        };
        type_bits | u32::from(self.perm)
    }

    /// Number of 512-byte blocks covering `size`.
    pub fn blocks(&self) -> u64 {
        self.size.div_ceil(512)
    }
}

/// Derive metadata for `node` on top of the backing file's status.
pub fn classify(node: &JsonValue, host: &HostStat) -> Result<NodeStat> {
    let kind = NodeKind::of(node);
    Ok(NodeStat {
        kind: FileKind::from(kind),
        perm: (host.mode & 0o7777) as u16,
        nlink: link_count(node),
        size: size(node)?,
        uid: host.uid,
        gid: host.gid,
        atime: host.atime,
        mtime: host.mtime,
        ctime: host.ctime,
        blksize: host.blksize,
    })
}

/// Two plus the direct child count for containers, one for scalars.
pub fn link_count(node: &JsonValue) -> u32 {
    let children = match node {
        JsonValue::Object(map) => map.len(),
        JsonValue::Array(arr) => arr.len(),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
            return 1;
        }
    };
    u32::try_from(children).map_or(u32::MAX, |n| n.saturating_add(2))
}

/// Reported file size.
///
/// Containers are zero. Strings count the characters of their raw content,
/// not of the quoted form. Every other scalar is the length of its
/// canonical text.
pub fn size(node: &JsonValue) -> Result<u64> {
    let size = match node {
        JsonValue::Object(_) | JsonValue::Array(_) => 0,
        JsonValue::String(s) => s.chars().count(),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => {
            canonical::to_canonical_string(node)?.len()
        }
    };
    Ok(size as u64)
}
