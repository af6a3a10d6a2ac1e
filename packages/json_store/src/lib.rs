//! The engine behind jsonfs: a JSON document projected as a filesystem tree.
//!
//! Objects and arrays are directories, scalars are files. Everything here is
//! independent of the kernel bridge, which only translates inodes to paths
//! and errors to errno values.
//!
//! - [`resolve`]: path → (container, key, node)
//! - [`classify`]: node → file type, link count, size
//! - [`coerce`]: the `user.json.type` / `user.json.number.type` attributes
//! - [`mutate`]: create, mkdir, unlink/rmdir, rename
//! - [`scalar_io`]: offset-based read, write and truncate
//! - [`persist`]: load and sync the backing file
//! - [`DocumentStore`]: the mounted document tying these together

pub mod canonical;
pub mod classify;
pub mod coerce;
mod document;
mod error;
pub mod host;
pub mod mutate;
mod path;
pub mod persist;
pub mod resolve;
pub mod scalar_io;

pub use classify::{FileKind, HostStat, NodeKind, NodeStat, NumberKind};
pub use coerce::{Attribute, NUMBER_TYPE_ATTRIBUTE, TYPE_ATTRIBUTE};
pub use document::{DirEntry, DocumentStore};
pub use error::{Error, Result};
pub use host::VolumeStats;
pub use path::Path;
