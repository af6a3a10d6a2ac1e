//! Operations delegated to the backing file and its filesystem.

use std::path;
use std::time::SystemTime;
use std::{fs, io};

use nix::sys::statvfs;
use nix::unistd::{self, AccessFlags};

use crate::error::Result;

/// Volume statistics of the filesystem holding the backing file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeStats {
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
    pub block_size: u32,
    pub name_max: u32,
    pub fragment_size: u32,
}

/// Check `mode` (an `access(2)` mask) against the backing file.
pub fn access(file_path: &path::Path, mode: i32) -> io::Result<()> {
    unistd::access(file_path, AccessFlags::from_bits_truncate(mode)).map_err(io::Error::from)
}

#[allow(clippy::unnecessary_cast)]
pub fn statfs(file_path: &path::Path) -> Result<VolumeStats> {
    let stats = statvfs::statvfs(file_path).map_err(io::Error::from)?;
    Ok(VolumeStats {
        blocks: stats.blocks() as u64,
        blocks_free: stats.blocks_free() as u64,
        blocks_available: stats.blocks_available() as u64,
        files: stats.files() as u64,
        files_free: stats.files_free() as u64,
        block_size: u32::try_from(stats.block_size()).unwrap_or(u32::MAX),
        name_max: u32::try_from(stats.name_max()).unwrap_or(u32::MAX),
        fragment_size: u32::try_from(stats.fragment_size()).unwrap_or(u32::MAX),
    })
}

/// Set the backing file's timestamps. `None` leaves a timestamp unchanged.
pub fn set_times(
    file_path: &path::Path,
    accessed: Option<SystemTime>,
    modified: Option<SystemTime>,
) -> Result<()> {
    let mut times = fs::FileTimes::new();
    if let Some(accessed) = accessed {
        times = times.set_accessed(accessed);
    }
    if let Some(modified) = modified {
        times = times.set_modified(modified);
    }

    fs::File::open(file_path)?.set_times(times)?;
    Ok(())
}
