//! Loading and syncing the backing file.
//!
//! The whole document is rewritten in canonical form at every sync point.
//! There is no temp-file swap and no journal: a crash between a mutation and
//! the next sync loses the mutation, and a crash during the rewrite can leave
//! the backing file truncated.

use std::io::Write;
use std::{fs, io, path};

use serde_json::Value as JsonValue;

use crate::canonical;
use crate::error::Result;

pub fn load(file_path: &path::Path) -> Result<JsonValue> {
    log::debug!("Loading {}...", file_path.display());

    let file = fs::File::open(file_path)?;
    let reader = io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Overwrite `file_path` with the canonical text of `document`.
pub fn sync(document: &JsonValue, file_path: &path::Path) -> Result<()> {
    log::info!("Syncing document to {}...", file_path.display());

    let bytes = canonical::to_canonical_bytes(document)?;
    let mut f = fs::File::create(file_path)?;
    f.write_all(&bytes)?;

    Ok(())
}
