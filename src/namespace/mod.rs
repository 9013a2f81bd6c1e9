//! Namespace Module
//!
//! Translates slash-delimited paths into logical inode ids by descending the
//! directory tree from the root.
//!
//! ## Resolution
//! ```text
//!   "/d/f"  →  [d, f]
//!   #0 (root) ──scan slots for name "d"──► #3 ──scan slots for name "f"──► #7
//! ```
//! Direct slots are scanned before indirect ones; with duplicate names the
//! first slot wins.

pub mod path;

use crate::error::{LogFsError, Result};
use crate::log::Log;
use crate::record::{find_child, Inode};
use crate::table::InodeId;

/// Resolve `path` to the id of the entry it names
pub fn resolve(log: &Log, path: &str) -> Result<InodeId> {
    if path::is_root(path) {
        return Ok(InodeId::ROOT);
    }
    resolve_components(log, &path::components(path)?, path)
}

/// Resolve `path` and load the entry's latest record
pub fn lookup(log: &Log, path: &str) -> Result<Inode> {
    let id = resolve(log, path)?;
    log.load_inode(id)
}

/// Resolve already-split components; `path` is only used in errors
pub fn resolve_components(log: &Log, components: &[&str], path: &str) -> Result<InodeId> {
    let mut current = InodeId::ROOT;

    for component in components {
        let dir = log.load_inode(current)?;
        if !dir.is_dir() {
            return Err(LogFsError::NotFound(path.to_string()));
        }

        current = find_child(log, &dir, component)?
            .map(|child| child.id)
            .ok_or_else(|| LogFsError::NotFound(path.to_string()))?;
    }

    Ok(current)
}
