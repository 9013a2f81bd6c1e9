//! Path parsing
//!
//! Paths are slash-delimited and always taken from the root; a leading slash
//! is optional and empty components are skipped.

use crate::error::{LogFsError, Result};

/// Validated components of `path`, root first
pub fn components(path: &str) -> Result<Vec<&str>> {
    path.split('/')
        .filter(|component| !component.is_empty())
        .map(|component| match component {
            "." | ".." => Err(LogFsError::InvalidName(component.to_string())),
            _ => Ok(component),
        })
        .collect()
}

/// Split `path` into its parent components and final name.
///
/// The root has no parent and is rejected.
pub fn split_parent(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut components = components(path)?;
    let name = components
        .pop()
        .ok_or_else(|| LogFsError::InvalidPath(format!("{:?} names the root directory", path)))?;
    Ok((components, name))
}

/// Whether `path` names the root directory
pub fn is_root(path: &str) -> bool {
    path.split('/').all(str::is_empty)
}

