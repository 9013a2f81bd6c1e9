//! Engine Module
//!
//! The filesystem engine that coordinates the log, the record layout, and the
//! namespace resolver.
//!
//! ## Responsibilities
//! - Format a fresh image with the root directory
//! - Implement the namespace operations a filesystem adapter calls
//! - Validate every operation before its first append, so a failed operation
//!   leaves the inode table untouched
//! - Expose statistics, verification, and sync
//!
//! ## Mutation Flow
//! ```text
//!   path ──resolve──► id ──table──► record ──copy──► mutate ──append──► table[id] = new address
//! ```

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::disk::{BackingStore, FileStore, MemoryStore, IMAGE_SIZE};
use crate::error::{LogFsError, Result};
use crate::log::{Log, LogStats};
use crate::namespace::{self, path};
use crate::record::{self, Inode, InodeKind};
use crate::table::InodeId;
use crate::verify::{self, VerifyReport};

/// Permission bits reported for every entry
pub const FIXED_PERMISSIONS: u32 = 0o777;

/// Attributes reported to the filesystem adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub id: InodeId,
    pub kind: InodeKind,
    /// Content length in bytes (0 for directories)
    pub size: u64,
    /// Modification time (unix seconds)
    pub modified: i64,
    /// Access time (unix seconds)
    pub accessed: i64,
}

impl Attributes {
    /// File-type bits plus the fixed permission bits
    pub fn mode(&self) -> u32 {
        let file_type = match self.kind {
            InodeKind::Directory => libc::S_IFDIR as u32,
            InodeKind::File => libc::S_IFREG as u32,
        };
        file_type | FIXED_PERMISSIONS
    }
}

impl From<&Inode> for Attributes {
    fn from(inode: &Inode) -> Self {
        Self {
            id: inode.id,
            kind: inode.kind,
            size: inode.size,
            modified: inode.modified,
            accessed: inode.accessed,
        }
    }
}

/// The filesystem engine
///
/// ## Concurrency Model: single caller
///
/// Every operation takes `&mut self` or `&self` and runs to completion. The
/// engine does no locking; callers that share it go through
/// [`crate::SharedEngine`].
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The log, its cursor, and the inode table
    log: Log,
}

impl Engine {
    /// Format a fresh image and create the root directory.
    ///
    /// An existing image file at the configured path is overwritten; nothing
    /// from a previous run is recovered.
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Choose the backing medium
        let medium: Box<dyn BackingStore> = match &config.image_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                Box::new(FileStore::create(
                    path,
                    IMAGE_SIZE as u64,
                    config.sync_on_rollover,
                )?)
            }
            None => Box::new(MemoryStore::new()),
        };

        // Step 2: Empty log over a zeroed image
        let mut log = Log::new(medium)?;

        // Step 3: Root directory at id 0
        log.append_inode(&Inode::root())?;

        tracing::info!(
            "Formatted {} byte image ({})",
            IMAGE_SIZE,
            config
                .image_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in memory".to_string())
        );

        Ok(Self { config, log })
    }

    /// Open an in-memory engine (convenience method)
    pub fn in_memory() -> Result<Self> {
        Self::open(Config::default())
    }

    /// Open with an image file path (convenience method)
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().image_path(path).build())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Resolve `path` to an inode id
    pub fn resolve(&self, path: &str) -> Result<InodeId> {
        namespace::resolve(&self.log, path)
    }

    /// Kind, size and timestamps of the entry at `path`
    pub fn get_attributes(&self, path: &str) -> Result<Attributes> {
        let inode = namespace::lookup(&self.log, path)?;
        Ok(Attributes::from(&inode))
    }

    /// Names of the entries in the directory at `path`, in slot order
    pub fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let dir = namespace::lookup(&self.log, path)?;
        if !dir.is_dir() {
            return Err(LogFsError::NotADirectory(path.to_string()));
        }

        let mut names = Vec::new();
        for child in record::children(&self.log, &dir)? {
            names.push(self.log.load_inode(child)?.name().to_string());
        }
        Ok(names)
    }

    // =========================================================================
    // Namespace Mutations
    // =========================================================================

    /// Create an empty file or directory at `path`
    pub fn create_entry(&mut self, path: &str, kind: InodeKind) -> Result<InodeId> {
        let (parent_components, name) = path::split_parent(path)?;
        let parent_id = namespace::resolve_components(&self.log, &parent_components, path)?;

        let mut parent = self.log.load_inode(parent_id)?;
        if !parent.is_dir() {
            return Err(LogFsError::NotADirectory(path.to_string()));
        }

        let id = self.log.allocate_id()?;

        if !record::has_room(&self.log, &parent)? {
            return Err(LogFsError::OutOfSpace(format!(
                "parent of {} has no free entry slot",
                path
            )));
        }

        // The child's record, plus the parent's indirect block once its
        // direct slots are used up
        let grows_indirect = parent.indirect.is_none() && parent.direct.iter().all(Option::is_some);
        self.log.ensure_room(0, 1 + u32::from(grows_indirect))?;

        let child = Inode::new(id, kind, name);
        self.log.append_inode(&child)?;

        record::add_child(&mut self.log, &mut parent, id)?;
        parent.touch_modified();
        self.log.append_inode(&parent)?;

        tracing::debug!("Created {:?} {} as {}", kind, path, id);
        Ok(id)
    }

    /// Remove the file or empty directory at `path`
    pub fn remove_entry(&mut self, path: &str) -> Result<()> {
        let (parent_components, _) = path::split_parent(path)?;
        let parent_id = namespace::resolve_components(&self.log, &parent_components, path)?;
        let target = namespace::lookup(&self.log, path)?;

        if target.is_dir() && !record::children(&self.log, &target)?.is_empty() {
            return Err(LogFsError::NotEmpty(path.to_string()));
        }

        let mut parent = self.log.load_inode(parent_id)?;
        if !record::remove_child(&mut self.log, &mut parent, target.id)? {
            return Err(LogFsError::Corrupt(format!(
                "{} is not listed in its parent {}",
                target.id, parent_id
            )));
        }
        parent.touch_modified();
        self.log.append_inode(&parent)?;

        self.log.release_inode(target.id);

        tracing::debug!("Removed {} ({})", path, target.id);
        Ok(())
    }

    /// Rename or move the entry at `from` to `to`.
    ///
    /// An existing entry at `to` is replaced (a directory only when empty).
    pub fn rename_entry(&mut self, from: &str, to: &str) -> Result<()> {
        let from_components = path::components(from)?;
        let (from_parent_components, _) = path::split_parent(from)?;
        let (to_parent_components, new_name) = path::split_parent(to)?;

        if to_parent_components.starts_with(&from_components) {
            return Err(LogFsError::InvalidPath(format!(
                "cannot move {} beneath itself ({})",
                from, to
            )));
        }

        let id = namespace::resolve_components(&self.log, &from_components, from)?;
        let mut inode = self.log.load_inode(id)?;
        let old_parent_id = namespace::resolve_components(&self.log, &from_parent_components, from)?;
        let new_parent_id = namespace::resolve_components(&self.log, &to_parent_components, to)?;

        let mut new_parent = self.log.load_inode(new_parent_id)?;
        if !new_parent.is_dir() {
            return Err(LogFsError::NotADirectory(to.to_string()));
        }

        // Step 1: Validate the entry being replaced, if any
        let replaced = record::find_child(&self.log, &new_parent, new_name)?
            .filter(|existing| existing.id != id);

        let mut released = 0;
        if let Some(existing) = &replaced {
            match (inode.kind, existing.kind) {
                (InodeKind::Directory, InodeKind::File) => {
                    return Err(LogFsError::NotADirectory(to.to_string()));
                }
                (InodeKind::File, InodeKind::Directory) => {
                    return Err(LogFsError::IsADirectory(to.to_string()));
                }
                _ => {}
            }
            if existing.is_dir() && !record::children(&self.log, existing)?.is_empty() {
                return Err(LogFsError::NotEmpty(to.to_string()));
            }
            released = record::footprint(&self.log, existing)?;
        }

        // Step 2: Validate room in the destination directory
        let moving = old_parent_id != new_parent_id;
        if moving && replaced.is_none() && !record::has_room(&self.log, &new_parent)? {
            return Err(LogFsError::OutOfSpace(format!(
                "parent of {} has no free entry slot",
                to
            )));
        }
        self.log.ensure_room(released, u32::from(moving))?;

        // Step 3: Apply
        if let Some(existing) = &replaced {
            record::remove_child(&mut self.log, &mut new_parent, existing.id)?;
        }

        if moving {
            let mut old_parent = self.log.load_inode(old_parent_id)?;
            record::remove_child(&mut self.log, &mut old_parent, id)?;
            old_parent.touch_modified();
            self.log.append_inode(&old_parent)?;

            record::add_child(&mut self.log, &mut new_parent, id)?;
        }

        if moving || replaced.is_some() {
            new_parent.touch_modified();
            self.log.append_inode(&new_parent)?;
        }

        inode.set_name(new_name);
        self.log.append_inode(&inode)?;

        if let Some(existing) = replaced {
            self.log.release_inode(existing.id);
        }

        tracing::debug!("Renamed {} to {} ({})", from, to, id);
        Ok(())
    }

    // =========================================================================
    // File Content
    // =========================================================================

    /// Set the length of the file at `path`, zero-extending or cutting it
    pub fn resize(&mut self, path: &str, new_size: u64) -> Result<()> {
        let inode = self.lookup_file(path)?;
        record::check_file_size(new_size)?;

        let mut content = record::read_content(&self.log, &inode)?;
        content.resize(new_size as usize, 0);
        self.rewrite(inode, &content)
    }

    /// Copy the content of the file at `path` into `buf`, from offset 0
    pub fn read_bytes(&self, path: &str, buf: &mut [u8]) -> Result<usize> {
        self.read_at(path, 0, buf)
    }

    /// Copy content of the file at `path` starting at `offset` into `buf`
    pub fn read_at(&self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let inode = self.lookup_file(path)?;
        if offset >= inode.size {
            return Ok(0);
        }

        let content = record::read_content(&self.log, &inode)?;
        let start = offset as usize;
        let count = buf.len().min(content.len() - start);
        buf[..count].copy_from_slice(&content[start..start + count]);
        Ok(count)
    }

    /// Read the whole content of the file at `path`
    pub fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let inode = self.lookup_file(path)?;
        record::read_content(&self.log, &inode)
    }

    /// Replace the content of the file at `path` with `data`
    pub fn write_bytes(&mut self, path: &str, data: &[u8]) -> Result<usize> {
        let inode = self.lookup_file(path)?;
        record::check_file_size(data.len() as u64)?;

        self.rewrite(inode, data)?;
        Ok(data.len())
    }

    /// Overwrite `data` into the file at `path` at `offset`, growing the file
    /// (zero-filled) when the write ends past its current length
    pub fn write_at(&mut self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        let inode = self.lookup_file(path)?;
        let end = offset.checked_add(data.len() as u64).ok_or_else(|| {
            LogFsError::OutOfSpace(format!(
                "write of {} bytes at offset {} overflows",
                data.len(),
                offset
            ))
        })?;
        record::check_file_size(end)?;

        let mut content = record::read_content(&self.log, &inode)?;
        if (content.len() as u64) < end {
            content.resize(end as usize, 0);
        }
        content[offset as usize..end as usize].copy_from_slice(data);

        self.rewrite(inode, &content)?;
        Ok(data.len())
    }

    /// Stamp the modification time with now and the access time with
    /// `accessed` (or now)
    pub fn update_times(&mut self, path: &str, accessed: Option<i64>) -> Result<()> {
        let mut inode = namespace::lookup(&self.log, path)?;
        inode.touch_modified();
        inode.accessed = accessed.unwrap_or(inode.modified);
        self.log.append_inode(&inode)?;
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Position, counters and live usage of the log
    pub fn stats(&self) -> Result<LogStats> {
        self.log.stats()
    }

    /// Check the on-log structures for broken invariants
    pub fn verify(&self) -> Result<VerifyReport> {
        verify::verify(&self.log)
    }

    /// Persist the current segment and flush the backing medium
    pub fn sync(&mut self) -> Result<()> {
        self.log.sync()
    }

    /// Close the engine, persisting the current segment
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn lookup_file(&self, path: &str) -> Result<Inode> {
        let inode = namespace::lookup(&self.log, path)?;
        if inode.is_dir() {
            return Err(LogFsError::IsADirectory(path.to_string()));
        }
        Ok(inode)
    }

    /// Append `content` as the new content of `inode`, then the inode itself
    fn rewrite(&mut self, mut inode: Inode, content: &[u8]) -> Result<()> {
        let released = record::footprint(&self.log, &inode)?;
        let claimed = 1 + record::content_footprint(content.len() as u64);
        self.log.ensure_room(released, claimed)?;

        record::write_content(&mut self.log, &mut inode, content)?;
        inode.touch_modified();
        self.log.append_inode(&inode)?;

        tracing::debug!(
            "Wrote {} bytes to {} ({} blocks)",
            content.len(),
            inode.id,
            record::blocks_for_len(content.len() as u64)
        );
        Ok(())
    }
}
