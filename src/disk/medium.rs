//! Backing Medium
//!
//! Where filled segments are mirrored. The engine only ever writes whole
//! fixed-size regions at fixed offsets.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Destination for persisted image regions
pub trait BackingStore: Send {
    /// Write `bytes` at byte `offset` of the medium
    fn write_region(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;

    /// Flush pending writes to stable storage
    fn sync(&mut self) -> Result<()>;
}

/// Image mirrored to a flat file
pub struct FileStore {
    /// Path of the image file (for logging)
    path: PathBuf,
    /// Open handle, sized to the full image
    file: File,
    /// fsync after every region write
    sync_writes: bool,
}

impl FileStore {
    /// Create (or truncate) the image file and zero-fill it to `len` bytes
    pub fn create(path: &Path, len: u64, sync_writes: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        file.set_len(len)?;

        tracing::debug!("Created image file {} ({} bytes)", path.display(), len);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_writes,
        })
    }

    /// Path of the image file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackingStore for FileStore {
    fn write_region(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;

        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Medium that keeps nothing; the in-memory image is the only copy
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Number of region writes received (for testing)
    regions_written: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of region writes received
    pub fn regions_written(&self) -> u64 {
        self.regions_written
    }
}

impl BackingStore for MemoryStore {
    fn write_region(&mut self, _offset: u64, _bytes: &[u8]) -> Result<()> {
        self.regions_written += 1;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}
