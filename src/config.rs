//! Configuration for logfs
//!
//! Centralized runtime configuration with sensible defaults. The on-disk
//! geometry (block size, segment count, inode count, ...) is fixed at compile
//! time and lives in [`crate::disk`].

use std::path::PathBuf;

/// Main configuration for a logfs engine instance
#[derive(Debug, Clone, Default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backing Medium Configuration
    // -------------------------------------------------------------------------
    /// Image file mirroring the in-memory disk.
    ///
    /// `None` keeps the image in memory only. When set, the file is
    /// recreated (zero-filled) every time the engine is opened.
    pub image_path: Option<PathBuf>,

    /// fsync the image file after each persisted segment
    pub sync_on_rollover: bool,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Mirror the disk image to a file at `path`
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.image_path = Some(path.into());
        self
    }

    /// Keep the disk image in memory only
    pub fn in_memory(mut self) -> Self {
        self.config.image_path = None;
        self
    }

    /// Set whether each persisted segment is followed by an fsync
    pub fn sync_on_rollover(mut self, enabled: bool) -> Self {
        self.config.sync_on_rollover = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
