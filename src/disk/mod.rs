//! Disk Module
//!
//! The fixed-size disk image, its geometry, and the backing medium it is
//! mirrored to.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────── image (SEGMENT_COUNT segments) ───────────────────┐
//! │ Segment 0                   │ Segment 1                   │ ...           │
//! │ ┌────────────┬────────────┐ │ ┌────────────┬────────────┐ │               │
//! │ │ Checkpoint │  Records   │ │ │ Checkpoint │  Records   │ │               │
//! │ │ (K blocks) │ (appended) │ │ │ (K blocks) │ (appended) │ │               │
//! │ └────────────┴────────────┘ │ └────────────┴────────────┘ │               │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are inodes, data blocks, and indirect blocks, one per block. There
//! is no magic number, version field, or checksum.

mod image;
mod medium;

use serde::{Deserialize, Serialize};

use crate::error::LogFsError;

pub use image::DiskImage;
pub use medium::{BackingStore, FileStore, MemoryStore};

// =============================================================================
// Geometry
// =============================================================================

/// Size of one block in bytes
pub const BLOCK_SIZE: usize = 1024;

/// Blocks in one segment, checkpoint header included
pub const BLOCKS_PER_SEGMENT: u32 = 512;

/// Size of one segment in bytes
pub const SEGMENT_SIZE: usize = BLOCK_SIZE * BLOCKS_PER_SEGMENT as usize;

/// Number of segments in the image
pub const SEGMENT_COUNT: u32 = 4;

/// Total number of blocks in the image
pub const TOTAL_BLOCKS: u32 = BLOCKS_PER_SEGMENT * SEGMENT_COUNT;

/// Total image size in bytes
pub const IMAGE_SIZE: usize = SEGMENT_SIZE * SEGMENT_COUNT as usize;

/// Number of inode identifiers, root included
pub const MAX_INODES: usize = 256;

/// Longest stored entry name, in bytes
pub const MAX_NAME_LEN: usize = 56;

/// Direct pointer slots per inode
pub const DIRECT_POINTERS: usize = 8;

/// Pointer slots in an indirect block
pub const INDIRECT_POINTERS: usize = 32;

/// Bytes per checkpoint entry: u32 LE, `u32::MAX` meaning unused
pub const CHECKPOINT_ENTRY_SIZE: usize = 4;

/// Encoded size of the inode table checkpoint
pub const CHECKPOINT_BYTES: usize = MAX_INODES * CHECKPOINT_ENTRY_SIZE;

/// Blocks reserved at the start of every segment for the checkpoint
pub const CHECKPOINT_BLOCKS: u32 = ((CHECKPOINT_BYTES + BLOCK_SIZE - 1) / BLOCK_SIZE) as u32;

/// Record blocks available in one segment
pub const DATA_BLOCKS_PER_SEGMENT: u32 = BLOCKS_PER_SEGMENT - CHECKPOINT_BLOCKS;

/// Content blocks one inode can address
pub const MAX_CONTENT_BLOCKS: usize = DIRECT_POINTERS + INDIRECT_POINTERS;

/// Largest file, in bytes
pub const MAX_FILE_SIZE: u64 = (MAX_CONTENT_BLOCKS * BLOCK_SIZE) as u64;

/// Most children one directory can hold
pub const MAX_CHILDREN: usize = MAX_CONTENT_BLOCKS;

// A record relocated during cleaning must never land in a segment that still
// holds referenced blocks: live data spans at most two segments.
const _: () = assert!(SEGMENT_COUNT >= 3);
const _: () = assert!(CHECKPOINT_BLOCKS < BLOCKS_PER_SEGMENT);
const _: () = assert!(MAX_INODES <= u32::MAX as usize);

// =============================================================================
// Block Address
// =============================================================================

/// Physical address of one block in the image.
///
/// Only constructible for in-range values, so reads and writes through
/// [`DiskImage`] cannot go out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BlockAddress(u32);

impl BlockAddress {
    /// Address of `block` within `segment`
    pub fn from_parts(segment: u32, block: u32) -> Option<Self> {
        if segment < SEGMENT_COUNT && block < BLOCKS_PER_SEGMENT {
            Some(Self(segment * BLOCKS_PER_SEGMENT + block))
        } else {
            None
        }
    }

    /// Address of a position the caller already keeps inside the image
    pub(crate) fn at(segment: u32, block: u32) -> Self {
        debug_assert!(segment < SEGMENT_COUNT && block < BLOCKS_PER_SEGMENT);
        Self(segment * BLOCKS_PER_SEGMENT + block)
    }

    /// Raw block number
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Segment this block belongs to
    pub fn segment(self) -> u32 {
        self.0 / BLOCKS_PER_SEGMENT
    }

    /// Position of this block inside its segment
    pub fn block_in_segment(self) -> u32 {
        self.0 % BLOCKS_PER_SEGMENT
    }

    /// Whether this block sits in a segment's checkpoint header
    pub fn is_header(self) -> bool {
        self.block_in_segment() < CHECKPOINT_BLOCKS
    }

    /// Byte offset of this block in the image
    pub fn byte_offset(self) -> usize {
        self.0 as usize * BLOCK_SIZE
    }
}

impl TryFrom<u32> for BlockAddress {
    type Error = LogFsError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        if raw < TOTAL_BLOCKS {
            Ok(Self(raw))
        } else {
            Err(LogFsError::Corrupt(format!(
                "block address {} outside image of {} blocks",
                raw, TOTAL_BLOCKS
            )))
        }
    }
}

impl From<BlockAddress> for u32 {
    fn from(addr: BlockAddress) -> Self {
        addr.0
    }
}

impl std::fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.segment(), self.block_in_segment())
    }
}
