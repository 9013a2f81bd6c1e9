//! Log Module
//!
//! The append-only log: disk image, allocation cursor, inode table, and the
//! segment cleaner that runs on every rollover.
//!
//! ## Responsibilities
//! - Hand out blocks in strictly increasing order within a segment
//! - Checkpoint the inode table into each segment as it is opened
//! - Persist every filled segment to the backing medium
//! - Relocate all live records into the freshly opened segment
//! - Keep the live set small enough for one segment to hold it
//!
//! ## Rollover
//! ```text
//!   segment n full
//!        │
//!        ▼
//!   open n+1 (mod SEGMENT_COUNT) ── write table checkpoint into its header
//!        │
//!        ▼
//!   persist segment n ── cursor → first record block of n+1
//!        │
//!        ▼
//!   cleaner: re-append every live record into n+1
//! ```

mod allocator;
mod cleaner;
mod cursor;

pub use cleaner::CleanReport;
pub use cursor::{Cursor, Step};

use crate::disk::{
    BackingStore, BlockAddress, DiskImage, DATA_BLOCKS_PER_SEGMENT, MAX_CONTENT_BLOCKS, SEGMENT_SIZE,
};
use crate::error::{LogFsError, Result};
use crate::record::{footprint, IndirectBlock, Inode};
use crate::table::{InodeId, InodeTable};

/// Blocks held back for the largest single operation.
///
/// A full file rewrite: every content block, the indirect block, and the
/// inode record (plus one for a parent indirect block).
pub const OP_RESERVE_BLOCKS: u32 = MAX_CONTENT_BLOCKS as u32 + 2;

/// Running counters kept by the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    blocks_written: u64,
    blocks_relocated: u64,
    rollovers: u64,
    wraps: u64,
    cleanings: u64,
}

/// Snapshot of the log's position and usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStats {
    /// Segment the cursor is in
    pub segment: u32,
    /// Cursor position inside that segment
    pub block: u32,
    /// Blocks appended since format, relocations included
    pub blocks_written: u64,
    /// Blocks appended by the cleaner
    pub blocks_relocated: u64,
    /// Segment boundaries crossed
    pub rollovers: u64,
    /// Times the cursor wrapped back to segment 0
    pub wraps: u64,
    /// Cleaner runs
    pub cleanings: u64,
    /// Live inode identifiers
    pub live_inodes: usize,
    /// Blocks referenced by live inodes
    pub live_blocks: u32,
}

/// The append-only log and its indirection table
pub struct Log {
    /// In-memory disk
    image: DiskImage,

    /// Where filled segments are mirrored
    medium: Box<dyn BackingStore>,

    /// Next-write position
    cursor: Cursor,

    /// Logical id → latest record address
    table: InodeTable,

    /// Set while the cleaner is relocating records
    cleaning: bool,

    counters: Counters,
}

impl Log {
    /// Start an empty log over a zeroed image.
    ///
    /// Segment 0 is opened immediately: its header receives the (empty)
    /// table checkpoint.
    pub fn new(medium: Box<dyn BackingStore>) -> Result<Self> {
        let mut image = DiskImage::new();
        let table = InodeTable::new();
        let cursor = Cursor::start();
        image.write_checkpoint(cursor.segment(), &table.encode())?;

        Ok(Self {
            image,
            medium,
            cursor,
            table,
            cleaning: false,
            counters: Counters::default(),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Borrow one block of the image
    pub fn read_block(&self, addr: BlockAddress) -> &[u8] {
        self.image.read_block(addr)
    }

    /// Decode the inode record stored at `addr`
    pub fn read_inode_at(&self, addr: BlockAddress) -> Result<Inode> {
        Inode::decode(self.image.read_block(addr))
    }

    /// Decode the indirect block stored at `addr`
    pub fn read_indirect(&self, addr: BlockAddress) -> Result<IndirectBlock> {
        IndirectBlock::decode(self.image.read_block(addr))
    }

    /// Latest record of a live inode
    pub fn load_inode(&self, id: InodeId) -> Result<Inode> {
        let addr = self
            .table
            .lookup(id)
            .ok_or_else(|| LogFsError::NotFound(format!("inode {}", id)))?;

        let inode = self.read_inode_at(addr)?;
        if inode.id != id {
            return Err(LogFsError::Corrupt(format!(
                "table entry {} points at record of inode {} ({})",
                id, inode.id, addr
            )));
        }
        Ok(inode)
    }

    // =========================================================================
    // Table
    // =========================================================================

    pub fn table(&self) -> &InodeTable {
        &self.table
    }

    /// Lowest unused inode id
    pub fn allocate_id(&self) -> Result<InodeId> {
        self.table.allocate_id()
    }

    /// Drop `id` from the table; its records become garbage
    pub fn release_inode(&mut self, id: InodeId) {
        self.table.clear(id);
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Blocks referenced by all live inodes
    pub fn live_blocks(&self) -> Result<u32> {
        let mut total = 0;
        for (_, addr) in self.table.live() {
            total += footprint(self, &self.read_inode_at(addr)?)?;
        }
        Ok(total)
    }

    /// Fail with `OutOfSpace` unless an operation that frees `released`
    /// blocks and adds `claimed` blocks leaves room for the cleaner.
    pub fn ensure_room(&self, released: u32, claimed: u32) -> Result<()> {
        let live = self.live_blocks()?;
        let after = live.saturating_sub(released) + claimed;
        let limit = DATA_BLOCKS_PER_SEGMENT - OP_RESERVE_BLOCKS;

        if after > limit {
            return Err(LogFsError::OutOfSpace(format!(
                "log would hold {} live blocks, limit is {}",
                after, limit
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist the current (partial) segment and flush the medium
    pub fn sync(&mut self) -> Result<()> {
        self.persist_segment(self.cursor.segment())?;
        self.medium.sync()
    }

    fn persist_segment(&mut self, segment: u32) -> Result<()> {
        let offset = segment as u64 * SEGMENT_SIZE as u64;
        self.medium.write_region(offset, self.image.segment(segment)?)?;
        tracing::debug!("Persisted segment {} at offset {}", segment, offset);
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn image(&self) -> &DiskImage {
        &self.image
    }

    /// Position, counters and live usage
    pub fn stats(&self) -> Result<LogStats> {
        Ok(LogStats {
            segment: self.cursor.segment(),
            block: self.cursor.block(),
            blocks_written: self.counters.blocks_written,
            blocks_relocated: self.counters.blocks_relocated,
            rollovers: self.counters.rollovers,
            wraps: self.counters.wraps,
            cleanings: self.counters.cleanings,
            live_inodes: self.table.live_count(),
            live_blocks: self.live_blocks()?,
        })
    }
}
