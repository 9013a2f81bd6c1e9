//! Log Writer
//!
//! Appends records at the cursor and handles segment rollover.

use crate::disk::BlockAddress;
use crate::error::Result;
use crate::record::Inode;

use super::{Log, Step};

impl Log {
    /// Append one block of data (or an indirect block) and return its address.
    ///
    /// `payload` is zero-padded to the block size; a longer payload is
    /// rejected before anything is written.
    pub fn allocate_block(&mut self, payload: &[u8]) -> Result<BlockAddress> {
        let addr = self.place(payload)?;
        self.advance()?;
        Ok(addr)
    }

    /// Append an inode record and point its table entry at it.
    ///
    /// The entry is updated before the cursor advances, so a rollover
    /// triggered by this append cleans the new record, not the stale one.
    pub fn append_inode(&mut self, inode: &Inode) -> Result<BlockAddress> {
        let record = inode.encode()?;
        let addr = self.place(&record)?;
        self.table.set(inode.id, addr);
        self.advance()?;
        Ok(addr)
    }

    /// Write `payload` at the cursor without moving it
    fn place(&mut self, payload: &[u8]) -> Result<BlockAddress> {
        let addr = self.cursor.address();
        self.image.write_block(addr, payload)?;
        self.counters.blocks_written += 1;
        if self.cleaning {
            self.counters.blocks_relocated += 1;
        }
        Ok(addr)
    }

    fn advance(&mut self) -> Result<()> {
        match self.cursor.advance() {
            Step::Within => Ok(()),
            Step::SegmentFull {
                filled,
                opened,
                wrapped,
            } => self.rollover(filled, opened, wrapped),
        }
    }

    /// Open `opened` after `filled` ran out of blocks
    fn rollover(&mut self, filled: u32, opened: u32, wrapped: bool) -> Result<()> {
        // Step 1: Checkpoint the table into the new segment's header
        self.image.write_checkpoint(opened, &self.table.encode())?;

        // Step 2: Persist the segment that just filled
        self.persist_segment(filled)?;

        self.counters.rollovers += 1;
        if wrapped {
            self.counters.wraps += 1;
        }

        tracing::info!(
            "Segment {} full, opened segment {}{}",
            filled,
            opened,
            if wrapped { " (wrapped)" } else { "" }
        );

        // Step 3: Relocate live records; the cleaner's own rollovers stop here
        if self.cleaning {
            tracing::debug!("Rollover into segment {} while cleaning", opened);
            return Ok(());
        }

        self.clean()?;
        Ok(())
    }
}
