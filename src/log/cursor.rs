//! Allocation cursor
//!
//! The next-write position. It advances one block at a time, skips the
//! checkpoint header of every segment it enters, and wraps from the last
//! segment back to segment 0.

use crate::disk::{BlockAddress, BLOCKS_PER_SEGMENT, CHECKPOINT_BLOCKS, SEGMENT_COUNT};

/// Next-write position in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    segment: u32,
    block: u32,
}

/// Outcome of advancing the cursor by one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Still inside the same segment
    Within,

    /// The segment filled up and the cursor moved into `opened`
    SegmentFull {
        filled: u32,
        opened: u32,
        wrapped: bool,
    },
}

impl Cursor {
    /// First record block of segment 0
    pub fn start() -> Self {
        Self {
            segment: 0,
            block: CHECKPOINT_BLOCKS,
        }
    }

    /// Block the next append lands on
    pub fn address(&self) -> BlockAddress {
        BlockAddress::at(self.segment, self.block)
    }

    pub fn segment(&self) -> u32 {
        self.segment
    }

    /// Position inside the current segment
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Move past the block just written
    pub fn advance(&mut self) -> Step {
        self.block += 1;
        if self.block < BLOCKS_PER_SEGMENT {
            return Step::Within;
        }

        let filled = self.segment;
        let opened = (filled + 1) % SEGMENT_COUNT;
        self.segment = opened;
        self.block = CHECKPOINT_BLOCKS;

        Step::SegmentFull {
            filled,
            opened,
            wrapped: opened == 0,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}
