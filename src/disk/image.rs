//! Disk Image
//!
//! Typed block store over the in-memory image.

use super::{BlockAddress, BLOCK_SIZE, CHECKPOINT_BLOCKS, IMAGE_SIZE, SEGMENT_COUNT, SEGMENT_SIZE};
use crate::error::{LogFsError, Result};

/// The whole disk, held in memory
pub struct DiskImage {
    bytes: Vec<u8>,
}

impl DiskImage {
    /// Create a zero-filled image
    pub fn new() -> Self {
        Self {
            bytes: vec![0u8; IMAGE_SIZE],
        }
    }

    /// Borrow the contents of one block
    pub fn read_block(&self, addr: BlockAddress) -> &[u8] {
        let start = addr.byte_offset();
        &self.bytes[start..start + BLOCK_SIZE]
    }

    /// Overwrite one block, zero-padding `payload` to the block size
    pub fn write_block(&mut self, addr: BlockAddress, payload: &[u8]) -> Result<()> {
        if payload.len() > BLOCK_SIZE {
            return Err(LogFsError::OutOfSpace(format!(
                "record of {} bytes exceeds block size {}",
                payload.len(),
                BLOCK_SIZE
            )));
        }

        let start = addr.byte_offset();
        let block = &mut self.bytes[start..start + BLOCK_SIZE];
        block[..payload.len()].copy_from_slice(payload);
        block[payload.len()..].fill(0);
        Ok(())
    }

    /// Write a checkpoint image into the header of `segment`
    pub fn write_checkpoint(&mut self, segment: u32, checkpoint: &[u8]) -> Result<()> {
        let header_len = CHECKPOINT_BLOCKS as usize * BLOCK_SIZE;
        if checkpoint.len() > header_len {
            return Err(LogFsError::OutOfSpace(format!(
                "checkpoint of {} bytes exceeds header of {} bytes",
                checkpoint.len(),
                header_len
            )));
        }

        let start = Self::segment_offset(segment)?;
        let header = &mut self.bytes[start..start + header_len];
        header[..checkpoint.len()].copy_from_slice(checkpoint);
        header[checkpoint.len()..].fill(0);
        Ok(())
    }

    /// Borrow the checkpoint header of `segment`
    pub fn checkpoint(&self, segment: u32) -> Result<&[u8]> {
        let start = Self::segment_offset(segment)?;
        Ok(&self.bytes[start..start + CHECKPOINT_BLOCKS as usize * BLOCK_SIZE])
    }

    /// Borrow a whole segment
    pub fn segment(&self, segment: u32) -> Result<&[u8]> {
        let start = Self::segment_offset(segment)?;
        Ok(&self.bytes[start..start + SEGMENT_SIZE])
    }

    fn segment_offset(segment: u32) -> Result<usize> {
        if segment >= SEGMENT_COUNT {
            return Err(LogFsError::Corrupt(format!(
                "segment {} outside image of {} segments",
                segment, SEGMENT_COUNT
            )));
        }
        Ok(segment as usize * SEGMENT_SIZE)
    }
}

impl Default for DiskImage {
    fn default() -> Self {
        Self::new()
    }
}
