//! File content mapping
//!
//! Write path chunks content into blocks (direct slots first, then a fresh
//! indirect block); read path concatenates them back up to `size` bytes.

use crate::disk::{BlockAddress, BLOCK_SIZE, DIRECT_POINTERS, MAX_FILE_SIZE};
use crate::error::{LogFsError, Result};
use crate::log::Log;

use super::{slots, IndirectBlock, Inode};

/// Number of data blocks needed for `len` bytes
pub fn blocks_for_len(len: u64) -> usize {
    len.div_ceil(BLOCK_SIZE as u64) as usize
}

/// Blocks a file of `len` bytes occupies, excluding its inode record
pub fn content_footprint(len: u64) -> u32 {
    let blocks = blocks_for_len(len);
    (blocks + usize::from(blocks > DIRECT_POINTERS)) as u32
}

/// Reject content one inode cannot address
pub fn check_file_size(len: u64) -> Result<()> {
    if len > MAX_FILE_SIZE {
        return Err(LogFsError::OutOfSpace(format!(
            "file of {} bytes exceeds maximum of {} bytes",
            len, MAX_FILE_SIZE
        )));
    }
    Ok(())
}

/// Append `data` as the new content of `inode`.
///
/// Updates the inode's slots and size in memory; the caller appends the
/// inode record itself.
pub fn write_content(log: &mut Log, inode: &mut Inode, data: &[u8]) -> Result<()> {
    check_file_size(data.len() as u64)?;

    let mut chunks = data.chunks(BLOCK_SIZE).peekable();

    let mut direct = [None; DIRECT_POINTERS];
    for slot in direct.iter_mut() {
        match chunks.next() {
            Some(chunk) => *slot = Some(log.allocate_block(chunk)?.raw()),
            None => break,
        }
    }

    let mut indirect = None;
    if chunks.peek().is_some() {
        let mut block = IndirectBlock::empty();
        for (slot, chunk) in block.slots.iter_mut().zip(chunks) {
            *slot = Some(log.allocate_block(chunk)?.raw());
        }
        indirect = Some(log.allocate_block(&block.encode()?)?);
    }

    inode.direct = direct;
    inode.indirect = indirect;
    inode.size = data.len() as u64;
    Ok(())
}

/// Reassemble the content of `inode`
pub fn read_content(log: &Log, inode: &Inode) -> Result<Vec<u8>> {
    let size = inode.size as usize;
    let mut content = Vec::with_capacity(size);

    for slot in slots(log, inode)? {
        let remaining = size - content.len();
        if remaining == 0 {
            break;
        }

        let raw = slot.ok_or_else(|| {
            LogFsError::Corrupt(format!(
                "inode {} has a missing block at offset {}",
                inode.id,
                content.len()
            ))
        })?;
        let block = log.read_block(BlockAddress::try_from(raw)?);
        content.extend_from_slice(&block[..remaining.min(BLOCK_SIZE)]);
    }

    if content.len() < size {
        return Err(LogFsError::Corrupt(format!(
            "inode {} addresses {} of {} bytes",
            inode.id,
            content.len(),
            size
        )));
    }

    Ok(content)
}
