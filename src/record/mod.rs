//! Record Module
//!
//! The persisted record types and how inode content maps onto blocks.
//!
//! ## Responsibilities
//! - Inode records (the only metadata record type)
//! - Indirect blocks (one level, no double indirection)
//! - File content layout: direct slots first, then the indirect block
//! - Directory layout: the same slots hold child inode ids
//!
//! ## Inode Slots
//! ```text
//! ┌───────────┬──────┬──────┬───────┬──────────────┬──────────┐
//! │ id / kind │ name │ size │ times │ direct[0..8] │ indirect ├──► [slot; 32]
//! └───────────┴──────┴──────┴───────┴──────────────┴──────────┘
//!   file:      slot = data block address
//!   directory: slot = child inode id
//! ```

mod content;
mod directory;
mod inode;

pub use content::{blocks_for_len, check_file_size, content_footprint, read_content, write_content};
pub use directory::{add_child, children, find_child, has_room, remove_child};
pub use inode::{truncate_name, unix_now, IndirectBlock, Inode, InodeKind};

use crate::disk::BlockAddress;
use crate::error::Result;
use crate::log::Log;

/// All pointer slots of `inode`, direct first, then the indirect block's
pub(crate) fn slots(log: &Log, inode: &Inode) -> Result<Vec<Option<u32>>> {
    let mut slots = inode.direct.to_vec();
    if let Some(addr) = inode.indirect {
        slots.extend_from_slice(&log.read_indirect(addr)?.slots);
    }
    Ok(slots)
}

/// Blocks a live inode occupies: its record, data blocks and indirect block
pub fn footprint(log: &Log, inode: &Inode) -> Result<u32> {
    let mut blocks = 1;
    if inode.kind == InodeKind::File {
        blocks += inode.direct.iter().flatten().count() as u32;
    }
    if let Some(addr) = inode.indirect {
        blocks += 1;
        if inode.kind == InodeKind::File {
            blocks += log.read_indirect(addr)?.occupied() as u32;
        }
    }
    Ok(blocks)
}

/// Data block addresses of a file, in content order
pub fn data_addresses(log: &Log, inode: &Inode) -> Result<Vec<BlockAddress>> {
    slots(log, inode)?
        .into_iter()
        .flatten()
        .map(BlockAddress::try_from)
        .collect()
}
