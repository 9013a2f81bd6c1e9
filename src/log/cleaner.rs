//! Segment Cleaner
//!
//! Re-appends every live record into the segment just opened, so segments
//! the cursor will wrap onto hold nothing still referenced.

use crate::disk::BlockAddress;
use crate::error::{LogFsError, Result};
use crate::record::InodeKind;

use super::Log;

/// What one cleaner run moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Inode records re-appended
    pub inodes_moved: usize,
    /// Blocks re-appended, inode records included
    pub blocks_moved: usize,
}

impl Log {
    /// Relocate the live set as it stands right now
    pub(crate) fn clean(&mut self) -> Result<CleanReport> {
        self.cleaning = true;
        let result = self.relocate_live();
        self.cleaning = false;

        let report = result?;
        self.counters.cleanings += 1;

        tracing::info!(
            "Cleaner moved {} inodes ({} blocks) into segment {}",
            report.inodes_moved,
            report.blocks_moved,
            self.cursor.segment()
        );
        Ok(report)
    }

    fn relocate_live(&mut self) -> Result<CleanReport> {
        let live: Vec<_> = self.table.live().collect();
        let mut report = CleanReport::default();

        for (id, addr) in live {
            let mut inode = self.read_inode_at(addr)?;
            if inode.id != id {
                return Err(LogFsError::Corrupt(format!(
                    "table entry {} points at record of inode {} ({})",
                    id, inode.id, addr
                )));
            }

            match inode.kind {
                // Child slots are ids; only the indirect block itself moves
                InodeKind::Directory => {
                    if let Some(indirect) = inode.indirect {
                        inode.indirect = Some(self.relocate_block(indirect)?);
                        report.blocks_moved += 1;
                    }
                }
                InodeKind::File => {
                    for slot in inode.direct.iter_mut().flatten() {
                        *slot = self.relocate_block(BlockAddress::try_from(*slot)?)?.raw();
                        report.blocks_moved += 1;
                    }

                    if let Some(indirect) = inode.indirect {
                        let mut block = self.read_indirect(indirect)?;
                        for slot in block.slots.iter_mut().flatten() {
                            *slot = self.relocate_block(BlockAddress::try_from(*slot)?)?.raw();
                            report.blocks_moved += 1;
                        }
                        inode.indirect = Some(self.allocate_block(&block.encode()?)?);
                        report.blocks_moved += 1;
                    }
                }
            }

            self.append_inode(&inode)?;
            report.inodes_moved += 1;
            report.blocks_moved += 1;
        }

        Ok(report)
    }

    fn relocate_block(&mut self, addr: BlockAddress) -> Result<BlockAddress> {
        let payload = self.image.read_block(addr).to_vec();
        self.allocate_block(&payload)
    }
}
