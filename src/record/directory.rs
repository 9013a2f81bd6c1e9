//! Directory content
//!
//! A directory's slots hold child inode ids. Names are stored once, in the
//! child's own record.

use crate::disk::MAX_CHILDREN;
use crate::error::{LogFsError, Result};
use crate::log::Log;
use crate::table::InodeId;

use super::{slots, truncate_name, IndirectBlock, Inode};

/// Child ids of `dir` in slot order (direct, then indirect)
pub fn children(log: &Log, dir: &Inode) -> Result<Vec<InodeId>> {
    slots(log, dir)?
        .into_iter()
        .flatten()
        .map(InodeId::try_from)
        .collect()
}

/// First child of `dir` whose stored name equals `name`
pub fn find_child(log: &Log, dir: &Inode, name: &str) -> Result<Option<Inode>> {
    let name = truncate_name(name);
    for child in children(log, dir)? {
        let inode = log.load_inode(child)?;
        if inode.name() == name {
            return Ok(Some(inode));
        }
    }
    Ok(None)
}

/// Whether `dir` has a free slot for another child
pub fn has_room(log: &Log, dir: &Inode) -> Result<bool> {
    Ok(children(log, dir)?.len() < MAX_CHILDREN)
}

/// Record `child` in the first free slot of `dir`.
///
/// A changed indirect block is appended as a new copy; the caller appends
/// the directory inode.
pub fn add_child(log: &mut Log, dir: &mut Inode, child: InodeId) -> Result<()> {
    if let Some(slot) = dir.direct.iter_mut().find(|slot| slot.is_none()) {
        *slot = Some(child.raw());
        return Ok(());
    }

    let mut block = match dir.indirect {
        Some(addr) => log.read_indirect(addr)?,
        None => IndirectBlock::empty(),
    };

    let slot = block
        .slots
        .iter_mut()
        .find(|slot| slot.is_none())
        .ok_or_else(|| {
            LogFsError::OutOfSpace(format!(
                "directory {} already holds {} entries",
                dir.name(),
                MAX_CHILDREN
            ))
        })?;
    *slot = Some(child.raw());

    dir.indirect = Some(log.allocate_block(&block.encode()?)?);
    Ok(())
}

/// Clear the slot of `dir` holding `child`; returns whether one was found.
///
/// An indirect block left empty is dropped from the directory.
pub fn remove_child(log: &mut Log, dir: &mut Inode, child: InodeId) -> Result<bool> {
    if let Some(slot) = dir.direct.iter_mut().find(|slot| **slot == Some(child.raw())) {
        *slot = None;
        return Ok(true);
    }

    let Some(addr) = dir.indirect else {
        return Ok(false);
    };

    let mut block = log.read_indirect(addr)?;
    let Some(slot) = block.slots.iter_mut().find(|slot| **slot == Some(child.raw())) else {
        return Ok(false);
    };
    *slot = None;

    dir.indirect = if block.is_empty() {
        None
    } else {
        Some(log.allocate_block(&block.encode()?)?)
    };
    Ok(true)
}
