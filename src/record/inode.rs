//! Inode and indirect block records

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::disk::{BlockAddress, BLOCK_SIZE, DIRECT_POINTERS, INDIRECT_POINTERS, MAX_NAME_LEN};
use crate::error::{LogFsError, Result};
use crate::table::InodeId;

/// Kind of namespace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InodeKind {
    Directory,
    File,
}

/// Metadata record for one namespace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    /// Logical id, equal to this inode's table index
    pub id: InodeId,

    pub kind: InodeKind,

    /// Entry name as known by the parent; never longer than MAX_NAME_LEN
    name: String,

    /// Content length in bytes, 0 for directories
    pub size: u64,

    /// Modification time (unix seconds)
    pub modified: i64,

    /// Access time (unix seconds)
    pub accessed: i64,

    /// Data block addresses (file) or child ids (directory)
    pub direct: [Option<u32>; DIRECT_POINTERS],

    /// Indirect block extending `direct`
    pub indirect: Option<BlockAddress>,
}

impl Inode {
    /// Create an empty inode stamped with the current time
    pub fn new(id: InodeId, kind: InodeKind, name: &str) -> Self {
        let now = unix_now();
        Self {
            id,
            kind,
            name: truncate_name(name).to_string(),
            size: 0,
            modified: now,
            accessed: now,
            direct: [None; DIRECT_POINTERS],
            indirect: None,
        }
    }

    /// The root directory record
    pub fn root() -> Self {
        Self::new(InodeId::ROOT, InodeKind::Directory, "/")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename, truncating to MAX_NAME_LEN
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_name(name).to_string();
    }

    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    /// Stamp the modification time
    pub fn touch_modified(&mut self) {
        self.modified = unix_now();
    }

    /// Serialize into a record that fits one block
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert!(bytes.len() <= BLOCK_SIZE);
        Ok(bytes)
    }

    /// Deserialize from a (zero-padded) block
    pub fn decode(block: &[u8]) -> Result<Self> {
        bincode::deserialize(block)
            .map_err(|e| LogFsError::Corrupt(format!("undecodable inode record: {}", e)))
    }
}

/// Block of additional pointer slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectBlock {
    pub slots: [Option<u32>; INDIRECT_POINTERS],
}

impl IndirectBlock {
    /// A block with every slot empty
    pub fn empty() -> Self {
        Self {
            slots: [None; INDIRECT_POINTERS],
        }
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(block: &[u8]) -> Result<Self> {
        bincode::deserialize(block)
            .map_err(|e| LogFsError::Corrupt(format!("undecodable indirect block: {}", e)))
    }
}

impl Default for IndirectBlock {
    fn default() -> Self {
        Self::empty()
    }
}

/// Cut `name` to at most MAX_NAME_LEN bytes on a char boundary
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }

    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    tracing::debug!("Name {:?} truncated to {} bytes", name, end);
    &name[..end]
}

/// Current time in unix seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
