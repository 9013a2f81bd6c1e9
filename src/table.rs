//! Inode Table
//!
//! The indirection layer from logical inode id to the physical address of the
//! inode's latest record. Its fixed-width encoding is the checkpoint stored in
//! every segment header.
//!
//! ## Checkpoint Format
//! ```text
//! ┌──────────────┬──────────────┬─────┬────────────────────────┐
//! │ id 0 (u32 LE)│ id 1 (u32 LE)│ ... │ id MAX_INODES-1        │
//! └──────────────┴──────────────┴─────┴────────────────────────┘
//!   u32::MAX = unused identifier
//! ```

use serde::{Deserialize, Serialize};

use crate::disk::{BlockAddress, CHECKPOINT_BYTES, CHECKPOINT_ENTRY_SIZE, MAX_INODES};
use crate::error::{LogFsError, Result};

/// Sentinel for an unused entry in the checkpoint encoding
const UNUSED_ENTRY: u32 = u32::MAX;

// =============================================================================
// Inode Id
// =============================================================================

/// Logical inode identifier, stable for the inode's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct InodeId(u32);

impl InodeId {
    /// The root directory
    pub const ROOT: InodeId = InodeId(0);

    /// Raw identifier
    pub fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for InodeId {
    type Error = LogFsError;

    fn try_from(raw: u32) -> std::result::Result<Self, Self::Error> {
        if (raw as usize) < MAX_INODES {
            Ok(Self(raw))
        } else {
            Err(LogFsError::Corrupt(format!(
                "inode id {} outside table of {} entries",
                raw, MAX_INODES
            )))
        }
    }
}

impl From<InodeId> for u32 {
    fn from(id: InodeId) -> Self {
        id.0
    }
}

impl std::fmt::Display for InodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Inode Table
// =============================================================================

/// Fixed-cardinality map from inode id to record address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeTable {
    entries: Vec<Option<BlockAddress>>,
}

impl InodeTable {
    /// Create a table with every identifier unused
    pub fn new() -> Self {
        Self {
            entries: vec![None; MAX_INODES],
        }
    }

    /// Address of the latest record for `id`, if the id is live
    pub fn lookup(&self, id: InodeId) -> Option<BlockAddress> {
        self.entries[id.index()]
    }

    /// Point `id` at a new record
    pub fn set(&mut self, id: InodeId, addr: BlockAddress) {
        self.entries[id.index()] = Some(addr);
    }

    /// Mark `id` unused
    pub fn clear(&mut self, id: InodeId) {
        self.entries[id.index()] = None;
    }

    /// Lowest unused identifier
    pub fn allocate_id(&self) -> Result<InodeId> {
        self.entries
            .iter()
            .position(Option::is_none)
            .map(|index| InodeId(index as u32))
            .ok_or(LogFsError::OutOfInodes)
    }

    /// Live identifiers and their record addresses, in id order
    pub fn live(&self) -> impl Iterator<Item = (InodeId, BlockAddress)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.map(|addr| (InodeId(index as u32), addr)))
    }

    /// Number of live identifiers
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Encode into the fixed-width checkpoint image
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(CHECKPOINT_BYTES);
        for entry in &self.entries {
            let raw = entry.map(BlockAddress::raw).unwrap_or(UNUSED_ENTRY);
            buf.extend_from_slice(&raw.to_le_bytes());
        }
        buf
    }

    /// Decode a checkpoint image (trailing header padding is ignored)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CHECKPOINT_BYTES {
            return Err(LogFsError::Corrupt(format!(
                "checkpoint of {} bytes, expected at least {}",
                bytes.len(),
                CHECKPOINT_BYTES
            )));
        }

        let entries = bytes[..CHECKPOINT_BYTES]
            .chunks_exact(CHECKPOINT_ENTRY_SIZE)
            .map(|chunk| {
                let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                match raw {
                    UNUSED_ENTRY => Ok(None),
                    raw => BlockAddress::try_from(raw).map(Some),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
