//! Verify Module
//!
//! Walks the inode table and every live record, reporting broken invariants
//! without modifying anything.
//!
//! ## Checks
//! - The root exists and is a directory
//! - Each table entry points at a record carrying the same id
//! - No referenced block lies in a checkpoint header
//! - No block is referenced twice
//! - A file addresses exactly as many blocks as its size needs
//! - Every child listed by a directory is live and listed only once
//! - Every live inode except the root is listed by some directory

use std::collections::{HashMap, HashSet};

use crate::disk::BlockAddress;
use crate::error::Result;
use crate::log::Log;
use crate::record::{self, InodeKind};
use crate::table::InodeId;

/// Result of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Live inodes examined
    pub inodes_checked: usize,

    /// Distinct blocks referenced by live inodes, records included
    pub blocks_referenced: usize,

    /// Human-readable description of each broken invariant
    pub problems: Vec<String>,
}

impl VerifyReport {
    /// Whether no invariant was broken
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check every live record reachable through the inode table
pub fn verify(log: &Log) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    let mut referenced: HashSet<BlockAddress> = HashSet::new();
    let mut parents: HashMap<InodeId, usize> = HashMap::new();

    let mut claim = |addr: BlockAddress, what: String, report: &mut VerifyReport| {
        if addr.is_header() {
            report
                .problems
                .push(format!("{} at {} lies in a checkpoint header", what, addr));
        }
        if !referenced.insert(addr) {
            report
                .problems
                .push(format!("{} at {} is referenced twice", what, addr));
        }
    };

    match log.table().lookup(InodeId::ROOT) {
        None => report.problems.push("root directory is missing".to_string()),
        Some(addr) => match log.read_inode_at(addr) {
            Ok(root) if !root.is_dir() => {
                report.problems.push("root is not a directory".to_string());
            }
            Ok(_) => {}
            Err(e) => report.problems.push(format!("root record: {}", e)),
        },
    }

    for (id, addr) in log.table().live() {
        report.inodes_checked += 1;
        claim(addr, format!("record of {}", id), &mut report);

        let inode = match log.read_inode_at(addr) {
            Ok(inode) => inode,
            Err(e) => {
                report.problems.push(format!("{}: {}", id, e));
                continue;
            }
        };

        if inode.id != id {
            report
                .problems
                .push(format!("table entry {} holds record of {}", id, inode.id));
            continue;
        }

        if let Some(indirect) = inode.indirect {
            claim(indirect, format!("indirect block of {}", id), &mut report);
        }

        match inode.kind {
            InodeKind::File => {
                let blocks = match record::data_addresses(log, &inode) {
                    Ok(blocks) => blocks,
                    Err(e) => {
                        report.problems.push(format!("{} data pointers: {}", id, e));
                        continue;
                    }
                };
                for block in &blocks {
                    claim(*block, format!("data block of {}", id), &mut report);
                }
                let expected = record::blocks_for_len(inode.size);
                if blocks.len() != expected {
                    report.problems.push(format!(
                        "{} has size {} but addresses {} blocks (expected {})",
                        id,
                        inode.size,
                        blocks.len(),
                        expected
                    ));
                }
            }
            InodeKind::Directory => {
                let children = match record::children(log, &inode) {
                    Ok(children) => children,
                    Err(e) => {
                        report.problems.push(format!("{} child slots: {}", id, e));
                        continue;
                    }
                };
                for child in children {
                    if log.table().lookup(child).is_none() {
                        report
                            .problems
                            .push(format!("{} lists dead child {}", id, child));
                    }
                    *parents.entry(child).or_default() += 1;
                }
            }
        }
    }

    for (id, _) in log.table().live() {
        match (id == InodeId::ROOT, parents.get(&id).copied().unwrap_or(0)) {
            (true, 0) | (false, 1) => {}
            (true, n) => report
                .problems
                .push(format!("root is listed by {} directories", n)),
            (false, 0) => report.problems.push(format!("{} is orphaned", id)),
            (false, n) => report
                .problems
                .push(format!("{} is listed by {} directories", id, n)),
        }
    }

    report.blocks_referenced = referenced.len();

    if !report.is_clean() {
        tracing::warn!("Verify found {} problems", report.problems.len());
    }
    Ok(report)
}
