//! # logfs
//!
//! A log-structured filesystem engine with:
//! - A fixed-size disk image split into segments
//! - Append-only allocation; every change writes new copies
//! - A per-segment checkpoint of the inode table
//! - An in-line cleaner that relocates live data on each segment rollover
//! - A filesystem-shaped API for an adapter to call
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Shell / filesystem adapter                      │
//! │            (Command, SharedEngine, errno)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        (namespace resolver, record layout, verify)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Log                                   │
//! │   cursor ─► allocator ─► rollover ─► checkpoint + cleaner    │
//! └──────────┬───────────────────────────────┬──────────────────┘
//!            │                               │
//!            ▼                               ▼
//!     ┌─────────────┐                 ┌─────────────┐
//!     │ Inode Table │                 │ Disk Image  │
//!     │ (id → addr) │                 │ (segments)  │
//!     └─────────────┘                 └──────┬──────┘
//!                                            ▼
//!                                  file or in-memory medium
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod disk;
pub mod table;
pub mod record;
pub mod log;
pub mod namespace;
pub mod verify;
pub mod engine;
pub mod command;
pub mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogFsError, Result};
pub use config::Config;
pub use engine::{Attributes, Engine};
pub use command::{Command, Output};
pub use handle::SharedEngine;
pub use record::InodeKind;
pub use table::InodeId;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logfs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
