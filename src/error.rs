//! Error types for logfs
//!
//! Provides a unified error type for all engine operations, plus the errno
//! mapping a filesystem adapter hands back to the kernel.

use thiserror::Error;

/// Result type alias using LogFsError
pub type Result<T> = std::result::Result<T, LogFsError>;

/// Unified error type for logfs operations
#[derive(Debug, Error)]
pub enum LogFsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Namespace Errors
    // -------------------------------------------------------------------------
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("No free inode identifiers")]
    OutOfInodes,

    #[error("Out of space: {0}")]
    OutOfSpace(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Command error: {0}")]
    Command(String),
}

impl LogFsError {
    /// Platform error code an adapter should report for this error
    pub fn errno(&self) -> i32 {
        match self {
            LogFsError::NotFound(_) => libc::ENOENT,
            LogFsError::NotADirectory(_) => libc::ENOTDIR,
            LogFsError::IsADirectory(_) => libc::EISDIR,
            LogFsError::NotEmpty(_) => libc::ENOTEMPTY,
            LogFsError::InvalidName(_) | LogFsError::InvalidPath(_) | LogFsError::Command(_) => {
                libc::EINVAL
            }
            LogFsError::OutOfInodes => libc::ENOMEM,
            LogFsError::OutOfSpace(_) => libc::ENOSPC,
            LogFsError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            LogFsError::Corrupt(_) | LogFsError::Serialization(_) => libc::EIO,
        }
    }
}

impl From<bincode::Error> for LogFsError {
    fn from(err: bincode::Error) -> Self {
        LogFsError::Serialization(err.to_string())
    }
}
