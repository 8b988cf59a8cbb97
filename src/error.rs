//! Error types for DriftKV
//!
//! Provides a unified error type for all engine operations.

use thiserror::Error;

/// Result type alias using DriftError
pub type Result<T> = std::result::Result<T, DriftError>;

/// Unified error type for DriftKV operations
#[derive(Debug, Error)]
pub enum DriftError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Opening, creating, or syncing the log file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Appending a record to the log failed; the index was not updated
    #[error("write failed at offset {offset}: {source}")]
    WriteFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Reading a record back from the log failed
    #[error("read failed at offset {offset}: {source}")]
    ReadFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("invalid key: keys must be non-empty")]
    InvalidKey,

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    /// Bytes did not decode to a well-formed record
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Replay hit undecodable data before a clean end of file
    #[error("corrupt log at offset {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
