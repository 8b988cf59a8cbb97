//! Record Module
//!
//! The unit of durability: one key/value pair as stored in the log.
//!
//! ## Responsibilities
//! - Length-prefixed encoding, binary safe for keys and values
//! - Decoding driven entirely by the header (no delimiter scanning)
//! - No file I/O; the engine and replay own the file
//!
//! ## Record Format
//! ```text
//! ┌────────────────┬──────────────────┬───────────┬─────────────┐
//! │ KeyLen (8, LE) │ ValueLen (8, LE) │ Key bytes │ Value bytes │
//! └────────────────┴──────────────────┴───────────┴─────────────┘
//! ```
//!
//! Records are concatenated in append order with no file header, footer,
//! or checksum.

mod codec;

pub use codec::{decode, decode_header, encode, encoded_len, RecordHeader, HEADER_SIZE};

/// A decoded key/value record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode this record to its on-disk bytes
    pub fn encode(&self) -> bytes::Bytes {
        encode(&self.key, &self.value)
    }

    /// Number of bytes this record occupies in the log
    pub fn encoded_len(&self) -> u64 {
        encoded_len(&self.key, &self.value)
    }
}
