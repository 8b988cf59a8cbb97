//! Log replay
//!
//! Rebuilds the key index by reading every record from offset 0.

use std::io::{BufReader, Read};

use super::LogFile;
use crate::config::TailPolicy;
use crate::error::{DriftError, Result};
use crate::index::KeyIndex;
use crate::record::{self, HEADER_SIZE};

/// Read buffer used while scanning the log
const SCAN_BUFFER_SIZE: usize = 64 * 1024;

/// An incomplete record at the end of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TornTail {
    /// Where the incomplete record begins (the last valid boundary)
    pub offset: u64,
    pub reason: String,
}

/// Outcome of a read-only pass over the log
#[derive(Debug)]
pub struct Scan {
    pub index: KeyIndex,
    /// Complete records read
    pub records: u64,
    /// End of the last complete record
    pub valid_len: u64,
    pub torn_tail: Option<TornTail>,
}

/// Summary of the replay performed when an engine opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Complete records read from the log
    pub records: u64,

    /// Distinct keys in the rebuilt index
    pub keys: usize,

    /// Records shadowed by a newer record for the same key
    pub superseded: u64,

    /// Bytes cut from a torn tail (only under `TailPolicy::Truncate`)
    pub truncated_bytes: u64,
}

/// Scan the whole log without modifying it
///
/// A record whose declared size runs past the end of the file is reported as
/// a torn tail. A complete record with an empty key can only be garbage and
/// fails with `CorruptLog`.
pub fn scan(log: &LogFile) -> Result<Scan> {
    let file_len = log.len();
    let mut reader = BufReader::with_capacity(SCAN_BUFFER_SIZE, log.reader_at(0));
    let mut index = KeyIndex::new();
    let mut records = 0u64;
    let mut offset = 0u64;
    let mut header_buf = [0u8; HEADER_SIZE];
    let mut torn_tail = None;

    while offset < file_len {
        let remaining = file_len - offset;
        if remaining < HEADER_SIZE as u64 {
            torn_tail = Some(TornTail {
                offset,
                reason: format!("{} trailing bytes, shorter than a record header", remaining),
            });
            break;
        }

        reader
            .read_exact(&mut header_buf)
            .map_err(|source| DriftError::ReadFailed { offset, source })?;
        let header = record::decode_header(&header_buf)?;

        let record_len = match header.record_len() {
            Some(len) if len <= remaining => len,
            _ => {
                torn_tail = Some(TornTail {
                    offset,
                    reason: format!(
                        "record declares key_len={} value_len={} but only {} bytes remain",
                        header.key_len, header.value_len, remaining
                    ),
                });
                break;
            }
        };

        if header.key_len == 0 {
            return Err(DriftError::CorruptLog {
                offset,
                reason: "record has an empty key".to_string(),
            });
        }

        // Both lengths are bounded by `remaining`, so they fit the casts below.
        let mut key = vec![0u8; header.key_len as usize];
        reader
            .read_exact(&mut key)
            .map_err(|source| DriftError::ReadFailed { offset, source })?;
        reader
            .seek_relative(header.value_len as i64)
            .map_err(|source| DriftError::ReadFailed { offset, source })?;

        index.insert(key, offset);
        records += 1;
        offset += record_len;
    }

    Ok(Scan {
        index,
        records,
        valid_len: offset,
        torn_tail,
    })
}

/// Replay the log into a fresh index, applying `policy` to a torn tail
pub fn replay(log: &mut LogFile, policy: TailPolicy) -> Result<(KeyIndex, ReplayStats)> {
    let scan = scan(log)?;
    let mut truncated_bytes = 0;

    if let Some(tail) = scan.torn_tail {
        match policy {
            TailPolicy::Strict => {
                return Err(DriftError::CorruptLog {
                    offset: tail.offset,
                    reason: tail.reason,
                });
            }
            TailPolicy::Truncate => {
                truncated_bytes = log.len() - tail.offset;
                tracing::warn!(
                    path = %log.path().display(),
                    offset = tail.offset,
                    truncated_bytes,
                    reason = %tail.reason,
                    "truncating torn record at end of log"
                );
                log.truncate(tail.offset)?;
            }
        }
    }

    let keys = scan.index.len();
    let stats = ReplayStats {
        records: scan.records,
        keys,
        superseded: scan.records - keys as u64,
        truncated_bytes,
    };

    Ok((scan.index, stats))
}
