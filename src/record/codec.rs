//! Record codec
//!
//! Pure encode/decode functions for log records.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Record;
use crate::error::{DriftError, Result};

/// Header size: key length (8) + value length (8)
pub const HEADER_SIZE: usize = 16;

/// The fixed-size length prefix at the start of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_len: u64,
    pub value_len: u64,
}

impl RecordHeader {
    /// Bytes following the header (key + value)
    ///
    /// `None` if the declared lengths overflow, which only garbage can produce.
    pub fn body_len(&self) -> Option<u64> {
        self.key_len.checked_add(self.value_len)
    }

    /// Total on-disk size of the record this header describes
    pub fn record_len(&self) -> Option<u64> {
        self.body_len()?.checked_add(HEADER_SIZE as u64)
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a key/value pair
///
/// Format: key_len (8, LE) + value_len (8, LE) + key + value
pub fn encode(key: &[u8], value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + key.len() + value.len());
    buf.put_u64_le(key.len() as u64);
    buf.put_u64_le(value.len() as u64);
    buf.put_slice(key);
    buf.put_slice(value);
    buf.freeze()
}

/// Size in bytes of the encoded record for this pair
pub fn encoded_len(key: &[u8], value: &[u8]) -> u64 {
    (HEADER_SIZE + key.len() + value.len()) as u64
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode only the length header from the front of `bytes`
pub fn decode_header(bytes: &[u8]) -> Result<RecordHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(DriftError::CorruptRecord(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = &bytes[..HEADER_SIZE];
    let key_len = buf.get_u64_le();
    let value_len = buf.get_u64_le();

    Ok(RecordHeader { key_len, value_len })
}

/// Decode one record from the front of `bytes`
///
/// Returns the record and the number of bytes consumed. Trailing bytes past
/// the record are left untouched.
pub fn decode(bytes: &[u8]) -> Result<(Record, usize)> {
    let header = decode_header(bytes)?;
    let mut rest = &bytes[HEADER_SIZE..];

    let key_len = field_len(header.key_len, "key")?;
    if rest.remaining() < key_len {
        return Err(DriftError::CorruptRecord(format!(
            "truncated key: expected {} bytes, got {}",
            key_len,
            rest.remaining()
        )));
    }
    let key = rest[..key_len].to_vec();
    rest.advance(key_len);

    let value_len = field_len(header.value_len, "value")?;
    if rest.remaining() < value_len {
        return Err(DriftError::CorruptRecord(format!(
            "truncated value: expected {} bytes, got {}",
            value_len,
            rest.remaining()
        )));
    }
    let value = rest[..value_len].to_vec();

    Ok((Record { key, value }, HEADER_SIZE + key_len + value_len))
}

fn field_len(len: u64, field: &str) -> Result<usize> {
    usize::try_from(len).map_err(|_| {
        DriftError::CorruptRecord(format!("{} length {} does not fit in memory", field, len))
    })
}
