//! Log file handle
//!
//! Wraps the backing `File` with explicit-offset reads and writes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{DriftError, Result};
use crate::record::{self, Record, HEADER_SIZE};

/// The append-only log file
///
/// `len` is the logical end of the log: the offset the next append lands at.
/// Every byte below `len` belongs to a complete record.
#[derive(Debug)]
pub struct LogFile {
    file: File,
    path: PathBuf,
    len: u64,
}

impl LogFile {
    /// Open or create the log at `path` for reading and writing
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end-of-log offset
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `bytes` at the end of the log, returning the offset they start at
    ///
    /// With `sync` set, the data is fsynced before returning. On any failure
    /// the file is cut back to the pre-append length so a partial record never
    /// sits in front of later appends.
    pub fn append(&mut self, bytes: &[u8], sync: bool) -> Result<u64> {
        let offset = self.len;

        let written = write_all_at(&self.file, bytes, offset).and_then(|()| {
            if sync {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(source) = written {
            if let Err(rollback) = self.file.set_len(offset) {
                tracing::error!(
                    offset,
                    error = %rollback,
                    "failed to roll back partial append"
                );
            }
            return Err(DriftError::WriteFailed { offset, source });
        }

        self.len += bytes.len() as u64;
        Ok(offset)
    }

    /// Read and decode the single record starting at `offset`
    pub fn read_record(&self, offset: u64) -> Result<Record> {
        let header_end = offset.checked_add(HEADER_SIZE as u64);
        if header_end.map_or(true, |end| end > self.len) {
            return Err(DriftError::CorruptRecord(format!(
                "offset {} leaves no room for a header in a {} byte log",
                offset, self.len
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        read_exact_at(&self.file, &mut header, offset)
            .map_err(|source| DriftError::ReadFailed { offset, source })?;
        let header = record::decode_header(&header)?;

        let record_len = header
            .record_len()
            .filter(|len| offset.checked_add(*len).is_some_and(|end| end <= self.len))
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                DriftError::CorruptRecord(format!(
                    "record at offset {} extends past end of log ({} bytes)",
                    offset, self.len
                ))
            })?;

        let mut buf = vec![0u8; record_len];
        read_exact_at(&self.file, &mut buf, offset)
            .map_err(|source| DriftError::ReadFailed { offset, source })?;

        let (record, _) = record::decode(&buf)?;
        Ok(record)
    }

    /// Sequential reader starting at `offset`, independent of any other reader
    pub fn reader_at(&self, offset: u64) -> LogReader<'_> {
        LogReader {
            log: self,
            pos: offset,
        }
    }

    /// Flush file data and metadata to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Cut the log back to `len` bytes and make the new length durable
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.len = len;
        Ok(())
    }
}

// =============================================================================
// Sequential Reader
// =============================================================================

/// `Read + Seek` view over a log, backed by positioned reads
///
/// Each reader carries its own position, so replay never disturbs lookups.
pub struct LogReader<'a> {
    log: &'a LogFile,
    pos: u64,
}

impl Read for LogReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.log.len.saturating_sub(self.pos);
        let want = buf.len().min(usize::try_from(available).unwrap_or(usize::MAX));
        if want == 0 {
            return Ok(0);
        }

        let n = read_at(&self.log.file, &mut buf[..want], self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for LogReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => self.log.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

// =============================================================================
// Positioned I/O
// =============================================================================

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.write_at(buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_write(buf, offset)
}

fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    while !buf.is_empty() {
        match read_at(file, buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    while !buf.is_empty() {
        match write_at(file, buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
