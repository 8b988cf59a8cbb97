//! Engine Module
//!
//! The storage engine: one append-only log plus an in-memory offset index.
//!
//! ## Responsibilities
//! - Open (or create) the log and replay it before serving requests
//! - Append records and point the index at their offsets
//! - Serve point lookups with a single positioned read
//! - Serialize all access behind one engine-wide lock

use std::path::Path;

use parking_lot::Mutex;

use crate::config::{Config, SyncStrategy};
use crate::error::{DriftError, Result};
use crate::index::{IndexDiff, KeyIndex};
use crate::log::{self, LogFile, ReplayStats};
use crate::record;

/// The main storage engine
///
/// ## Concurrency Model: one exclusive lock
///
/// - Every operation (set/get/sync/verify) holds `state` for its full
///   duration, including file I/O
/// - Two `set`s never interleave their append + index update, and a `get`
///   never sees a half-updated index
/// - File access is positioned (offset per call), so nothing depends on a
///   shared cursor
///
/// ## Future Optimization:
/// - Swap `Mutex` for `RwLock` so lookups of already-durable offsets run in
///   parallel; writers would still serialize on the write half
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Log file + index, guarded together
    state: Mutex<EngineState>,

    /// What the opening replay found
    replay_stats: ReplayStats,
}

struct EngineState {
    log: LogFile,
    index: KeyIndex,
    /// Appends since the last fsync
    unsynced: usize,
}

/// Result of re-deriving the index from the log
#[derive(Debug, Clone)]
pub struct IndexCheck {
    /// Records read during the check
    pub records: u64,
    /// Disagreements between the live and rebuilt index
    pub diff: IndexDiff,
}

impl IndexCheck {
    pub fn is_consistent(&self) -> bool {
        self.diff.is_consistent()
    }
}

impl Engine {
    /// Open or create an engine over the log file at `path`
    ///
    /// Uses default config for everything but the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(Config::for_path(path.as_ref()))
    }

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create the log file
    /// 2. Replay every record to rebuild the index
    /// 3. Apply the tail policy to a torn final record
    /// 4. Ready to serve requests
    pub fn open_with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let mut log = LogFile::open(&config.path)?;
        if log.is_empty() {
            tracing::debug!(
                path = %config.path.display(),
                "opening empty log, nothing to replay"
            );
        }
        let (index, replay_stats) = log::replay(&mut log, config.tail_policy)?;

        tracing::info!(
            path = %config.path.display(),
            records = replay_stats.records,
            keys = replay_stats.keys,
            superseded = replay_stats.superseded,
            truncated_bytes = replay_stats.truncated_bytes,
            log_bytes = log.len(),
            "log replay complete"
        );

        Ok(Self {
            config,
            state: Mutex::new(EngineState {
                log,
                index,
                unsynced: 0,
            }),
            replay_stats,
        })
    }

    /// Store `value` under `key`
    ///
    /// Steps:
    /// 1. Reject an empty key (before any I/O)
    /// 2. Encode the record
    /// 3. Acquire the lock, append at end of log
    /// 4. Point the index at the new offset
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(DriftError::InvalidKey);
        }

        let bytes = record::encode(key, value);

        let mut state = self.state.lock();
        let sync = match self.config.sync_strategy {
            SyncStrategy::OsManaged => false,
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => state.unsynced + 1 >= count,
        };

        let offset = state.log.append(&bytes, sync)?;
        state.index.insert(key.to_vec(), offset);
        state.unsynced = if sync { 0 } else { state.unsynced + 1 };

        tracing::debug!(offset, len = bytes.len(), synced = sync, "appended record");
        Ok(())
    }

    /// Get the newest value for `key`
    ///
    /// Returns `Ok(None)` when the key was never set.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let state = self.state.lock();

        let offset = match state.index.get(key) {
            Some(offset) => offset,
            None => return Ok(None),
        };

        let record = state.log.read_record(offset)?;
        if record.key != key {
            return Err(DriftError::CorruptRecord(format!(
                "index points at offset {} but the record there has a different key",
                offset
            )));
        }

        Ok(Some(record.value))
    }

    /// Whether `key` has a value
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.state.lock().index.contains(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    /// Snapshot of every key, in arbitrary order
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .index
            .iter()
            .map(|(key, _)| key.to_vec())
            .collect()
    }

    /// Size of the log in bytes, superseded records included
    pub fn log_size(&self) -> u64 {
        self.state.lock().log.len()
    }

    /// Force any unsynced appends to disk
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.log.sync()?;
        state.unsynced = 0;
        Ok(())
    }

    /// Rebuild the index from the log and diff it against the live one
    ///
    /// The log is not modified. A torn tail found here means an append failed
    /// and could not be rolled back, and is reported as `CorruptLog`.
    pub fn verify_index(&self) -> Result<IndexCheck> {
        let state = self.state.lock();
        let scan = log::scan(&state.log)?;

        if let Some(tail) = scan.torn_tail {
            return Err(DriftError::CorruptLog {
                offset: tail.offset,
                reason: tail.reason,
            });
        }

        let diff = state.index.diff(&scan.index);
        if !diff.is_consistent() {
            tracing::warn!(
                missing = diff.missing.len(),
                stale = diff.stale.len(),
                unexpected = diff.unexpected.len(),
                "index disagrees with log"
            );
        }

        Ok(IndexCheck {
            records: scan.records,
            diff,
        })
    }

    /// Close the engine gracefully
    ///
    /// Syncs the log and releases the file handle.
    pub fn close(self) -> Result<()> {
        self.sync()?;
        tracing::info!(path = %self.config.path.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Stats from the replay performed at open
    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay_stats
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.unsynced > 0 {
            if let Err(e) = state.log.sync() {
                tracing::error!(error = %e, "failed to sync log on drop");
            }
        }
    }
}
