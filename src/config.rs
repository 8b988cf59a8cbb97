//! Configuration for DriftKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{DriftError, Result};

/// Main configuration for a DriftKV engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log file (created if absent)
    pub path: PathBuf,

    /// Sync strategy: how often to fsync the log after appends
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Recovery Configuration
    // -------------------------------------------------------------------------
    /// What replay does with an incomplete record at the end of the log
    pub tail_policy: TailPolicy,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Never fsync on the write path; the OS decides when pages hit disk
    OsManaged,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced appends
    EveryNEntries { count: usize },
}

/// Handling of a torn record at the tail of the log during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPolicy {
    /// Refuse to open; replay fails with `CorruptLog`
    Strict,

    /// Truncate the file to the last complete record and continue
    Truncate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./driftkv.db"),
            sync_strategy: SyncStrategy::OsManaged,
            tail_policy: TailPolicy::Strict,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config pointed at `path`
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self::builder().path(path).build()
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DriftError::Config("log path must not be empty".to_string()));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(DriftError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the torn-tail policy used by replay
    pub fn tail_policy(mut self, policy: TailPolicy) -> Self {
        self.config.tail_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
