//! # DriftKV
//!
//! An embedded persistent key-value store with:
//! - A single append-only log file as the source of truth
//! - An in-memory index of key → newest record offset for O(1) lookups
//! - Full log replay on open to rebuild the index
//! - One engine-wide lock serializing every operation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                             │
//! │              (Mutex<log + index>, sync strategy)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   LogFile   │          │  KeyIndex   │
//!   │ (pread/     │◄─replay──│ (HashMap    │
//!   │  pwrite)    │          │  key→offset)│
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   Record    │
//!   │   codec     │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use driftkv::Engine;
//!
//! let engine = Engine::open("driftkv.db")?;
//! engine.set(b"day", b"monday")?;
//! assert_eq!(engine.get(b"day")?, Some(b"monday".to_vec()));
//! engine.close()?;
//! # Ok::<(), driftkv::DriftError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod index;
pub mod log;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DriftError, Result};
pub use config::{Config, SyncStrategy, TailPolicy};
pub use engine::{Engine, IndexCheck};
pub use log::ReplayStats;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DriftKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
