//! Log Module
//!
//! The append-only log file: the durable source of truth.
//!
//! ## Responsibilities
//! - Positioned appends at the tracked end of file (no shared cursor)
//! - Positioned single-record reads for lookups
//! - Sequential replay to rebuild the key index on open
//! - Torn-tail handling according to `TailPolicy`
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Record 1 @ offset 0                           │
//! │ ┌──────────┬────────────┬───────┬─────────┐   │
//! │ │ KLen (8) │ VLen (8)   │ Key   │ Value   │   │
//! │ └──────────┴────────────┴───────┴─────────┘   │
//! ├───────────────────────────────────────────────┤
//! │ Record 2 @ offset 16 + KLen1 + VLen1          │
//! │ ...                                           │
//! └───────────────────────────────────────────────┘
//! ```

mod file;
mod replay;

pub use file::{LogFile, LogReader};
pub use replay::{replay, scan, ReplayStats, Scan, TornTail};
