//! Record Log Module
//!
//! The append-only record log is the single source of truth; the ordered
//! index is rebuilt from it on open and acts purely as an acceleration
//! structure.
//!
//! ## Responsibilities
//! - Append Put/Tombstone records before the index is updated
//! - Positional reads of exactly one record for point lookups and scans
//! - Replay on open, discarding a torn record at the tail
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Put record                                                 │
//! │ ┌─────────────┬───────────────┬───────────┬──────────────┐ │
//! │ │ key_len (8) │ value_len (8) │ key bytes │ value bytes  │ │
//! │ └─────────────┴───────────────┴───────────┴──────────────┘ │
//! ├────────────────────────────────────────────────────────────┤
//! │ Tombstone record                                           │
//! │ ┌─────────────┬───────────────┬───────────┐                │
//! │ │ key_len (8) │ u64::MAX  (8) │ key bytes │                │
//! │ └─────────────┴───────────────┴───────────┘                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//! Both length prefixes are little-endian u64. A `value_len` of `u64::MAX`
//! marks a tombstone and no value bytes follow; any other value is the
//! literal byte length of the value, which may be zero.

mod reader;
mod record;
mod recovery;
mod writer;

pub use reader::LogReader;
pub use record::{ReadOutcome, Record};
pub use recovery::{replay, RecoveryResult};
pub use writer::LogWriter;

/// Sentinel in the value-length slot marking a tombstone record
pub const TOMBSTONE: u64 = u64::MAX;

/// Size of the two length prefixes preceding every record's payload
pub const PREFIX_SIZE: usize = 16;
