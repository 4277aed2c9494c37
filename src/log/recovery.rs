//! Log Recovery
//!
//! Rebuilds the ordered index by replaying the log from the start.
//!
//! A record that parses only partially before end of file is the tail of an
//! append interrupted by a crash, not corruption: replay stops at the last
//! complete record and the torn bytes are cut off so subsequent appends
//! resume exactly where the valid prefix ends.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::index::BPlusTree;

use super::{LogReader, ReadOutcome, Record};

/// Result of replaying a log
#[derive(Debug)]
pub struct RecoveryResult {
    /// Number of complete records replayed
    pub records_replayed: u64,

    /// Number of live keys in the rebuilt index
    pub live_keys: usize,

    /// Bytes of torn tail record cut off (0 for a clean shutdown)
    pub truncated_bytes: u64,
}

/// Replay the log at `path` into `index`.
///
/// For every Put the key is (re-)pointed at that record's offset; for every
/// Tombstone the key is dropped. After replay each index entry points at
/// the latest non-tombstoned record for its key in log order, and the log's
/// length equals the exact byte length of its valid prefix.
pub fn replay(path: &Path, index: &mut BPlusTree) -> Result<RecoveryResult> {
    let file_len = std::fs::metadata(path)?.len();
    let mut reader = LogReader::open(path)?;

    let mut offset = 0u64;
    let mut records = 0u64;
    loop {
        match reader.read_next()? {
            ReadOutcome::Record(record) => {
                let len = record.encoded_len();
                match record {
                    Record::Put { key, .. } => {
                        index.insert(&key, offset);
                    }
                    Record::Tombstone { key } => {
                        index.remove(&key);
                    }
                }
                offset += len;
                records += 1;
            }
            ReadOutcome::Eof => break,
            ReadOutcome::Truncated => break,
        }
    }

    let truncated_bytes = file_len - offset;
    if truncated_bytes > 0 {
        warn!(
            offset,
            truncated_bytes, "log ends in a torn record; cutting it off"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(offset)?;
    }

    Ok(RecoveryResult {
        records_replayed: records,
        live_keys: index.len(),
        truncated_bytes,
    })
}
