//! Compactor Module
//!
//! Rewrites the log so only the latest live record per key survives, in
//! ascending key order, then points the index at the new copies.
//!
//! The run holds the structural lock shared for its whole lifetime: point
//! reads proceed throughout, writers stall for the duration (a bounded
//! stall, proportional to live-data size, not log size), and the leaf chain
//! cannot change between the two walks, so phase 2 can assign offsets
//! one-to-one in walk order.
//!
//! ```text
//! Phase 1 (shared structural):  walk leaves, copy live records → log.compact
//! Phase 2 (exclusive offsets):  walk leaves again, store the new offsets
//! Phase 3 (exclusive offsets):  delete old log, rename log.compact → log
//! ```
//! The new file is synced before the old one is deleted, and the rename is
//! strictly the last file operation.

use std::fs;
use std::sync::atomic::Ordering;

use tracing::info;

use crate::engine::EngineCore;
use crate::error::Result;
use crate::log::{LogReader, LogWriter};

/// One full compaction pass over `core`'s log
pub(crate) fn run(core: &EngineCore) -> Result<()> {
    let _gc_guard = core.gc.lock();
    let index = core.index.read();
    let mut writer = core.writer.lock();
    // phase 1 reads the file, so everything appended must be in it
    writer.flush()?;

    let old_bytes = writer.offset();
    let live_records = index.len();
    let compact_path = core.compact_path();
    let mut new_writer = LogWriter::create(&compact_path)?;
    let mut reader = LogReader::open(&core.log_path)?;

    // Phase 1: copy live records in leaf order, collecting their new offsets
    let mut new_offsets = Vec::with_capacity(live_records);
    let mut id = Some(index.first_leaf());
    while let Some(leaf_id) = id {
        let leaf = index.leaf(leaf_id);
        for cell in &leaf.offsets {
            let raw = reader.read_raw_at(cell.load(Ordering::SeqCst))?;
            new_offsets.push(new_writer.append_raw(&raw)?);
        }
        id = leaf.next;
    }
    new_writer.sync()?;

    // Phase 2: point every leaf entry at its copy. The walk order is the
    // same as phase 1's, so offsets line up one-to-one.
    let offsets_guard = core.offsets.write();
    let mut slot = 0;
    let mut id = Some(index.first_leaf());
    while let Some(leaf_id) = id {
        let leaf = index.leaf(leaf_id);
        for cell in &leaf.offsets {
            cell.store(new_offsets[slot], Ordering::SeqCst);
            slot += 1;
        }
        id = leaf.next;
    }
    debug_assert_eq!(slot, new_offsets.len());

    // Phase 3: swap the files; rename last
    let new_bytes = new_writer.offset();
    drop(new_writer);
    fs::remove_file(&core.log_path)?;
    fs::rename(&compact_path, &core.log_path)?;
    *writer = LogWriter::open(&core.log_path)?;
    drop(offsets_guard);

    info!(
        live_records,
        old_bytes,
        new_bytes,
        reclaimed = old_bytes - new_bytes,
        "log compacted"
    );
    Ok(())
}
