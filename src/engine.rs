//! Engine Module
//!
//! The storage engine that ties the ordered index to the record log.
//!
//! ## Responsibilities
//! - Route every mutation through the log before the index sees it
//! - Rebuild the index by replaying the log on open
//! - Serve point lookups and ordered range scans
//! - Trigger background compaction
//!
//! ## Concurrency Model: three lock domains
//!
//! - **Structural lock** (`index`, RwLock): log append position plus any
//!   index mutation that changes tree shape or key existence. Exclusive for
//!   `put`/`remove`/`sync`; shared for `get`/`visit` and the whole of a
//!   compaction run.
//! - **Offset lock** (`offsets`, RwLock): the offset cells inside leaf
//!   entries. Shared (together with the structural lock) by `get`/`visit`
//!   while they read the log at a stored offset; exclusive, alone, during
//!   compaction's offset rewrite, so that rewrite stalls readers only for
//!   a pointer-swap moment.
//! - **Compaction lock** (`gc`, Mutex): serializes compaction runs for
//!   their whole lifetime.
//!
//! Acquisition order is always gc → structural → log writer → offsets.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use crate::compactor;
use crate::config::{Config, SyncPolicy};
use crate::error::{EmberError, Result};
use crate::index::BPlusTree;
use crate::log::{self, LogReader, LogWriter, Record};

/// The storage engine.
///
/// Cheap to clone: clones share one underlying core, which is how the
/// background compactor keeps the engine alive while it runs.
#[derive(Clone)]
pub struct Engine {
    core: Arc<EngineCore>,
}

/// Shared engine state behind the [`Engine`] handle
pub(crate) struct EngineCore {
    /// Engine configuration
    pub(crate) config: Config,

    /// Path of the append-only record log
    pub(crate) log_path: PathBuf,

    /// The ordered index; the RwLock doubles as the structural lock
    pub(crate) index: RwLock<BPlusTree>,

    /// Offset lock guarding the offset cells in leaf entries
    pub(crate) offsets: RwLock<()>,

    /// Compaction lock: at most one compaction runs at a time
    pub(crate) gc: Mutex<()>,

    /// Appender for the log; swapped out when compaction renames a fresh
    /// log into place
    pub(crate) writer: Mutex<LogWriter>,

    /// Handles of spawned compaction threads, awaitable via `wait_for_gc`
    gc_handles: Mutex<Vec<JoinHandle<Result<()>>>>,
}

impl EngineCore {
    pub(crate) const LOG_FILENAME: &'static str = "log";
    pub(crate) const COMPACT_FILENAME: &'static str = "log.compact";

    /// Path the compactor writes its fresh copy to before the rename
    pub(crate) fn compact_path(&self) -> PathBuf {
        self.log_path.with_file_name(Self::COMPACT_FILENAME)
    }
}

impl Engine {
    /// Open or create an engine with the given config.
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. If a log already exists, replay it into a fresh index
    /// 3. Position the appender at the end of the valid log prefix
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let log_path = config.data_dir.join(EngineCore::LOG_FILENAME);

        let mut index = BPlusTree::new();
        if log_path.exists() {
            let stats = log::replay(&log_path, &mut index)?;
            info!(
                records = stats.records_replayed,
                live_keys = stats.live_keys,
                truncated_bytes = stats.truncated_bytes,
                "index rebuilt from log"
            );
        }

        let writer = LogWriter::open(&log_path)?;
        info!(path = %log_path.display(), keys = index.len(), "engine opened");

        Ok(Self {
            core: Arc::new(EngineCore {
                config,
                log_path,
                index: RwLock::new(index),
                offsets: RwLock::new(()),
                gc: Mutex::new(()),
                writer: Mutex::new(writer),
                gc_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    /// Write a key-value pair.
    ///
    /// The record is appended to the log first; only then is the index
    /// pointed at it. Inputs above the configured size caps are rejected
    /// before any I/O.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let core = &self.core;
        if key.len() > core.config.max_key_size {
            return Err(EmberError::KeyTooLarge(key.len(), core.config.max_key_size));
        }
        if value.len() > core.config.max_value_size {
            return Err(EmberError::ValueTooLarge(
                value.len(),
                core.config.max_value_size,
            ));
        }

        let mut index = core.index.write();
        let offset = {
            let mut writer = core.writer.lock();
            let offset = writer.append(&Record::put(key, value))?;
            if core.config.sync_policy == SyncPolicy::EveryPut {
                writer.sync()?;
            }
            offset
        };
        index.insert(key, offset);
        Ok(())
    }

    /// Remove a key.
    ///
    /// Returns [`EmberError::KeyNotFound`] without touching the log when the
    /// key does not exist; absent keys get no tombstone.
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        let core = &self.core;
        let mut index = core.index.write();
        if !index.remove(key) {
            return Err(EmberError::KeyNotFound);
        }
        let mut writer = core.writer.lock();
        writer.append(&Record::tombstone(key))?;
        if core.config.sync_policy == SyncPolicy::EveryPut {
            writer.sync()?;
        }
        Ok(())
    }

    /// Get the value for a key, or `None` if it was never written or has
    /// been removed.
    ///
    /// # Panics
    ///
    /// Panics if the index points at bytes that are not a live Put record;
    /// that is a broken internal invariant, not a runtime condition.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let core = &self.core;
        let index = core.index.read();
        let _offsets = core.offsets.read();

        let offset = match index.search(key) {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let mut reader = LogReader::open(&core.log_path)?;
        match reader.read_at(offset) {
            Ok(Record::Put { value, .. }) => Ok(Some(value)),
            Ok(Record::Tombstone { .. }) => {
                panic!("index points at a tombstone record (offset {})", offset)
            }
            Err(EmberError::Corruption(msg)) => {
                panic!("index points at an unreadable record: {}", msg)
            }
            Err(e) => Err(e),
        }
    }

    /// Force previously appended records to durable storage
    pub fn sync(&self) -> Result<()> {
        let core = &self.core;
        let _index = core.index.write();
        let mut writer = core.writer.lock();
        writer.sync()
    }

    /// Apply `visitor` to every live pair in `[lower, upper]`, ascending.
    ///
    /// An empty `lower` starts before all keys; an empty `upper` never stops
    /// early, so `visit(b"", b"", ..)` walks the whole database. The locks
    /// are re-acquired for each leaf of the walk: a long scan never blocks
    /// writers for its whole duration, and a concurrent mutation may or may
    /// not be reflected partway through. No whole-range atomicity.
    ///
    /// The visitor runs with the engine's read locks held; calling a
    /// mutating engine method from inside it deadlocks.
    ///
    /// # Panics
    ///
    /// Panics on an index offset that does not hold a live Put record, like
    /// [`Engine::get`].
    pub fn visit<F>(&self, lower: &[u8], upper: &[u8], mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let core = &self.core;
        let mut from = lower.to_vec();
        loop {
            let index = core.index.read();
            let _offsets = core.offsets.read();

            let (mut leaf_id, mut start) = index.seek(&from);
            if start >= index.leaf(leaf_id).keys.len() {
                // range continues in the next leaf, if any
                match index.leaf(leaf_id).next {
                    Some(next_id) => {
                        leaf_id = next_id;
                        start = 0;
                    }
                    None => return Ok(()),
                }
            }

            // the log file is reopened under the locks so a compaction swap
            // between leaves cannot leave us reading stale offsets from a
            // renamed file
            let mut reader = LogReader::open(&core.log_path)?;
            let leaf = index.leaf(leaf_id);
            for i in start..leaf.keys.len() {
                if !upper.is_empty() && leaf.keys[i].as_slice() > upper {
                    return Ok(());
                }
                let offset = leaf.offsets[i].load(std::sync::atomic::Ordering::SeqCst);
                match reader.read_at(offset) {
                    Ok(Record::Put { key, value }) => visitor(&key, &value),
                    Ok(Record::Tombstone { .. }) => {
                        panic!("index points at a tombstone record (offset {})", offset)
                    }
                    Err(EmberError::Corruption(msg)) => {
                        panic!("index points at an unreadable record: {}", msg)
                    }
                    Err(e) => return Err(e),
                }
            }

            // resume after this leaf: capture the next leaf's first key
            // before the locks drop
            match leaf.next {
                Some(next_id) => from = index.leaf(next_id).keys[0].clone(),
                None => return Ok(()),
            }
        }
    }

    /// Trigger background compaction: rewrite the log to only the live
    /// records, in ascending key order, and reclaim the rest.
    ///
    /// Non-blocking; the work runs on a spawned thread. Runs are serialized
    /// internally, so triggering while one is active only queues another
    /// pass. Use [`Engine::wait_for_gc`] to await completion.
    pub fn garbage_collect(&self) -> Result<()> {
        let core = Arc::clone(&self.core);
        let handle = std::thread::Builder::new()
            .name("emberkv-compact".to_string())
            .spawn(move || {
                let result = compactor::run(&core);
                if let Err(e) = &result {
                    error!(error = %e, "compaction failed");
                }
                result
            })?;

        let mut handles = self.core.gc_handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }

    /// Wait for every compaction triggered so far and surface the first
    /// failure, if any
    pub fn wait_for_gc(&self) -> Result<()> {
        let handles: Vec<_> = self.core.gc_handles.lock().drain(..).collect();
        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.core.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.core.config.data_dir
    }

    /// Get the log file path
    pub fn log_path(&self) -> &Path {
        &self.core.log_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.core.config
    }
}
