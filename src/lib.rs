//! # emberkv
//!
//! An embedded key-value engine:
//! - In-memory B+tree index mapping keys to log offsets
//! - Append-only record log as the single source of truth
//! - Crash recovery by log replay (no persisted index)
//! - Background compaction to reclaim stale and deleted records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                                │
//! │     put / remove / get / sync / visit / garbage_collect      │
//! └────────────┬───────────────────────────────┬────────────────┘
//!              │                               │
//! ┌────────────▼────────────┐     ┌────────────▼────────────────┐
//! │      OrderedIndex       │     │         Record Log           │
//! │   (B+tree, RwLock)      │     │   (append-only, replayed     │
//! │   key → log offset      │     │    on open)                  │
//! └────────────▲────────────┘     └────────────▲────────────────┘
//!              │                               │
//! ┌────────────┴───────────────────────────────┴────────────────┐
//! │                       Compactor                              │
//! │        (background thread, rewrites log + offsets)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod index;
pub mod log;

mod compactor;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, ConfigBuilder, SyncPolicy};
pub use engine::Engine;
pub use error::{EmberError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of emberkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
