//! Ordered Index Module
//!
//! An in-memory B+tree mapping keys to byte offsets in the record log.
//!
//! ## Responsibilities
//! - Ordered key → log-offset mapping with byte-lexicographic key order
//! - Rebalancing on insert/remove (rotate, split, merge, root collapse)
//! - Doubly linked leaf chain for range scans without parent traversal
//!
//! ## Structure
//! ```text
//!                     ┌───────────────┐
//!                     │   Internal    │
//!                     │  [ c | f ]    │
//!                     └──┬────┬────┬──┘
//!                        │    │    │
//!            ┌───────────▼┐ ┌─▼─────────┐ ┌▼───────────┐
//!            │ Leaf [a,b] │⇄│ Leaf [c,e]│⇄│ Leaf [f,g] │
//!            └────────────┘ └───────────┘ └────────────┘
//!              (key, offset) entries, leaves doubly linked
//! ```
//!
//! Nodes live in an arena and refer to each other through [`NodeId`]
//! handles, so parent and sibling links stay valid across splits and
//! merges. The index holds no persistence logic: offsets are opaque to it
//! and are rebuilt from the log on startup.

pub(crate) mod node;
mod tree;

pub use tree::{BPlusTree, InsertOutcome, Iter};

// =============================================================================
// Tree Geometry
// =============================================================================

/// Fan-out order M: maximum children per internal node
pub const ORDER: usize = 5;

/// Maximum keys per node (M - 1)
pub const MAX_KEYS: usize = ORDER - 1;

/// Minimum keys per non-root node (⌈M/2⌉ - 1)
pub const MIN_KEYS: usize = (ORDER + 1) / 2 - 1;

/// A sibling can lend an entry only while it holds at least this many keys
/// (⌈M/2⌉)
pub const BORROW_MIN: usize = (ORDER + 1) / 2;
