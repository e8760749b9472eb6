//! Index subsystem for docshape
//!
//! Per-field index markers on schema nodes are gathered into dot-notation
//! declarations, compared with the store's live indexes by canonical
//! fingerprint, and reconciled through the `IndexStore` collaborator.
//!
//! # Design Principles
//!
//! - Declarations are plain data: key order and options are significant
//! - Identity is the canonical serialization, never object identity
//! - The primary-key index is never dropped
//!
//! # Invariants
//!
//! - Collection order is tree order, then compound declarations
//! - A second synchronization with no schema change creates and drops nothing

mod collector;
mod declaration;
mod diff;
mod errors;
mod memory;
mod store;
mod sync;

pub use collector::collect_indexes;
pub use declaration::{FieldIndex, IndexDeclaration, IndexDirection, IndexOptions};
pub use diff::{diff_indexes, IndexDiff};
pub use errors::{IndexError, IndexResult, StoreError, StoreResult};
pub use memory::MemoryIndexStore;
pub use store::{IndexStore, LiveIndex};
pub use sync::{sync_indexes, SyncOptions, SyncReport};
