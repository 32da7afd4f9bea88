//! Secondary indexes and the index consistency contract.
//!
//! The write coordinator talks to indexes only through [`IndexManager`].
//! Implementations must:
//! - Validate every unique index before changing any of them
//! - Leave the previous, valid state in place when a write is rejected
//! - Treat retraction of an unindexed document as a no-op
//!
//! [`IndexEngine`] is the in-memory implementation used by collections.

mod engine;
mod field;

pub use engine::{IndexDescriptor, IndexEngine};
pub use field::FieldIndex;

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use std::fmt;

/// Whether an index enforces uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// At most one document per key.
    Unique,
    /// Any number of documents per key.
    NonUnique,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Unique => write!(f, "unique"),
            IndexKind::NonUnique => write!(f, "non-unique"),
        }
    }
}

/// Keeps secondary indexes consistent with the primary store.
pub trait IndexManager: Send + Sync {
    /// Indexes `document`'s field values under `id`.
    ///
    /// # Errors
    ///
    /// Returns `UniqueConstraintViolation` if a unique index already holds
    /// one of the values for a different id; no index is changed.
    fn register(&self, document: &Document, id: DocumentId) -> CoreResult<()>;

    /// Moves `id`'s entries from `old`'s values to `new`'s values.
    ///
    /// # Errors
    ///
    /// Returns `UniqueConstraintViolation` if a new value collides; the
    /// indexes keep referencing the old values.
    fn reconcile(&self, old: &Document, new: &Document, id: DocumentId) -> CoreResult<()>;

    /// Removes every entry held for `id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the in-memory engine never fails.
    fn retract(&self, document: &Document, id: DocumentId) -> CoreResult<()>;

    /// Returns how many index entries are held for `id`.
    fn entry_count(&self, id: DocumentId) -> usize;
}
