//! Primary store trait and implementations.
//!
//! The primary store is an ordered map from [`DocumentId`] to [`Document`]
//! with atomic single-key operations. It knows nothing about indexes,
//! revisions or change notification; the write coordinator owns those.
//!
//! # Invariants
//!
//! - `put_if_absent` never overwrites an existing entry
//! - `remove` fails with `DocumentNotFound` when the id is absent
//! - `ids` returns identifiers in ascending order
//! - Implementations must be `Send + Sync`; reads may run concurrently
//!   with the coordinator's writes
//!
//! # Implementors
//!
//! - [`InMemoryStore`] - ordered in-memory map

mod memory;

pub use memory::InMemoryStore;

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;

/// Ordered document storage for one collection.
pub trait PrimaryStore: Send + Sync {
    /// Returns the collection name this store backs.
    fn name(&self) -> &str;

    /// Reads a document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has been dropped.
    fn get(&self, id: DocumentId) -> CoreResult<Option<Document>>;

    /// Stores `document` only if `id` is absent.
    ///
    /// Returns the existing document when `id` is already present, in which
    /// case nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has been dropped.
    fn put_if_absent(&self, id: DocumentId, document: Document) -> CoreResult<Option<Document>>;

    /// Stores `document` under `id`, overwriting any existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has been dropped.
    fn put(&self, id: DocumentId, document: Document) -> CoreResult<()>;

    /// Removes and returns the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if `id` is absent, or an error if the
    /// store has been dropped.
    fn remove(&self, id: DocumentId) -> CoreResult<Document>;

    /// Returns true if `id` is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has been dropped.
    fn contains(&self, id: DocumentId) -> CoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Returns every stored id in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has been dropped.
    fn ids(&self) -> CoreResult<Vec<DocumentId>>;

    /// Returns the number of stored documents.
    fn len(&self) -> usize;

    /// Returns true if the store holds no documents.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once [`drop_store`](Self::drop_store) has been called.
    fn is_dropped(&self) -> bool;

    /// Discards all documents and marks the store unusable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store was already dropped.
    fn drop_store(&self) -> CoreResult<()>;
}
