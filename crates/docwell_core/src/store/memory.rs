//! In-memory primary store.

use crate::document::{Document, DocumentId, DOC_SOURCE};
use crate::error::{CoreError, CoreResult};
use crate::store::PrimaryStore;
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// An ordered in-memory primary store.
///
/// This store keeps all documents in a `BTreeMap` and is suitable for:
/// - Unit and integration tests
/// - Ephemeral collections that don't need persistence
///
/// # Thread Safety
///
/// The map is guarded by a read-write lock: reads proceed in parallel and
/// each write is atomic with respect to a single key.
///
/// # Example
///
/// ```rust
/// use docwell_core::{doc, DocumentId, InMemoryStore, PrimaryStore};
///
/// let store = InMemoryStore::new("users");
/// let id = DocumentId::from_u64(1);
/// assert!(store.put_if_absent(id, doc! { "name" => "Ada" }).unwrap().is_none());
/// assert!(store.put_if_absent(id, doc! { "name" => "Bob" }).unwrap().is_some());
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    name: String,
    entries: RwLock<BTreeMap<DocumentId, Document>>,
    dropped: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store for the named collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
            dropped: AtomicBool::new(false),
        }
    }

    /// Returns a copy of all entries in id order.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(DocumentId, Document)> {
        self.entries
            .read()
            .iter()
            .map(|(id, doc)| (*id, doc.clone()))
            .collect()
    }

    fn check_open(&self) -> CoreResult<()> {
        if self.dropped.load(Ordering::Acquire) {
            Err(CoreError::store_dropped(&self.name))
        } else {
            Ok(())
        }
    }
}

impl PrimaryStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        self.check_open()?;
        Ok(self.entries.read().get(&id).cloned())
    }

    fn put_if_absent(&self, id: DocumentId, document: Document) -> CoreResult<Option<Document>> {
        self.check_open()?;
        debug_assert!(!document.contains_key(DOC_SOURCE));
        match self.entries.write().entry(id) {
            Entry::Occupied(existing) => Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(None)
            }
        }
    }

    fn put(&self, id: DocumentId, document: Document) -> CoreResult<()> {
        self.check_open()?;
        debug_assert!(!document.contains_key(DOC_SOURCE));
        self.entries.write().insert(id, document);
        Ok(())
    }

    fn remove(&self, id: DocumentId) -> CoreResult<Document> {
        self.check_open()?;
        self.entries
            .write()
            .remove(&id)
            .ok_or_else(|| CoreError::document_not_found(&self.name, id))
    }

    fn contains(&self, id: DocumentId) -> CoreResult<bool> {
        self.check_open()?;
        Ok(self.entries.read().contains_key(&id))
    }

    fn ids(&self) -> CoreResult<Vec<DocumentId>> {
        self.check_open()?;
        Ok(self.entries.read().keys().copied().collect())
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::Acquire)
    }

    fn drop_store(&self) -> CoreResult<()> {
        if self.dropped.swap(true, Ordering::AcqRel) {
            return Err(CoreError::store_dropped(&self.name));
        }
        self.entries.write().clear();
        Ok(())
    }
}
