//! Lazy, sized document cursor.

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::store::PrimaryStore;
use std::fmt;
use std::sync::Arc;

/// A sized sequence of matching documents.
///
/// The matching ids are fixed when the cursor is created; documents are
/// read from the primary store one at a time as the cursor advances.
/// Documents removed after resolution are skipped, so the number of items
/// yielded can be smaller than [`size`](Self::size).
pub struct Cursor {
    ids: Vec<DocumentId>,
    store: Arc<dyn PrimaryStore>,
    position: usize,
}

impl Cursor {
    /// Creates a cursor over `ids`, read from `store`.
    pub fn new(ids: Vec<DocumentId>, store: Arc<dyn PrimaryStore>) -> Self {
        Self {
            ids,
            store,
            position: 0,
        }
    }

    /// Returns the number of matches at resolution time.
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the matching ids in cursor order.
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// Reads the first still-present document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn first(mut self) -> CoreResult<Option<Document>> {
        self.next().transpose()
    }

    /// Reads every still-present document.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read fails.
    pub fn to_vec(self) -> CoreResult<Vec<Document>> {
        self.collect()
    }
}

impl Iterator for Cursor {
    type Item = CoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.ids.get(self.position).copied() {
            self.position += 1;
            match self.store.get(id) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ids.len() - self.position))
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("collection", &self.store.name())
            .field("size", &self.ids.len())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::store::InMemoryStore;

    fn store_with(n: u64) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new("test"));
        for i in 1..=n {
            store
                .put(DocumentId::from_u64(i), doc! { "n" => i as i64 })
                .unwrap();
        }
        store
    }

    #[test]
    fn yields_in_id_order() {
        let store = store_with(3);
        let ids = store.ids().unwrap();
        let cursor = Cursor::new(ids, store);

        assert_eq!(cursor.size(), 3);
        let values: Vec<_> = cursor
            .map(|d| d.unwrap().get("n").cloned().unwrap())
            .collect();
        assert_eq!(values, vec![1i64.into(), 2i64.into(), 3i64.into()]);
    }

    #[test]
    fn skips_documents_removed_after_resolution() {
        let store = store_with(3);
        let cursor = Cursor::new(store.ids().unwrap(), Arc::clone(&store) as Arc<dyn PrimaryStore>);
        store.remove(DocumentId::from_u64(2)).unwrap();

        assert_eq!(cursor.size(), 3);
        assert_eq!(cursor.to_vec().unwrap().len(), 2);
    }

    #[test]
    fn first_of_empty_cursor() {
        let store = store_with(0);
        let cursor = Cursor::new(Vec::new(), store);
        assert!(cursor.is_empty());
        assert!(cursor.first().unwrap().is_none());
    }
}
