//! Typed view over a collection.

use crate::collection::Collection;
use crate::document::DocumentId;
use crate::error::CoreResult;
use crate::mapper::{DocumentMapper, SerdeMapper};
use crate::options::{RemoveOptions, UpdateOptions};
use crate::query::Filter;
use crate::write_result::WriteResult;
use std::marker::PhantomData;
use std::sync::Arc;

/// A collection read and written as values of `T`.
///
/// ```
/// use docwell_core::{query::field, Database};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Task {
///     title: String,
///     done: bool,
/// }
///
/// let db = Database::new();
/// let tasks = db.repository::<Task>("tasks")?;
/// tasks.insert(&Task { title: "write docs".into(), done: false })?;
///
/// let open = tasks.find(Some(&field("done").eq(false)))?;
/// assert_eq!(open.len(), 1);
/// # Ok::<(), docwell_core::CoreError>(())
/// ```
pub struct Repository<T, M = SerdeMapper> {
    collection: Arc<Collection>,
    mapper: M,
    _marker: PhantomData<fn() -> T>,
}

impl<T, M> Repository<T, M>
where
    M: DocumentMapper<T>,
{
    /// Wraps `collection` with `mapper`.
    pub fn new(collection: Arc<Collection>, mapper: M) -> Self {
        Self {
            collection,
            mapper,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying collection.
    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    /// Returns the mapper's contract version.
    pub fn contract_version(&self) -> u32 {
        M::CONTRACT_VERSION
    }

    /// Inserts one value.
    ///
    /// # Errors
    ///
    /// Fails if mapping fails or the insert is rejected.
    pub fn insert(&self, value: &T) -> CoreResult<WriteResult> {
        let document = self.mapper.to_document(value)?;
        self.collection.insert(std::iter::once(document))
    }

    /// Inserts several values in order.
    ///
    /// # Errors
    ///
    /// Fails if mapping any value fails (nothing is inserted) or an insert
    /// is rejected.
    pub fn insert_all<'a, I>(&self, values: I) -> CoreResult<WriteResult>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let documents = values
            .into_iter()
            .map(|value| self.mapper.to_document(value))
            .collect::<CoreResult<Vec<_>>>()?;
        self.collection.insert(documents)
    }

    /// Merges `value`'s fields into every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Fails if mapping fails or the update is rejected.
    pub fn update(
        &self,
        filter: Option<&Filter>,
        value: &T,
        options: UpdateOptions,
    ) -> CoreResult<WriteResult> {
        let patch = self.mapper.to_document(value)?;
        self.collection.update(filter, &patch, options)
    }

    /// Removes values matching `filter`.
    ///
    /// # Errors
    ///
    /// Fails if the store or index fails.
    pub fn remove(&self, filter: Option<&Filter>, options: RemoveOptions) -> CoreResult<WriteResult> {
        self.collection.remove(filter, options)
    }

    /// Reads every value matching `filter`, in id order.
    ///
    /// # Errors
    ///
    /// Fails if the collection was dropped or a document cannot be mapped.
    pub fn find(&self, filter: Option<&Filter>) -> CoreResult<Vec<T>> {
        self.collection
            .find(filter)?
            .map(|document| self.mapper.from_document(&document?))
            .collect()
    }

    /// Reads one value by id.
    ///
    /// # Errors
    ///
    /// Fails if the collection was dropped or the document cannot be mapped.
    pub fn get_by_id(&self, id: DocumentId) -> CoreResult<Option<T>> {
        self.collection
            .get_by_id(id)?
            .map(|document| self.mapper.from_document(&document))
            .transpose()
    }

    /// Returns the number of stored values.
    pub fn size(&self) -> usize {
        self.collection.size()
    }
}

impl<T, M: std::fmt::Debug> std::fmt::Debug for Repository<T, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection.name())
            .field("mapper", &self.mapper)
            .finish()
    }
}
