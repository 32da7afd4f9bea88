//! Collection facade.

use crate::config::Config;
use crate::coordinator::WriteCoordinator;
use crate::document::{Document, DocumentId, IdGenerator};
use crate::error::{CoreError, CoreResult};
use crate::events::{ChangeNotifier, Subscription};
use crate::index::{IndexDescriptor, IndexEngine, IndexKind, IndexManager};
use crate::options::{RemoveOptions, UpdateOptions};
use crate::query::{CollectionResolver, Cursor, Filter, QueryResolver};
use crate::store::{InMemoryStore, PrimaryStore};
use crate::write_result::WriteResult;
use std::sync::Arc;

/// A named set of documents with its indexes and change notifier.
///
/// Obtain collections through [`Database::collection`](crate::Database::collection).
///
/// ```
/// use docwell_core::{doc, query::field, Database, IndexKind, UpdateOptions};
///
/// let db = Database::new();
/// let users = db.collection("users")?;
/// users.create_index("email", IndexKind::Unique)?;
///
/// users.insert(vec![doc! { "email" => "ada@example.com", "age" => 36 }])?;
/// users.update(
///     Some(&field("email").eq("ada@example.com")),
///     &doc! { "age" => 37 },
///     UpdateOptions::default(),
/// )?;
///
/// let ada = users.find(Some(&field("age").gt(30)))?.first()?.unwrap();
/// assert_eq!(ada.revision(), 2);
/// # Ok::<(), docwell_core::CoreError>(())
/// ```
pub struct Collection {
    name: String,
    config: Arc<Config>,
    store: Arc<InMemoryStore>,
    indexes: Arc<IndexEngine>,
    resolver: Arc<CollectionResolver>,
    coordinator: WriteCoordinator,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>, config: Arc<Config>) -> Self {
        let name = name.into();
        let store = Arc::new(InMemoryStore::new(name.clone()));
        let indexes = Arc::new(IndexEngine::new(name.clone(), config.field_separator.clone()));
        let resolver = Arc::new(CollectionResolver::new(
            Arc::clone(&store) as Arc<dyn PrimaryStore>,
            Arc::clone(&indexes),
            config.field_separator.clone(),
        ));

        let mut coordinator = WriteCoordinator::new(
            Arc::clone(&store) as Arc<dyn PrimaryStore>,
            Arc::clone(&indexes) as Arc<dyn IndexManager>,
            Arc::clone(&resolver) as Arc<dyn QueryResolver>,
        )
        .with_id_generator(Arc::new(IdGenerator::new(config.node_id)));
        if config.notifications {
            coordinator = coordinator.with_notifier(ChangeNotifier::new());
        }

        Self {
            name,
            config,
            store,
            indexes,
            resolver,
            coordinator,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration this collection was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Inserts documents. See [`WriteCoordinator::insert`].
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids, unique index violations or malformed ids.
    pub fn insert<I>(&self, documents: I) -> CoreResult<WriteResult>
    where
        I: IntoIterator<Item = Document>,
    {
        self.coordinator.insert(documents)
    }

    /// Updates documents matching `filter`. See [`WriteCoordinator::update`].
    ///
    /// # Errors
    ///
    /// Fails on `just_once` with several matches or unique index violations.
    pub fn update(
        &self,
        filter: Option<&Filter>,
        patch: &Document,
        options: UpdateOptions,
    ) -> CoreResult<WriteResult> {
        self.coordinator.update(filter, patch, options)
    }

    /// Updates the stored document with `document`'s id.
    ///
    /// With `upsert`, a document that is not stored yet (or has no id) is
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `document` has no id and `upsert` is
    /// off, plus any error of [`update`](Self::update).
    pub fn update_document(&self, document: &Document, upsert: bool) -> CoreResult<WriteResult> {
        match document.id() {
            Some(id) => self.update(
                Some(&Filter::by_id(id)),
                document,
                UpdateOptions::new().just_once(true).upsert(upsert),
            ),
            None if upsert => self.insert(std::iter::once(document.clone())),
            None => Err(CoreError::invalid_operation(format!(
                "document has no id, cannot update it in {}",
                self.name
            ))),
        }
    }

    /// Removes documents matching `filter`. See [`WriteCoordinator::remove`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store or index fails.
    pub fn remove(&self, filter: Option<&Filter>, options: RemoveOptions) -> CoreResult<WriteResult> {
        self.coordinator.remove(filter, options)
    }

    /// Removes the stored document with `document`'s id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `document` has no id.
    pub fn remove_document(&self, document: &Document) -> CoreResult<WriteResult> {
        let id = document.id().ok_or_else(|| {
            CoreError::invalid_operation(format!(
                "document has no id, cannot remove it from {}",
                self.name
            ))
        })?;
        self.remove(Some(&Filter::by_id(id)), RemoveOptions::new().just_one(true))
    }

    /// Returns a cursor over documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreDropped` once the collection has been dropped.
    pub fn find(&self, filter: Option<&Filter>) -> CoreResult<Cursor> {
        self.resolver
            .resolve(filter)?
            .ok_or_else(|| CoreError::store_dropped(&self.name))
    }

    /// Reads one document by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreDropped` once the collection has been dropped.
    pub fn get_by_id(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        self.store.get(id)
    }

    /// Returns the number of stored documents.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Indexes `field` (a path joined by the field separator), filling the
    /// index from the documents already stored.
    ///
    /// # Errors
    ///
    /// Fails if the field is already indexed, or if `kind` is unique and
    /// stored documents share a value.
    pub fn create_index(&self, field: &str, kind: IndexKind) -> CoreResult<()> {
        self.coordinator.serialized(|| {
            let documents = self.store.snapshot();
            self.indexes.create_index(field, kind, documents)
        })
    }

    /// Drops the index on `field`.
    ///
    /// # Errors
    ///
    /// Fails if the field is not indexed.
    pub fn drop_index(&self, field: &str) -> CoreResult<()> {
        self.coordinator.serialized(|| self.indexes.drop_index(field))
    }

    /// Returns true if `field` is indexed.
    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.has_index(field)
    }

    /// Lists the collection's indexes.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.indexes.indexes()
    }

    /// Subscribes to this collection's change batches.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if notifications are disabled in the
    /// configuration.
    pub fn subscribe(&self) -> CoreResult<Subscription> {
        self.coordinator
            .notifier()
            .map(ChangeNotifier::subscribe)
            .ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "change notifications are disabled for {}",
                    self.name
                ))
            })
    }

    /// Discards every document and index. The collection is unusable
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StoreDropped` if the collection was already dropped.
    pub fn destroy(&self) -> CoreResult<()> {
        self.coordinator.serialized(|| {
            self.store.drop_store()?;
            self.indexes.drop_all();
            tracing::debug!(collection = %self.name, "collection dropped");
            Ok(())
        })
    }

    /// Returns true once the collection has been dropped.
    pub fn is_dropped(&self) -> bool {
        self.store.is_dropped()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("size", &self.store.len())
            .field("indexes", &self.indexes.indexes().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::query::field;

    fn collection() -> Collection {
        Collection::new("users", Arc::new(Config::default()))
    }

    #[test]
    fn update_document_by_own_id() {
        let users = collection();
        let id = users
            .insert(vec![doc! { "name" => "Ada" }])
            .unwrap()
            .first()
            .unwrap();

        let mut changed = users.get_by_id(id).unwrap().unwrap();
        changed.put("name", "Grace");
        let result = users.update_document(&changed, false).unwrap();

        assert_eq!(result.ids(), &[id]);
        let stored = users.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.get("name"), Some(&"Grace".into()));
        assert_eq!(stored.revision(), 2);
    }

    #[test]
    fn update_document_without_id() {
        let users = collection();
        let err = users.update_document(&doc! { "name" => "x" }, false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));

        let inserted = users.update_document(&doc! { "name" => "x" }, true).unwrap();
        assert_eq!(inserted.affected_count(), 1);
        assert_eq!(users.size(), 1);
    }

    #[test]
    fn remove_document_by_own_id() {
        let users = collection();
        users
            .insert(vec![doc! { "n" => 1 }, doc! { "n" => 2 }])
            .unwrap();
        let first = users.find(None).unwrap().first().unwrap().unwrap();

        users.remove_document(&first).unwrap();
        assert_eq!(users.size(), 1);
        assert!(users.get_by_id(first.id().unwrap()).unwrap().is_none());
    }

    #[test]
    fn create_index_over_existing_documents() {
        let users = collection();
        users
            .insert(vec![doc! { "email" => "a" }, doc! { "email" => "a" }])
            .unwrap();

        let err = users.create_index("email", IndexKind::Unique).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(!users.has_index("email"));

        users.create_index("email", IndexKind::NonUnique).unwrap();
        assert_eq!(users.list_indexes()[0].entries, 2);
        assert_eq!(users.find(Some(&field("email").eq("a"))).unwrap().size(), 2);

        users.drop_index("email").unwrap();
        assert!(users.list_indexes().is_empty());
    }

    #[test]
    fn notifications_can_be_disabled() {
        let quiet = Collection::new("q", Arc::new(Config::new().notifications(false)));
        assert!(quiet.subscribe().is_err());
        quiet.insert(vec![doc! { "n" => 1 }]).unwrap();
        assert_eq!(quiet.size(), 1);
    }

    #[test]
    fn dropped_collection_rejects_use() {
        let users = collection();
        users.create_index("n", IndexKind::NonUnique).unwrap();
        users.insert(vec![doc! { "n" => 1 }]).unwrap();

        users.destroy().unwrap();
        assert!(users.is_dropped());
        assert!(matches!(
            users.find(None).unwrap_err(),
            CoreError::StoreDropped { .. }
        ));
        assert!(users.list_indexes().is_empty());
        assert!(users.insert(vec![doc! { "n" => 2 }]).is_err());
        assert!(users.remove(None, RemoveOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn custom_field_separator_for_nested_paths() {
        let users = Collection::new("u", Arc::new(Config::new().field_separator("/")));
        users.create_index("address/city", IndexKind::NonUnique).unwrap();
        let address = docwell_codec::Value::map(vec![("city", "Oslo".into())]);
        users.insert(vec![doc! { "address" => address }]).unwrap();

        let hits = users.find(Some(&field("address/city").eq("Oslo"))).unwrap();
        assert_eq!(hits.size(), 1);
    }
}
