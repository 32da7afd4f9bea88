//! Write coordinator: insert, update and remove for one collection.
//!
//! The coordinator drives the collaborators of a collection in a fixed
//! order for every affected document:
//!
//! 1. resolve the affected set (update/remove) through the [`QueryResolver`]
//! 2. enter the collection's critical section
//! 3. mutate the [`PrimaryStore`]
//! 4. bring the indexes in line through the [`IndexManager`], undoing the
//!    store mutation if the index rejects it
//! 5. record a [`ChangeRecord`]
//!
//! After the call, the records are posted as one [`ChangeBatch`]. A failure
//! part-way through a call leaves earlier documents committed; their records
//! are still posted before the error is returned.
//!
//! # Reserved fields
//!
//! The coordinator owns `_id`, `_revision` and `_modified`. Documents
//! carrying `_source = "replicator"` are replicator-origin: their revision
//! and timestamp are taken as given. The marker itself is never stored.
//!
//! [`ChangeBatch`]: crate::events::ChangeBatch

use crate::clock::MonotonicClock;
use crate::document::{Document, DocumentId, IdGenerator, DOC_ID, DOC_REVISION};
use crate::error::{CoreError, CoreResult};
use crate::events::{ChangeNotifier, ChangeRecord, ChangeType};
use crate::index::IndexManager;
use crate::options::{RemoveOptions, UpdateOptions};
use crate::query::{Filter, QueryResolver};
use crate::store::PrimaryStore;
use crate::write_result::WriteResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Orchestrates writes against one collection.
pub struct WriteCoordinator {
    collection: String,
    store: Arc<dyn PrimaryStore>,
    indexes: Arc<dyn IndexManager>,
    resolver: Arc<dyn QueryResolver>,
    notifier: Option<ChangeNotifier>,
    ids: Arc<IdGenerator>,
    clock: MonotonicClock,
    lock: Mutex<()>,
}

impl WriteCoordinator {
    /// Creates a coordinator without change notification.
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        indexes: Arc<dyn IndexManager>,
        resolver: Arc<dyn QueryResolver>,
    ) -> Self {
        Self {
            collection: store.name().to_string(),
            store,
            indexes,
            resolver,
            notifier: None,
            ids: Arc::new(IdGenerator::default()),
            clock: MonotonicClock::new(),
            lock: Mutex::new(()),
        }
    }

    /// Posts change batches to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Draws fresh identifiers from `ids`.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the change notifier, if notification is enabled.
    pub fn notifier(&self) -> Option<&ChangeNotifier> {
        self.notifier.as_ref()
    }

    /// Runs `f` inside the collection's critical section.
    pub(crate) fn serialized<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock();
        f()
    }

    /// Inserts documents in input order.
    ///
    /// Documents without `_id` get a fresh identifier. Non-replicated
    /// documents get revision 1 and the current time.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidId`] if a document has a malformed `_id`
    /// - [`CoreError::DuplicateId`] if the id is already stored; the stored
    ///   document is left untouched
    /// - [`CoreError::UniqueConstraintViolation`] if a unique index rejects
    ///   the document; the document is not stored
    ///
    /// Documents before the failing one stay inserted and are notified.
    pub fn insert<I>(&self, documents: I) -> CoreResult<WriteResult>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut result = WriteResult::new();
        let mut records = Vec::new();

        let outcome = documents.into_iter().try_for_each(|document| {
            let record = self.insert_one(document)?;
            if let Some(id) = record.document.id() {
                result.push(id);
            }
            records.push(record);
            Ok(())
        });

        tracing::debug!(
            collection = %self.collection,
            inserted = records.len(),
            failed = outcome.is_err(),
            "insert finished"
        );
        self.notify(ChangeType::Insert, records);
        outcome.map(|()| result)
    }

    fn insert_one(&self, mut document: Document) -> CoreResult<ChangeRecord> {
        let id = document.ensure_id(&self.ids)?;
        let replicated = document.is_replicated();
        document.strip_source();

        let now = self.clock.now();
        if !replicated {
            document.set_revision(1);
            document.set_modified(now);
        }

        let _guard = self.lock.lock();

        if self.store.put_if_absent(id, document.clone())?.is_some() {
            tracing::debug!(collection = %self.collection, %id, "insert rejected, id exists");
            return Err(CoreError::duplicate_id(&self.collection, id));
        }

        if let Err(err) = self.indexes.register(&document, id) {
            tracing::debug!(collection = %self.collection, %id, error = %err, "index rejected insert, rolling back");
            if let Err(rollback) = self.store.remove(id) {
                tracing::warn!(collection = %self.collection, %id, error = %rollback, "insert rollback failed");
            }
            return Err(err);
        }

        let timestamp = document.modified().unwrap_or(now);
        Ok(ChangeRecord::new(document, ChangeType::Insert, timestamp))
    }

    /// Merges `patch` into every document matching `filter`.
    ///
    /// An absent filter matches the whole collection. `_id` is never
    /// changed; `_revision` is only taken from replicator-origin patches.
    /// When nothing matches and `options.upsert` is set, the patch is
    /// inserted instead. A patch with nothing left to apply after dropping
    /// reserved fields changes nothing and notifies nobody.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidOperation`] if `options.just_once` is set and
    ///   more than one document matches; nothing is changed
    /// - [`CoreError::UniqueConstraintViolation`] if a unique index rejects
    ///   an updated document; that document is restored
    ///
    /// Documents updated before a failure stay updated and are notified.
    pub fn update(
        &self,
        filter: Option<&Filter>,
        patch: &Document,
        options: UpdateOptions,
    ) -> CoreResult<WriteResult> {
        let Some(cursor) = self.resolver.resolve(filter)? else {
            return Ok(WriteResult::new());
        };

        if cursor.is_empty() {
            if options.upsert {
                tracing::debug!(collection = %self.collection, "no match, upserting");
                return self.insert(std::iter::once(patch.clone()));
            }
            return Ok(WriteResult::new());
        }

        if options.just_once && cursor.size() > 1 {
            return Err(CoreError::invalid_operation(format!(
                "update with just_once matched {} documents in {}",
                cursor.size(),
                self.collection
            )));
        }

        let replicated = patch.is_replicated();
        let mut changes = patch.clone();
        changes.remove(DOC_ID);
        if !replicated {
            changes.remove(DOC_REVISION);
        }
        changes.strip_source();

        if changes.is_empty() {
            tracing::debug!(collection = %self.collection, "patch has no applicable fields");
            return Ok(WriteResult::new());
        }

        tracing::debug!(
            collection = %self.collection,
            matched = cursor.size(),
            replicated,
            "updating"
        );

        let mut result = WriteResult::new();
        let mut records = Vec::new();
        let outcome = cursor.ids().iter().try_for_each(|&id| {
            if let Some(record) = self.update_one(id, &changes, replicated)? {
                result.push(id);
                records.push(record);
            }
            Ok(())
        });

        self.notify(ChangeType::Update, records);
        outcome.map(|()| result)
    }

    fn update_one(
        &self,
        id: DocumentId,
        changes: &Document,
        replicated: bool,
    ) -> CoreResult<Option<ChangeRecord>> {
        let _guard = self.lock.lock();

        let Some(current) = self.store.get(id)? else {
            tracing::trace!(collection = %self.collection, %id, "matched document gone, skipping");
            return Ok(None);
        };

        let mut updated = current.clone();
        updated.merge(changes);
        let now = self.clock.now();
        if !replicated {
            updated.set_revision(current.revision() + 1);
            updated.set_modified(now);
        }

        self.store.put(id, updated.clone())?;

        if let Err(err) = self.indexes.reconcile(&current, &updated, id) {
            tracing::debug!(collection = %self.collection, %id, error = %err, "index rejected update, restoring");
            if let Err(restore) = self.store.put(id, current) {
                tracing::warn!(collection = %self.collection, %id, error = %restore, "update restore failed");
            }
            return Err(err);
        }

        let timestamp = updated.modified().unwrap_or(now);
        Ok(Some(ChangeRecord::new(updated, ChangeType::Update, timestamp)))
    }

    /// Removes documents matching `filter`.
    ///
    /// The whole call runs in one critical section. With
    /// `options.just_one`, only the first matched document still present is
    /// removed. If the resolver cannot produce a cursor at all, nothing
    /// happens and the result is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or index fails; documents removed
    /// before the failure stay removed and are notified.
    pub fn remove(&self, filter: Option<&Filter>, options: RemoveOptions) -> CoreResult<WriteResult> {
        let Some(cursor) = self.resolver.resolve(filter)? else {
            tracing::debug!(collection = %self.collection, "no cursor, nothing to remove");
            return Ok(WriteResult::new());
        };

        let mut result = WriteResult::new();
        let mut records = Vec::new();
        let outcome = {
            let _guard = self.lock.lock();
            let mut outcome = Ok(());
            for &id in cursor.ids() {
                match self.remove_one(id) {
                    Ok(Some(record)) => {
                        result.push(id);
                        records.push(record);
                        if options.just_one {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        outcome = Err(err);
                        break;
                    }
                }
            }
            outcome
        };

        tracing::debug!(
            collection = %self.collection,
            matched = cursor.size(),
            removed = records.len(),
            "remove finished"
        );
        self.notify(ChangeType::Remove, records);
        outcome.map(|()| result)
    }

    /// Caller holds the collection lock.
    fn remove_one(&self, id: DocumentId) -> CoreResult<Option<ChangeRecord>> {
        let Some(document) = self.store.get(id)? else {
            return Ok(None);
        };

        self.indexes.retract(&document, id)?;
        let mut removed = self.store.remove(id)?;

        let now = self.clock.now();
        removed.set_revision(removed.revision() + 1);
        removed.set_modified(now);
        Ok(Some(ChangeRecord::new(removed, ChangeType::Remove, now)))
    }

    fn notify(&self, change_type: ChangeType, records: Vec<ChangeRecord>) {
        if let Some(notifier) = &self.notifier {
            notifier.post(&self.collection, change_type, records);
        }
    }
}

impl std::fmt::Debug for WriteCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteCoordinator")
            .field("collection", &self.collection)
            .field("notifications", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}
