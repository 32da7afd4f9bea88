//! Index engine - the in-memory [`IndexManager`].
//!
//! The engine owns one [`FieldIndex`] per indexed field of a collection and
//! keeps them in step with document writes:
//!
//! 1. `register` on insert
//! 2. `reconcile` on update
//! 3. `retract` on remove
//!
//! # Invariants
//!
//! - All unique indexes are checked before any index is modified
//! - A rejected write leaves every index exactly as it was
//! - Missing and `null` field values are not indexed

use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use crate::index::{FieldIndex, IndexKind, IndexManager};
use docwell_codec::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Public description of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    /// Collection the index belongs to.
    pub collection: String,
    /// Indexed field path.
    pub field: String,
    /// Uniqueness.
    pub kind: IndexKind,
    /// Number of indexed documents.
    pub entries: usize,
}

/// In-memory index engine for one collection.
#[derive(Debug)]
pub struct IndexEngine {
    collection: String,
    field_separator: String,
    indexes: RwLock<BTreeMap<String, FieldIndex>>,
}

impl IndexEngine {
    /// Creates an engine with no indexes.
    pub fn new(collection: impl Into<String>, field_separator: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field_separator: field_separator.into(),
            indexes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an index on `field` and fills it from `documents`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the field is already indexed, or
    /// `UniqueConstraintViolation` if `documents` contain a duplicate key
    /// for a unique index (the index is not created).
    pub fn create_index<I>(&self, field: &str, kind: IndexKind, documents: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (DocumentId, Document)>,
    {
        if self.indexes.read().contains_key(field) {
            return Err(CoreError::invalid_operation(format!(
                "index on '{}' already exists in {}",
                field, self.collection
            )));
        }

        let mut index = FieldIndex::new(field, kind);
        for (id, document) in documents {
            if let Some(key) = self.key_for(&document, field) {
                if index.conflicts(&key, id) {
                    return Err(CoreError::unique_violation(&self.collection, field, key));
                }
                index.insert(key, id);
            }
        }

        let mut indexes = self.indexes.write();
        if indexes.contains_key(field) {
            return Err(CoreError::invalid_operation(format!(
                "index on '{}' already exists in {}",
                field, self.collection
            )));
        }
        tracing::debug!(
            collection = %self.collection,
            field,
            %kind,
            entries = index.len(),
            "index created"
        );
        indexes.insert(field.to_string(), index);
        Ok(())
    }

    /// Drops the index on `field`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the field is not indexed.
    pub fn drop_index(&self, field: &str) -> CoreResult<()> {
        match self.indexes.write().remove(field) {
            Some(_) => Ok(()),
            None => Err(CoreError::invalid_operation(format!(
                "no index on '{}' in {}",
                field, self.collection
            ))),
        }
    }

    /// Drops every index.
    pub fn drop_all(&self) {
        self.indexes.write().clear();
    }

    /// Returns true if `field` is indexed.
    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.read().contains_key(field)
    }

    /// Returns the kind of the index on `field`, if any.
    pub fn index_kind(&self, field: &str) -> Option<IndexKind> {
        self.indexes.read().get(field).map(FieldIndex::kind)
    }

    /// Describes every index, ordered by field.
    pub fn indexes(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .read()
            .values()
            .map(|index| IndexDescriptor {
                collection: self.collection.clone(),
                field: index.field().to_string(),
                kind: index.kind(),
                entries: index.len(),
            })
            .collect()
    }

    /// Equality lookup. Returns `None` if `field` is not indexed.
    pub fn lookup(&self, field: &str, key: &Value) -> Option<Vec<DocumentId>> {
        self.indexes.read().get(field).map(|index| index.lookup(key))
    }

    /// Range lookup. Returns `None` if `field` is not indexed.
    pub fn range(
        &self,
        field: &str,
        lower: Bound<&Value>,
        upper: Bound<&Value>,
    ) -> Option<Vec<DocumentId>> {
        self.indexes
            .read()
            .get(field)
            .map(|index| index.range(lower, upper))
    }

    fn key_for(&self, document: &Document, field: &str) -> Option<Value> {
        document
            .get_path(field, &self.field_separator)
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Computes `(field, key)` for every index and checks uniqueness.
    fn planned_keys(
        &self,
        indexes: &BTreeMap<String, FieldIndex>,
        document: &Document,
        id: DocumentId,
    ) -> CoreResult<Vec<(String, Option<Value>)>> {
        let mut planned = Vec::with_capacity(indexes.len());
        for (field, index) in indexes {
            let key = self.key_for(document, field);
            if let Some(key) = &key {
                if index.conflicts(key, id) {
                    tracing::debug!(
                        collection = %self.collection,
                        field = %field,
                        %id,
                        "unique index rejected value"
                    );
                    return Err(CoreError::unique_violation(
                        &self.collection,
                        field.as_str(),
                        key.clone(),
                    ));
                }
            }
            planned.push((field.clone(), key));
        }
        Ok(planned)
    }

    fn apply(
        indexes: &mut BTreeMap<String, FieldIndex>,
        planned: Vec<(String, Option<Value>)>,
        id: DocumentId,
    ) {
        for (field, key) in planned {
            if let Some(index) = indexes.get_mut(&field) {
                match key {
                    Some(key) => index.insert(key, id),
                    None => {
                        index.remove(id);
                    }
                }
            }
        }
    }
}

impl IndexManager for IndexEngine {
    fn register(&self, document: &Document, id: DocumentId) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let planned = self.planned_keys(&indexes, document, id)?;
        Self::apply(&mut indexes, planned, id);
        Ok(())
    }

    fn reconcile(&self, old: &Document, new: &Document, id: DocumentId) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let unchanged = indexes.keys().all(|field| {
            self.key_for(old, field) == self.key_for(new, field)
                && indexes[field].key_of(id).cloned() == self.key_for(new, field)
        });
        if unchanged {
            return Ok(());
        }
        let planned = self.planned_keys(&indexes, new, id)?;
        Self::apply(&mut indexes, planned, id);
        Ok(())
    }

    fn retract(&self, _document: &Document, id: DocumentId) -> CoreResult<()> {
        for index in self.indexes.write().values_mut() {
            index.remove(id);
        }
        Ok(())
    }

    fn entry_count(&self, id: DocumentId) -> usize {
        self.indexes
            .read()
            .values()
            .filter(|index| index.key_of(id).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn id(n: u64) -> DocumentId {
        DocumentId::from_u64(n)
    }

    fn engine() -> IndexEngine {
        let engine = IndexEngine::new("users", ".");
        engine
            .create_index("email", IndexKind::Unique, Vec::new())
            .unwrap();
        engine
            .create_index("city", IndexKind::NonUnique, Vec::new())
            .unwrap();
        engine
    }

    #[test]
    fn register_indexes_all_fields() {
        let engine = engine();
        engine
            .register(&doc! { "email" => "a@x", "city" => "Oslo" }, id(1))
            .unwrap();

        assert_eq!(engine.entry_count(id(1)), 2);
        assert_eq!(engine.lookup("email", &Value::from("a@x")), Some(vec![id(1)]));
        assert_eq!(engine.lookup("city", &Value::from("Oslo")), Some(vec![id(1)]));
        assert_eq!(engine.lookup("name", &Value::from("x")), None);
    }

    #[test]
    fn register_rejects_duplicate_and_changes_nothing() {
        let engine = engine();
        engine
            .register(&doc! { "email" => "a@x", "city" => "Oslo" }, id(1))
            .unwrap();

        let err = engine
            .register(&doc! { "email" => "a@x", "city" => "Rome" }, id(2))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UniqueConstraintViolation { ref field, .. } if field == "email"
        ));

        assert_eq!(engine.entry_count(id(2)), 0);
        assert_eq!(engine.lookup("city", &Value::from("Rome")), Some(vec![]));
    }

    #[test]
    fn missing_and_null_are_not_indexed() {
        let engine = engine();
        engine
            .register(&doc! { "email" => Value::Null }, id(1))
            .unwrap();
        engine
            .register(&doc! { "email" => Value::Null }, id(2))
            .unwrap();
        assert_eq!(engine.entry_count(id(1)), 0);
        assert_eq!(engine.entry_count(id(2)), 0);
    }

    #[test]
    fn reconcile_moves_entries() {
        let engine = engine();
        let old = doc! { "email" => "a@x", "city" => "Oslo" };
        let new = doc! { "email" => "b@x", "city" => "Oslo" };
        engine.register(&old, id(1)).unwrap();
        engine.reconcile(&old, &new, id(1)).unwrap();

        assert_eq!(engine.lookup("email", &Value::from("a@x")), Some(vec![]));
        assert_eq!(engine.lookup("email", &Value::from("b@x")), Some(vec![id(1)]));
    }

    #[test]
    fn reconcile_dropping_field_removes_entry() {
        let engine = engine();
        let old = doc! { "email" => "a@x", "city" => "Oslo" };
        let new = doc! { "email" => "a@x" };
        engine.register(&old, id(1)).unwrap();
        engine.reconcile(&old, &new, id(1)).unwrap();

        assert_eq!(engine.entry_count(id(1)), 1);
        assert_eq!(engine.lookup("city", &Value::from("Oslo")), Some(vec![]));
    }

    #[test]
    fn reconcile_violation_keeps_old_state() {
        let engine = engine();
        engine.register(&doc! { "email" => "a@x" }, id(1)).unwrap();
        let old = doc! { "email" => "b@x", "city" => "Oslo" };
        engine.register(&old, id(2)).unwrap();

        let new = doc! { "email" => "a@x", "city" => "Rome" };
        assert!(engine.reconcile(&old, &new, id(2)).is_err());

        assert_eq!(engine.lookup("email", &Value::from("b@x")), Some(vec![id(2)]));
        assert_eq!(engine.lookup("city", &Value::from("Oslo")), Some(vec![id(2)]));
        assert_eq!(engine.lookup("city", &Value::from("Rome")), Some(vec![]));
    }

    #[test]
    fn retract_is_idempotent() {
        let engine = engine();
        let d = doc! { "email" => "a@x", "city" => "Oslo" };
        engine.register(&d, id(1)).unwrap();

        engine.retract(&d, id(1)).unwrap();
        engine.retract(&d, id(1)).unwrap();
        engine.retract(&d, id(99)).unwrap();
        assert_eq!(engine.entry_count(id(1)), 0);
    }

    #[test]
    fn create_index_over_existing_documents() {
        let engine = IndexEngine::new("users", ".");
        let docs = vec![
            (id(1), doc! { "email" => "a@x" }),
            (id(2), doc! { "email" => "a@x" }),
        ];

        assert!(engine
            .create_index("email", IndexKind::NonUnique, docs.clone())
            .is_ok());
        engine.drop_index("email").unwrap();

        let err = engine
            .create_index("email", IndexKind::Unique, docs)
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueConstraintViolation { .. }));
        assert!(!engine.has_index("email"));
    }

    #[test]
    fn duplicate_and_missing_index_management() {
        let engine = engine();
        assert!(engine
            .create_index("email", IndexKind::NonUnique, Vec::new())
            .is_err());
        assert!(engine.drop_index("nope").is_err());
        assert_eq!(engine.index_kind("email"), Some(IndexKind::Unique));

        let fields: Vec<_> = engine.indexes().into_iter().map(|d| d.field).collect();
        assert_eq!(fields, vec!["city", "email"]);
    }

    #[test]
    fn nested_field_uses_separator() {
        let engine = IndexEngine::new("users", "/");
        engine
            .create_index("address/city", IndexKind::NonUnique, Vec::new())
            .unwrap();
        let d = doc! { "address" => Value::map(vec![("city", Value::from("Oslo"))]) };
        engine.register(&d, id(1)).unwrap();

        assert_eq!(
            engine.lookup("address/city", &Value::from("Oslo")),
            Some(vec![id(1)])
        );
    }
}
