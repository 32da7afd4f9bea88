//! Ordered single-field index.

use crate::document::DocumentId;
use crate::index::IndexKind;
use docwell_codec::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

/// Ordered index over one (possibly nested) field.
///
/// `FieldIndex` supports:
/// - Equality lookups
/// - Range queries
/// - Reverse lookup from document id to its indexed value
///
/// Each document contributes at most one key. Arrays and maps are indexed
/// as whole values.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    field: String,
    kind: IndexKind,
    /// Ordered key to document ids mapping.
    entries: BTreeMap<Value, BTreeSet<DocumentId>>,
    /// Document id to the key it is indexed under.
    by_id: HashMap<DocumentId, Value>,
}

impl FieldIndex {
    /// Creates an empty index on `field`.
    pub fn new(field: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            field: field.into(),
            kind,
            entries: BTreeMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Returns the indexed field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the index kind.
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns true if this index rejects duplicate keys.
    pub fn is_unique(&self) -> bool {
        self.kind == IndexKind::Unique
    }

    /// Returns true if inserting `key` for `id` would break uniqueness.
    pub fn conflicts(&self, key: &Value, id: DocumentId) -> bool {
        self.is_unique()
            && self
                .entries
                .get(key)
                .is_some_and(|holders| holders.iter().any(|holder| *holder != id))
    }

    /// Indexes `id` under `key`, replacing any previous key for `id`.
    ///
    /// Uniqueness is not checked here; callers check [`conflicts`](Self::conflicts)
    /// first so a multi-index write can be validated before anything changes.
    pub fn insert(&mut self, key: Value, id: DocumentId) {
        self.remove(id);
        self.entries.entry(key.clone()).or_default().insert(id);
        self.by_id.insert(id, key);
    }

    /// Removes the entry for `id`. Returns true if one existed.
    pub fn remove(&mut self, id: DocumentId) -> bool {
        let Some(key) = self.by_id.remove(&id) else {
            return false;
        };
        if let Some(set) = self.entries.get_mut(&key) {
            set.remove(&id);
            if set.is_empty() {
                self.entries.remove(&key);
            }
        }
        true
    }

    /// Returns the key `id` is indexed under.
    pub fn key_of(&self, id: DocumentId) -> Option<&Value> {
        self.by_id.get(&id)
    }

    /// Looks up documents by exact key, in id order.
    pub fn lookup(&self, key: &Value) -> Vec<DocumentId> {
        self.entries
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns documents with keys in the given bounds, in key order.
    pub fn range(&self, lower: Bound<&Value>, upper: Bound<&Value>) -> Vec<DocumentId> {
        if is_empty_range(lower, upper) {
            return Vec::new();
        }
        self.entries
            .range::<Value, _>((lower, upper))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Returns the number of indexed documents.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the number of distinct keys.
    pub fn distinct_keys(&self) -> usize {
        self.entries.len()
    }

    /// Clears the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
    }
}

/// `BTreeMap::range` panics on inverted bounds, so those are answered early.
fn is_empty_range(lower: Bound<&Value>, upper: Bound<&Value>) -> bool {
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (
            Bound::Included(lo) | Bound::Excluded(lo),
            Bound::Included(hi) | Bound::Excluded(hi),
        ) => lo >= hi,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> DocumentId {
        DocumentId::from_u64(n)
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = FieldIndex::new("name", IndexKind::NonUnique);
        index.insert(Value::from("ada"), id(1));
        index.insert(Value::from("ada"), id(2));

        assert_eq!(index.lookup(&Value::from("ada")), vec![id(1), id(2)]);
        assert!(index.lookup(&Value::from("bob")).is_empty());
        assert_eq!(index.len(), 2);
        assert_eq!(index.distinct_keys(), 1);
    }

    #[test]
    fn reinsert_moves_key() {
        let mut index = FieldIndex::new("name", IndexKind::NonUnique);
        index.insert(Value::from("old"), id(1));
        index.insert(Value::from("new"), id(1));

        assert!(index.lookup(&Value::from("old")).is_empty());
        assert_eq!(index.key_of(id(1)), Some(&Value::from("new")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn unique_conflicts() {
        let mut index = FieldIndex::new("email", IndexKind::Unique);
        index.insert(Value::from("a@x"), id(1));

        assert!(index.conflicts(&Value::from("a@x"), id(2)));
        assert!(!index.conflicts(&Value::from("a@x"), id(1)));
        assert!(!index.conflicts(&Value::from("b@x"), id(2)));
    }

    #[test]
    fn non_unique_never_conflicts() {
        let mut index = FieldIndex::new("city", IndexKind::NonUnique);
        index.insert(Value::from("Oslo"), id(1));
        assert!(!index.conflicts(&Value::from("Oslo"), id(2)));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut index = FieldIndex::new("name", IndexKind::NonUnique);
        index.insert(Value::from("x"), id(1));
        assert!(index.remove(id(1)));
        assert!(!index.remove(id(1)));
        assert!(index.is_empty());
        assert_eq!(index.distinct_keys(), 0);
    }

    #[test]
    fn range_queries() {
        let mut index = FieldIndex::new("age", IndexKind::NonUnique);
        for (n, age) in [(1, 20), (2, 30), (3, 40), (4, 50)] {
            index.insert(Value::Integer(age), id(n));
        }

        let ge_30 = index.range(Bound::Included(&Value::Integer(30)), Bound::Unbounded);
        assert_eq!(ge_30, vec![id(2), id(3), id(4)]);

        let between = index.range(
            Bound::Excluded(&Value::Integer(20)),
            Bound::Excluded(&Value::Integer(50)),
        );
        assert_eq!(between, vec![id(2), id(3)]);

        let inverted = index.range(
            Bound::Included(&Value::Integer(50)),
            Bound::Included(&Value::Integer(20)),
        );
        assert!(inverted.is_empty());

        let empty_exclusive = index.range(
            Bound::Excluded(&Value::Integer(30)),
            Bound::Excluded(&Value::Integer(30)),
        );
        assert!(empty_exclusive.is_empty());
    }
}
