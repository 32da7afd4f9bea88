//! Documents and their identifiers.
//!
//! A [`Document`] is an ordered map from field name to [`Value`]. Four
//! field names are reserved and managed by the write path:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `_id` | identifier, immutable once assigned |
//! | `_revision` | version counter, starts at 1 |
//! | `_modified` | last mutation time (ms since Unix epoch) |
//! | `_source` | transient replication marker, never persisted |

mod id;

pub use id::{DocumentId, IdGenerator};

use crate::error::{CoreError, CoreResult};
use docwell_codec::Value;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Identifier field.
pub const DOC_ID: &str = "_id";
/// Revision field.
pub const DOC_REVISION: &str = "_revision";
/// Last-modified timestamp field.
pub const DOC_MODIFIED: &str = "_modified";
/// Transient origin marker field.
pub const DOC_SOURCE: &str = "_source";
/// Value of [`DOC_SOURCE`] marking a replicator-origin write.
pub const REPLICATOR: &str = "replicator";
/// All reserved field names.
pub const RESERVED_FIELDS: [&str; 4] = [DOC_ID, DOC_REVISION, DOC_MODIFIED, DOC_SOURCE];

/// Builds a [`Document`] from `key => value` pairs.
///
/// ```
/// use docwell_core::doc;
///
/// let d = doc! { "name" => "Ada", "age" => 36 };
/// assert_eq!(d.len(), 2);
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut document = $crate::Document::new();
        $( document.put($key, $value); )+
        document
    }};
}

/// A schemaless record: field names mapped to values, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style [`put`](Self::put).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(key, value);
        self
    }

    /// Returns a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a possibly nested field, splitting `path` on `separator`.
    pub fn get_path(&self, path: &str, separator: &str) -> Option<&Value> {
        if separator.is_empty() || !path.contains(separator) {
            return self.fields.get(path);
        }
        let mut segments = path.split(separator);
        let head = segments.next()?;
        self.fields.get(head)?.get_path(segments)
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Returns true if the field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Iterates over field names in order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.fields.keys()
    }

    /// Copies every field of `patch` into this document, overwriting on
    /// key collision. Fields absent from `patch` are left untouched.
    pub fn merge(&mut self, patch: &Document) {
        for (key, value) in &patch.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns the document's identifier, if it has a valid one.
    pub fn id(&self) -> Option<DocumentId> {
        self.fields.get(DOC_ID).and_then(DocumentId::from_value)
    }

    /// Sets the identifier.
    pub fn set_id(&mut self, id: DocumentId) {
        self.fields.insert(DOC_ID.to_string(), id.to_value());
    }

    /// Returns the identifier, assigning a fresh one if none is present.
    ///
    /// An existing `_id` is rewritten in canonical decimal text form, so
    /// `42` and `"007"` are stored as `"42"` and `"7"`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if `_id` is present but malformed.
    pub fn ensure_id(&mut self, generator: &IdGenerator) -> CoreResult<DocumentId> {
        let id = match self.fields.get(DOC_ID) {
            Some(value) => DocumentId::from_value(value).ok_or_else(|| CoreError::InvalidId {
                value: value.clone(),
            })?,
            None => generator.next_id(),
        };
        self.set_id(id);
        Ok(id)
    }

    /// Returns the revision, or 0 if the document was never persisted.
    pub fn revision(&self) -> i64 {
        self.fields
            .get(DOC_REVISION)
            .and_then(Value::as_integer)
            .unwrap_or(0)
    }

    /// Sets the revision.
    pub fn set_revision(&mut self, revision: i64) {
        self.fields
            .insert(DOC_REVISION.to_string(), Value::Integer(revision));
    }

    /// Returns the last-modified timestamp in milliseconds.
    pub fn modified(&self) -> Option<i64> {
        self.fields.get(DOC_MODIFIED).and_then(Value::as_integer)
    }

    /// Sets the last-modified timestamp in milliseconds.
    pub fn set_modified(&mut self, millis: i64) {
        self.fields
            .insert(DOC_MODIFIED.to_string(), Value::Integer(millis));
    }

    /// Returns the origin marker, if present.
    pub fn source(&self) -> Option<&str> {
        self.fields.get(DOC_SOURCE).and_then(Value::as_text)
    }

    /// Marks this document as coming from a replicator.
    pub fn mark_replicated(&mut self) {
        self.fields
            .insert(DOC_SOURCE.to_string(), Value::from(REPLICATOR));
    }

    /// Returns true if the document carries the replicator marker.
    pub fn is_replicated(&self) -> bool {
        self.source() == Some(REPLICATOR)
    }

    /// Removes the origin marker.
    pub fn strip_source(&mut self) {
        self.fields.remove(DOC_SOURCE);
    }

    /// Returns true if `key` is one of the reserved field names.
    pub fn is_reserved(key: &str) -> bool {
        RESERVED_FIELDS.contains(&key)
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Map(document.fields)
    }
}

impl TryFrom<Value> for Document {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(CoreError::Codec(docwell_codec::CodecError::invalid_structure(
                format!("expected map for document, found {}", other.type_name()),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let mut d = Document::new();
        assert!(d.put("name", "Ada").is_none());
        assert_eq!(d.put("name", "Grace"), Some(Value::from("Ada")));
        assert_eq!(d.get("name"), Some(&Value::from("Grace")));
        assert_eq!(d.remove("name"), Some(Value::from("Grace")));
        assert!(d.is_empty());
    }

    #[test]
    fn nested_path() {
        let d = doc! {
            "address" => Value::map(vec![("city", Value::from("Oslo"))]),
            "plain.key" => 1,
        };

        assert_eq!(d.get_path("address.city", "."), Some(&Value::from("Oslo")));
        assert_eq!(d.get_path("address:city", ":"), Some(&Value::from("Oslo")));
        assert_eq!(d.get_path("address.zip", "."), None);
        assert_eq!(d.get_path("plain.key", ""), Some(&Value::Integer(1)));
    }

    #[test]
    fn merge_overwrites_and_keeps_others() {
        let mut d = doc! { "a" => 1, "b" => 2 };
        d.merge(&doc! { "b" => 20, "c" => 30 });
        assert_eq!(d, doc! { "a" => 1, "b" => 20, "c" => 30 });
    }

    #[test]
    fn ensure_id_assigns_once() {
        let generator = IdGenerator::default();
        let mut d = Document::new();
        let first = d.ensure_id(&generator).unwrap();
        let second = d.ensure_id(&generator).unwrap();
        assert_eq!(first, second);
        assert_eq!(d.id(), Some(first));
    }

    #[test]
    fn ensure_id_canonicalises_existing_id() {
        let generator = IdGenerator::default();

        let mut d = doc! { DOC_ID => 42i64 };
        assert_eq!(d.ensure_id(&generator).unwrap(), DocumentId::from_u64(42));
        assert_eq!(d.get(DOC_ID), Some(&Value::Text("42".into())));

        let mut d = doc! { DOC_ID => "007" };
        assert_eq!(d.ensure_id(&generator).unwrap(), DocumentId::from_u64(7));
        assert_eq!(d.get(DOC_ID), Some(&Value::Text("7".into())));
    }

    #[test]
    fn ensure_id_rejects_malformed() {
        let mut d = doc! { DOC_ID => "not-a-number" };
        let err = d.ensure_id(&IdGenerator::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidId { .. }));
    }

    #[test]
    fn metadata_accessors() {
        let mut d = Document::new();
        assert_eq!(d.revision(), 0);
        assert_eq!(d.modified(), None);
        assert!(!d.is_replicated());

        d.set_revision(3);
        d.set_modified(1_000);
        d.mark_replicated();
        assert_eq!(d.revision(), 3);
        assert_eq!(d.modified(), Some(1_000));
        assert!(d.is_replicated());

        d.strip_source();
        assert!(!d.is_replicated());
        assert!(!d.contains_key(DOC_SOURCE));
    }

    #[test]
    fn value_conversion() {
        let d = doc! { "x" => 1 };
        let value = Value::from(d.clone());
        assert_eq!(Document::try_from(value).unwrap(), d);
        assert!(Document::try_from(Value::Integer(1)).is_err());
    }

    #[test]
    fn reserved_names() {
        assert!(Document::is_reserved("_id"));
        assert!(Document::is_reserved("_source"));
        assert!(!Document::is_reserved("id"));
    }
}
