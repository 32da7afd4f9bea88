//! Property-based test generators using proptest.
//!
//! Strategies produce values the store accepts: no reserved field names in
//! user fields, and identifiers drawn from a small range so that sequences
//! of writes collide often.

use docwell_codec::Value;
use docwell_core::{Document, DocumentId, RESERVED_FIELDS};
use proptest::prelude::*;

/// Strategy for document ids in `1..=max`.
pub fn document_id_strategy(max: u64) -> impl Strategy<Value = DocumentId> {
    (1..=max).prop_map(DocumentId::from_u64)
}

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for user field names (never reserved).
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}")
        .expect("Invalid regex")
        .prop_filter("Field name must not be reserved", |name| {
            !RESERVED_FIELDS.contains(&name.as_str())
        })
}

/// Strategy for scalar values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{0,12}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

/// Strategy for values nested up to `depth` levels.
pub fn value_strategy(depth: u32) -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(depth, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for documents without reserved fields.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(field_name_strategy(), value_strategy(2), 0..6)
        .prop_map(Document::from)
}

/// A write against one collection.
#[derive(Debug, Clone)]
pub enum WriteOperation {
    /// Insert a document under a fixed id.
    Insert {
        /// Document id
        id: DocumentId,
        /// Document body
        document: Document,
    },
    /// Merge a patch into the document with this id.
    Update {
        /// Document id
        id: DocumentId,
        /// Patch
        patch: Document,
    },
    /// Remove the document with this id.
    Remove {
        /// Document id
        id: DocumentId,
    },
}

/// Strategy for write operations over ids in `1..=max_id`.
pub fn write_operation_strategy(max_id: u64) -> impl Strategy<Value = WriteOperation> {
    prop_oneof![
        3 => (document_id_strategy(max_id), document_strategy())
            .prop_map(|(id, document)| WriteOperation::Insert { id, document }),
        2 => (document_id_strategy(max_id), document_strategy())
            .prop_map(|(id, patch)| WriteOperation::Update { id, patch }),
        1 => document_id_strategy(max_id).prop_map(|id| WriteOperation::Remove { id }),
    ]
}

/// Strategy for generating a sequence of writes.
pub fn write_sequence_strategy(
    max_id: u64,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<WriteOperation>> {
    prop::collection::vec(write_operation_strategy(max_id), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
