//! Error types for DocWell core.

use crate::document::DocumentId;
use docwell_codec::Value;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DocWell core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Value mapping error.
    #[error("codec error: {0}")]
    Codec(#[from] docwell_codec::CodecError),

    /// Insert targeted an identifier that is already stored.
    #[error("id constraint violation, entry with id {id} already exists in {collection}")]
    DuplicateId {
        /// The collection written to.
        collection: String,
        /// The conflicting identifier.
        id: DocumentId,
    },

    /// A unique index already holds the value for another document.
    #[error("unique constraint violation on field '{field}' with value {value:?} in {collection}")]
    UniqueConstraintViolation {
        /// The collection written to.
        collection: String,
        /// The indexed field.
        field: String,
        /// The offending value.
        value: Value,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// A document carried an identifier that could not be parsed.
    #[error("invalid document id: {value:?}")]
    InvalidId {
        /// The stored `_id` value.
        value: Value,
    },

    /// Document not found.
    #[error("document {id} not found in {collection}")]
    DocumentNotFound {
        /// The collection searched.
        collection: String,
        /// The identifier that was not found.
        id: DocumentId,
    },

    /// Collection not found.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// The collection's store has been dropped.
    #[error("collection {collection} has been dropped")]
    StoreDropped {
        /// Name of the collection.
        collection: String,
    },
}

impl CoreError {
    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a duplicate id error.
    pub fn duplicate_id(collection: impl Into<String>, id: DocumentId) -> Self {
        Self::DuplicateId {
            collection: collection.into(),
            id,
        }
    }

    /// Creates a unique constraint violation error.
    pub fn unique_violation(
        collection: impl Into<String>,
        field: impl Into<String>,
        value: Value,
    ) -> Self {
        Self::UniqueConstraintViolation {
            collection: collection.into(),
            field: field.into(),
            value,
        }
    }

    /// Creates a document not found error.
    pub fn document_not_found(collection: impl Into<String>, id: DocumentId) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            id,
        }
    }

    /// Creates a store dropped error.
    pub fn store_dropped(collection: impl Into<String>) -> Self {
        Self::StoreDropped {
            collection: collection.into(),
        }
    }

    /// Returns true for constraint violations (duplicate id or unique index).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. } | Self::UniqueConstraintViolation { .. }
        )
    }
}
