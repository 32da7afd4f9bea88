//! Conversion between typed values and documents.

use crate::document::Document;
use crate::error::CoreResult;
use docwell_codec::{from_value, to_value, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts values of `T` to and from documents.
///
/// Mappers are versioned: [`CONTRACT_VERSION`](Self::CONTRACT_VERSION)
/// changes whenever the document shape a mapper produces changes, so stored
/// data can be checked against the mapper reading it.
pub trait DocumentMapper<T>: Send + Sync {
    /// Version of the document shape produced by this mapper.
    const CONTRACT_VERSION: u32;

    /// Converts `value` into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as a document.
    fn to_document(&self, value: &T) -> CoreResult<Document>;

    /// Reads a value back from `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if `document` does not have the expected shape.
    fn from_document(&self, document: &Document) -> CoreResult<T>;
}

/// Maps any serde type through [`docwell_codec`].
///
/// The type must serialize to a map. Reserved fields are ignored on the
/// way back unless the type declares them, e.g.
/// `#[serde(rename = "_id")] id: Option<String>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeMapper;

impl<T> DocumentMapper<T> for SerdeMapper
where
    T: Serialize + DeserializeOwned,
{
    const CONTRACT_VERSION: u32 = 1;

    fn to_document(&self, value: &T) -> CoreResult<Document> {
        Document::try_from(to_value(value)?)
    }

    fn from_document(&self, document: &Document) -> CoreResult<T> {
        Ok(from_value(&Value::from(document.clone()))?)
    }
}
