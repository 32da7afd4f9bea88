//! Outcome of a write call.

use crate::document::DocumentId;

/// Identifiers affected by one write call, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    ids: Vec<DocumentId>,
}

impl WriteResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: DocumentId) {
        self.ids.push(id);
    }

    /// Returns the number of affected documents.
    pub fn affected_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing was affected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the affected ids.
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// Returns the first affected id.
    pub fn first(&self) -> Option<DocumentId> {
        self.ids.first().copied()
    }

    /// Iterates over the affected ids.
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentId> {
        self.ids.iter()
    }
}

impl IntoIterator for WriteResult {
    type Item = DocumentId;
    type IntoIter = std::vec::IntoIter<DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a WriteResult {
    type Item = &'a DocumentId;
    type IntoIter = std::slice::Iter<'a, DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl FromIterator<DocumentId> for WriteResult {
    fn from_iter<I: IntoIterator<Item = DocumentId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
