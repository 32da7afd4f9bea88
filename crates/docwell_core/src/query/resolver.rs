//! Default query resolver for a collection.

use crate::document::DocumentId;
use crate::error::CoreResult;
use crate::index::IndexEngine;
use crate::query::{Cursor, Filter, QueryResolver};
use crate::store::PrimaryStore;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

/// Candidate ids for a filter, and whether they need re-checking.
struct Plan {
    ids: Vec<DocumentId>,
    exact: bool,
}

/// Resolves filters against one collection's store and indexes.
///
/// Equality, membership and range filters on indexed fields are answered
/// from the index; anything else falls back to a full scan. Results are in
/// ascending id order. Once the store has been dropped, `resolve` returns
/// `None`.
pub struct CollectionResolver {
    store: Arc<dyn PrimaryStore>,
    indexes: Arc<IndexEngine>,
    field_separator: String,
}

impl CollectionResolver {
    /// Creates a resolver.
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        indexes: Arc<IndexEngine>,
        field_separator: impl Into<String>,
    ) -> Self {
        Self {
            store,
            indexes,
            field_separator: field_separator.into(),
        }
    }

    fn plan(&self, filter: &Filter) -> CoreResult<Option<Plan>> {
        let plan = match filter {
            Filter::Id(id) => Some(Plan {
                ids: if self.store.contains(*id)? {
                    vec![*id]
                } else {
                    Vec::new()
                },
                exact: true,
            }),
            Filter::Eq(path, value) if !value.is_null() => self
                .indexes
                .lookup(path, value)
                .map(|ids| Plan { ids, exact: true }),
            Filter::In(path, values) if !values.iter().any(|v| v.is_null()) => {
                let mut ids = BTreeSet::new();
                for value in values {
                    match self.indexes.lookup(path, value) {
                        Some(found) => ids.extend(found),
                        None => return Ok(None),
                    }
                }
                Some(Plan {
                    ids: ids.into_iter().collect(),
                    exact: true,
                })
            }
            Filter::Gt(path, v) => self.range(path, Bound::Excluded(v), Bound::Unbounded),
            Filter::Gte(path, v) => self.range(path, Bound::Included(v), Bound::Unbounded),
            Filter::Lt(path, v) => self.range(path, Bound::Unbounded, Bound::Excluded(v)),
            Filter::Lte(path, v) => self.range(path, Bound::Unbounded, Bound::Included(v)),
            Filter::And(filters) => {
                for sub in filters {
                    if let Some(mut plan) = self.plan(sub)? {
                        plan.exact = plan.exact && filters.len() == 1;
                        return Ok(Some(plan));
                    }
                }
                None
            }
            _ => None,
        };
        Ok(plan)
    }

    fn range(
        &self,
        path: &str,
        lower: Bound<&docwell_codec::Value>,
        upper: Bound<&docwell_codec::Value>,
    ) -> Option<Plan> {
        // Index order spans value kinds, so range hits are re-checked.
        self.indexes.range(path, lower, upper).map(|mut ids| {
            ids.sort_unstable();
            Plan { ids, exact: false }
        })
    }
}

impl QueryResolver for CollectionResolver {
    fn resolve(&self, filter: Option<&Filter>) -> CoreResult<Option<Cursor>> {
        if self.store.is_dropped() {
            return Ok(None);
        }

        let Some(filter) = filter else {
            return Ok(Some(Cursor::new(self.store.ids()?, Arc::clone(&self.store))));
        };

        let (candidates, exact) = match self.plan(filter)? {
            Some(plan) => (plan.ids, plan.exact),
            None => (self.store.ids()?, false),
        };

        let ids = if exact {
            candidates
        } else {
            let mut matched = Vec::with_capacity(candidates.len());
            for id in candidates {
                if let Some(document) = self.store.get(id)? {
                    if filter.matches(&document, &self.field_separator) {
                        matched.push(id);
                    }
                }
            }
            matched
        };

        tracing::trace!(
            collection = %self.store.name(),
            matches = ids.len(),
            indexed = exact,
            "filter resolved"
        );
        Ok(Some(Cursor::new(ids, Arc::clone(&self.store))))
    }
}
