//! Document filters.

use crate::document::{Document, DocumentId};
use docwell_codec::Value;
use std::cmp::Ordering;
use std::mem::discriminant;

/// A predicate over documents.
///
/// Range comparisons only match values of the same kind: `age > 30` never
/// matches a document whose `age` is text.
///
/// ```
/// use docwell_core::query::field;
///
/// let adults_in_oslo = field("age").gte(18).and(field("city").eq("Oslo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Document with the given identifier.
    Id(DocumentId),
    /// Field equals value.
    Eq(String, Value),
    /// Field is absent or differs from value.
    Ne(String, Value),
    /// Field is greater than value.
    Gt(String, Value),
    /// Field is greater than or equal to value.
    Gte(String, Value),
    /// Field is less than value.
    Lt(String, Value),
    /// Field is less than or equal to value.
    Lte(String, Value),
    /// Field equals one of the values.
    In(String, Vec<Value>),
    /// Field is present.
    Exists(String),
    /// All sub-filters match.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
    /// Sub-filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Matches the document with identifier `id`.
    pub fn by_id(id: DocumentId) -> Self {
        Filter::Id(id)
    }

    /// Combines with another filter using logical AND.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Combines with another filter using logical OR.
    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Negates this filter.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Evaluates the filter against a document.
    ///
    /// Field paths are split on `separator` to reach nested values.
    pub fn matches(&self, document: &Document, separator: &str) -> bool {
        let lookup = |path: &str| document.get_path(path, separator);
        match self {
            Filter::Id(id) => document.id() == Some(*id),
            Filter::Eq(path, value) => lookup(path) == Some(value),
            Filter::Ne(path, value) => lookup(path) != Some(value),
            Filter::Gt(path, value) => compare(lookup(path), value) == Some(Ordering::Greater),
            Filter::Gte(path, value) => matches!(
                compare(lookup(path), value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(path, value) => compare(lookup(path), value) == Some(Ordering::Less),
            Filter::Lte(path, value) => matches!(
                compare(lookup(path), value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::In(path, values) => lookup(path).is_some_and(|v| values.contains(v)),
            Filter::Exists(path) => lookup(path).is_some(),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document, separator)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document, separator)),
            Filter::Not(inner) => !inner.matches(document, separator),
        }
    }
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    (discriminant(actual) == discriminant(expected)).then(|| actual.cmp(expected))
}

/// Starts a filter on a field path.
pub fn field(path: impl Into<String>) -> FieldFilter {
    FieldFilter { path: path.into() }
}

/// Builder for single-field filters, created by [`field`].
#[derive(Debug, Clone)]
pub struct FieldFilter {
    path: String,
}

impl FieldFilter {
    /// Field equals value.
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, value: impl Into<Value>) -> Filter {
        Filter::Eq(self.path, value.into())
    }

    /// Field is absent or differs from value.
    #[allow(clippy::should_implement_trait)]
    pub fn ne(self, value: impl Into<Value>) -> Filter {
        Filter::Ne(self.path, value.into())
    }

    /// Field is greater than value.
    pub fn gt(self, value: impl Into<Value>) -> Filter {
        Filter::Gt(self.path, value.into())
    }

    /// Field is greater than or equal to value.
    pub fn gte(self, value: impl Into<Value>) -> Filter {
        Filter::Gte(self.path, value.into())
    }

    /// Field is less than value.
    pub fn lt(self, value: impl Into<Value>) -> Filter {
        Filter::Lt(self.path, value.into())
    }

    /// Field is less than or equal to value.
    pub fn lte(self, value: impl Into<Value>) -> Filter {
        Filter::Lte(self.path, value.into())
    }

    /// Field equals one of the values.
    pub fn one_of<I, V>(self, values: I) -> Filter
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(self.path, values.into_iter().map(Into::into).collect())
    }

    /// Field is present.
    pub fn exists(self) -> Filter {
        Filter::Exists(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn person() -> Document {
        doc! {
            "name" => "Ada",
            "age" => 36,
            "address" => Value::map(vec![("city", Value::from("London"))]),
        }
    }

    #[test]
    fn equality_and_negation() {
        let d = person();
        assert!(field("name").eq("Ada").matches(&d, "."));
        assert!(!field("name").eq("Bob").matches(&d, "."));
        assert!(field("name").ne("Bob").matches(&d, "."));
        assert!(field("missing").ne("x").matches(&d, "."));
        assert!(field("name").eq("Bob").not().matches(&d, "."));
    }

    #[test]
    fn comparisons_require_same_kind() {
        let d = person();
        assert!(field("age").gt(30).matches(&d, "."));
        assert!(field("age").gte(36).matches(&d, "."));
        assert!(field("age").lt(40).matches(&d, "."));
        assert!(field("age").lte(36).matches(&d, "."));
        assert!(!field("age").gt("30").matches(&d, "."));
        assert!(!field("missing").lt(100).matches(&d, "."));
    }

    #[test]
    fn nested_and_membership() {
        let d = person();
        assert!(field("address.city").eq("London").matches(&d, "."));
        assert!(field("address.city").one_of(["Paris", "London"]).matches(&d, "."));
        assert!(field("address").exists().matches(&d, "."));
        assert!(!field("address.zip").exists().matches(&d, "."));
    }

    #[test]
    fn boolean_combinators_flatten() {
        let f = field("a").eq(1).and(field("b").eq(2)).and(field("c").eq(3));
        assert!(matches!(&f, Filter::And(parts) if parts.len() == 3));

        let d = doc! { "a" => 1, "b" => 2, "c" => 4 };
        assert!(!f.matches(&d, "."));
        assert!(field("c").eq(3).or(field("c").eq(4)).matches(&d, "."));
    }

    #[test]
    fn id_filter() {
        let mut d = person();
        let id = DocumentId::from_u64(7);
        d.set_id(id);
        assert!(Filter::by_id(id).matches(&d, "."));
        assert!(!Filter::by_id(DocumentId::from_u64(8)).matches(&d, "."));
    }
}
