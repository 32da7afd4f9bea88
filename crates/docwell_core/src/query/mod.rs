//! Query resolution contract and the default resolver.
//!
//! The write coordinator only needs [`QueryResolver::resolve`]: turn an
//! optional [`Filter`] into a sized [`Cursor`] over the documents matching
//! at call time.

mod cursor;
mod filter;
mod resolver;

pub use cursor::Cursor;
pub use filter::{field, FieldFilter, Filter};
pub use resolver::CollectionResolver;

use crate::error::CoreResult;

/// Evaluates filters into cursors over the primary store.
pub trait QueryResolver: Send + Sync {
    /// Resolves `filter` (absent = every document).
    ///
    /// Returns `None` when no cursor can be produced at all, which is
    /// distinct from a cursor with zero matches.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the store fails.
    fn resolve(&self, filter: Option<&Filter>) -> CoreResult<Option<Cursor>>;
}
