//! # DocWell Core
//!
//! Write path of an embedded document store.
//!
//! This crate provides:
//! - [`WriteCoordinator`] for insert, update and remove with metadata
//!   bookkeeping, per-document critical sections and rollback
//! - [`IndexManager`] and the per-field [`IndexEngine`]
//! - [`QueryResolver`] with [`Filter`]s and lazy [`Cursor`]s
//! - [`PrimaryStore`] and the ordered [`InMemoryStore`]
//! - [`ChangeNotifier`] publishing one [`ChangeBatch`] per write call
//! - [`Collection`], [`Repository`] and [`Database`] facades
//!
//! ## Example
//!
//! ```
//! use docwell_core::{doc, query::field, Database, RemoveOptions};
//!
//! let db = Database::new();
//! let people = db.collection("people")?;
//! let events = people.subscribe()?;
//!
//! people.insert(vec![doc! { "name" => "Ada", "age" => 36 }])?;
//! let removed = people.remove(Some(&field("name").eq("Ada")), RemoveOptions::default())?;
//!
//! assert_eq!(removed.affected_count(), 1);
//! assert_eq!(events.drain().len(), 2);
//! # Ok::<(), docwell_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod collection;
mod config;
mod coordinator;
mod database;
mod document;
mod error;
pub mod events;
pub mod index;
mod mapper;
mod options;
pub mod query;
mod repository;
pub mod store;
mod write_result;

pub use clock::MonotonicClock;
pub use collection::Collection;
pub use config::{Config, DEFAULT_FIELD_SEPARATOR};
pub use coordinator::WriteCoordinator;
pub use database::Database;
pub use document::{
    Document, DocumentId, IdGenerator, DOC_ID, DOC_MODIFIED, DOC_REVISION, DOC_SOURCE, REPLICATOR,
    RESERVED_FIELDS,
};
pub use error::{CoreError, CoreResult};
pub use events::{ChangeBatch, ChangeNotifier, ChangeRecord, ChangeType, Subscription};
pub use index::{IndexDescriptor, IndexEngine, IndexKind, IndexManager};
pub use mapper::{DocumentMapper, SerdeMapper};
pub use options::{RemoveOptions, UpdateOptions};
pub use query::{Cursor, Filter, QueryResolver};
pub use repository::Repository;
pub use store::{InMemoryStore, PrimaryStore};
pub use write_result::WriteResult;

pub use docwell_codec::Value;
