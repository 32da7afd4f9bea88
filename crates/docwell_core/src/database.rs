//! Database: the registry of collections.

use crate::collection::Collection;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::mapper::SerdeMapper;
use crate::repository::Repository;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// An in-memory document database.
///
/// Collections are created on first use and live until dropped. Every
/// collection receives a read-only view of the database [`Config`].
///
/// ```
/// use docwell_core::{doc, Config, Database};
///
/// let db = Database::with_config(Config::new().node_id(3));
/// let users = db.collection("users")?;
/// users.insert(vec![doc! { "name" => "Ada" }])?;
///
/// assert!(db.has_collection("users"));
/// assert_eq!(db.list_collections(), vec!["users".to_string()]);
/// # Ok::<(), docwell_core::CoreError>(())
/// ```
pub struct Database {
    config: Arc<Config>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Database {
    /// Creates a database with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a database with `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the named collection, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `name` is empty.
    pub fn collection(&self, name: &str) -> CoreResult<Arc<Collection>> {
        if name.is_empty() {
            return Err(CoreError::invalid_operation("collection name cannot be empty"));
        }

        if let Some(collection) = self.collections.read().get(name) {
            return Ok(Arc::clone(collection));
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(collection = name, "collection created");
            Arc::new(Collection::new(name, Arc::clone(&self.config)))
        });
        Ok(Arc::clone(collection))
    }

    /// Returns true if the named collection exists.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Lists collection names in sorted order.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops the named collection and forgets it.
    ///
    /// Handles to the collection held elsewhere stay valid but reject
    /// further use.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if no such collection exists.
    pub fn drop_collection(&self, name: &str) -> CoreResult<()> {
        let collection = self
            .collections
            .write()
            .remove(name)
            .ok_or_else(|| CoreError::CollectionNotFound {
                name: name.to_string(),
            })?;
        collection.destroy()
    }

    /// Returns a typed repository over the named collection, mapped with
    /// serde.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `name` is empty.
    pub fn repository<T>(&self, name: &str) -> CoreResult<Repository<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        Ok(Repository::new(self.collection(name)?, SerdeMapper))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("collections", &self.collections.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn collection_is_created_once() {
        let db = Database::new();
        let a = db.collection("users").unwrap();
        let b = db.collection("users").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(db.list_collections(), vec!["users"]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let db = Database::new();
        assert!(db.collection("").is_err());
    }

    #[test]
    fn drop_collection_invalidates_handles() {
        let db = Database::new();
        let users = db.collection("users").unwrap();
        users.insert(vec![doc! { "n" => 1 }]).unwrap();

        db.drop_collection("users").unwrap();
        assert!(!db.has_collection("users"));
        assert!(users.is_dropped());
        assert!(matches!(
            db.drop_collection("users").unwrap_err(),
            CoreError::CollectionNotFound { .. }
        ));

        let fresh = db.collection("users").unwrap();
        assert_eq!(fresh.size(), 0);
    }

    #[test]
    fn collections_share_config() {
        let db = Database::with_config(Config::new().field_separator("::"));
        let c = db.collection("c").unwrap();
        assert_eq!(c.config().field_separator, "::");
    }
}
