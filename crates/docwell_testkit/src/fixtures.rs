//! Test fixtures and database helpers.

use docwell_core::{doc, Collection, Config, Database, Document, DocumentId, DOC_ID};
use std::sync::Arc;

/// A test database owning its configuration.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
}

impl TestDatabase {
    /// Creates a database with the default configuration.
    pub fn memory() -> Self {
        Self {
            db: Database::new(),
        }
    }

    /// Creates a database with `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            db: Database::with_config(config),
        }
    }

    /// Returns the named collection, panicking on failure.
    pub fn collection(&self, name: &str) -> Arc<Collection> {
        self.db.collection(name).expect("Failed to open collection")
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a fresh database.
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Builds a document with a fixed id.
pub fn document_with_id(id: u64, document: Document) -> Document {
    document.with(DOC_ID, DocumentId::from_u64(id).to_value())
}

/// Builds `count` person documents with ids `1..=count`.
///
/// Each person has a unique `email`, an `age` cycling through 20..60 and a
/// `team` out of three.
pub fn people(count: u64) -> Vec<Document> {
    const TEAMS: [&str; 3] = ["red", "green", "blue"];
    (1..=count)
        .map(|i| {
            document_with_id(
                i,
                doc! {
                    "name" => format!("person-{i}"),
                    "email" => format!("person-{i}@example.com"),
                    "age" => 20 + (i % 40) as i64,
                    "team" => TEAMS[(i % 3) as usize],
                },
            )
        })
        .collect()
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use docwell_core::IndexKind;

    /// Creates a database with a `people` collection holding `count`
    /// documents, a unique index on `email` and a non-unique one on `team`.
    pub fn populated_database(count: u64) -> TestDatabase {
        let test_db = TestDatabase::memory();
        let collection = test_db.collection("people");
        collection
            .create_index("email", IndexKind::Unique)
            .expect("Failed to create index");
        collection
            .create_index("team", IndexKind::NonUnique)
            .expect("Failed to create index");
        collection
            .insert(people(count))
            .expect("Failed to insert people");
        test_db
    }

    /// Creates a database with `collection_count` collections holding one
    /// document each.
    pub fn multi_collection_database(collection_count: usize) -> (TestDatabase, Vec<String>) {
        let test_db = TestDatabase::memory();
        let mut names = Vec::with_capacity(collection_count);

        for i in 0..collection_count {
            let name = format!("collection_{i}");
            test_db
                .collection(&name)
                .insert(vec![doc! { "collection" => i as i64 }])
                .expect("Failed to insert document");
            names.push(name);
        }

        (test_db, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docwell_core::query::field;

    #[test]
    fn test_with_temp_db() {
        let size = with_temp_db(|db| db.collection("test").unwrap().size());
        assert_eq!(size, 0);
    }

    #[test]
    fn test_populated_scenario() {
        let test_db = scenarios::populated_database(30);
        let people = test_db.collection("people");

        assert_eq!(people.size(), 30);
        assert_eq!(people.list_indexes().len(), 2);
        let red = people.find(Some(&field("team").eq("red"))).unwrap();
        assert_eq!(red.size(), 10);
    }

    #[test]
    fn test_multi_collection_scenario() {
        let (test_db, names) = scenarios::multi_collection_database(3);
        assert_eq!(test_db.list_collections(), names);
    }
}
