//! Stress tests for DocWell.
//!
//! These runners drive collections from one or many threads and report
//! throughput. The concurrent runners give every thread its own documents,
//! so the final state of each document is fully determined by its thread.

use crate::fixtures::document_with_id;
use docwell_core::{doc, Database, DocumentId, Filter, RemoveOptions, UpdateOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform (split across threads).
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Number of documents each thread owns.
    pub documents_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            documents_per_thread: 16,
        }
    }
}

/// Id of the `slot`-th document owned by `thread`.
fn owned_id(thread: usize, slot: usize, per_thread: usize) -> DocumentId {
    DocumentId::from_u64((thread * per_thread + slot + 1) as u64)
}

/// Run a sequential insert stress test.
pub fn stress_sequential_inserts(db: &Database, config: &StressConfig) -> StressTestResult {
    let collection = db.collection("stress").expect("Failed to open collection");

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match collection.insert(vec![doc! { "i" => i as i64 }]) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent insert stress test with generated ids.
pub fn stress_concurrent_inserts(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                let collection = db.collection("stress").expect("Failed to open collection");
                for i in 0..ops_per_thread {
                    match collection.insert(vec![doc! { "thread" => t as i64, "i" => i as i64 }]) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run concurrent updates where every thread owns a disjoint set of
/// documents.
///
/// Each thread inserts its documents with `count = 0`, then updates them
/// round-robin, writing its running per-document count. Use
/// [`verify_disjoint_updates`] afterwards to check the final state.
pub fn stress_concurrent_disjoint_updates(
    db: Arc<Database>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;
    let per_thread = config.documents_per_thread;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                let collection = db.collection("stress").expect("Failed to open collection");
                let owned: Vec<_> = (0..per_thread)
                    .map(|slot| owned_id(t, slot, per_thread))
                    .collect();
                collection
                    .insert(owned.iter().map(|id| {
                        document_with_id(id.as_u64(), doc! { "owner" => t as i64, "count" => 0 })
                    }))
                    .expect("Failed to insert owned documents");

                let mut counts = vec![0i64; per_thread];
                for i in 0..ops_per_thread {
                    let slot = i % per_thread;
                    counts[slot] += 1;
                    let outcome = collection.update(
                        Some(&Filter::by_id(owned[slot])),
                        &doc! { "count" => counts[slot] },
                        UpdateOptions::new().just_once(true),
                    );
                    match outcome {
                        Ok(result) if result.affected_count() == 1 => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Checks the state left by [`stress_concurrent_disjoint_updates`].
///
/// Returns a description of the first mismatch, if any.
pub fn verify_disjoint_updates(db: &Database, config: &StressConfig) -> Result<(), String> {
    let collection = db.collection("stress").map_err(|e| e.to_string())?;
    let ops_per_thread = config.operations / config.threads;
    let per_thread = config.documents_per_thread;

    for t in 0..config.threads {
        for slot in 0..per_thread {
            let id = owned_id(t, slot, per_thread);
            let expected = (ops_per_thread / per_thread + usize::from(slot < ops_per_thread % per_thread)) as i64;
            let document = collection
                .get_by_id(id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("document {id} missing"))?;

            let count = document.get("count").and_then(|v| v.as_integer());
            if count != Some(expected) {
                return Err(format!("document {id}: count {count:?}, expected {expected}"));
            }
            if document.revision() != expected + 1 {
                return Err(format!(
                    "document {id}: revision {}, expected {}",
                    document.revision(),
                    expected + 1
                ));
            }
        }
    }
    Ok(())
}

/// Run a mixed insert/update/remove stress test on one thread.
pub fn stress_mixed_operations(db: &Database, config: &StressConfig) -> StressTestResult {
    let collection = db.collection("stress").expect("Failed to open collection");
    let key_space = config.documents_per_thread.max(1) as u64;

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let id = DocumentId::from_u64(i as u64 % key_space + 1);
        let filter = Filter::by_id(id);

        let result = match i % 3 {
            0 => collection
                .update(
                    Some(&filter),
                    &document_with_id(id.as_u64(), doc! { "i" => i as i64 }),
                    UpdateOptions::new().upsert(true),
                )
                .map(|_| ()),
            1 => collection
                .update(Some(&filter), &doc! { "touched" => true }, UpdateOptions::default())
                .map(|_| ()),
            _ => collection.remove(Some(&filter), RemoveOptions::default()).map(|_| ()),
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_inserts() {
        let db = Database::new();
        let config = StressConfig {
            operations: 1_000,
            ..Default::default()
        };

        let result = stress_sequential_inserts(&db, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(db.collection("stress").unwrap().size(), 1_000);
    }

    #[test]
    fn test_concurrent_inserts_get_unique_ids() {
        let db = Arc::new(Database::new());
        let config = StressConfig {
            operations: 2_000,
            threads: 4,
            ..Default::default()
        };

        let result = stress_concurrent_inserts(Arc::clone(&db), &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(db.collection("stress").unwrap().size(), 2_000);
    }

    #[test]
    fn test_concurrent_disjoint_updates_are_serializable() {
        let db = Arc::new(Database::new());
        let config = StressConfig {
            operations: 4_000,
            threads: 4,
            documents_per_thread: 7,
        };

        let result = stress_concurrent_disjoint_updates(Arc::clone(&db), &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 4_000);
        verify_disjoint_updates(&db, &config).unwrap();
    }

    #[test]
    fn test_mixed_operations() {
        let db = Database::new();
        let config = StressConfig {
            operations: 1_000,
            documents_per_thread: 10,
            ..Default::default()
        };

        let result = stress_mixed_operations(&db, &config);
        assert_eq!(result.failed_ops, 0);
    }
}
