//! Change notification for committed writes.
//!
//! Every write call that changes at least one document produces one
//! [`ChangeBatch`]. The batch is posted after the mutation has been
//! applied, so a subscriber never observes a change that could still be
//! undone. Delivery is a synchronous enqueue into each subscriber's channel
//! on the writer's thread; consumers drain their own channel.
//!
//! ```
//! use docwell_core::{doc, Database};
//!
//! let db = Database::new();
//! let users = db.collection("users").unwrap();
//! let subscription = users.subscribe().unwrap();
//!
//! users.insert(vec![doc! { "name" => "Ada" }]).unwrap();
//!
//! let batch = subscription.try_recv().unwrap();
//! assert_eq!(batch.records.len(), 1);
//! ```

use crate::document::Document;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Kind of mutation a change describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Document was inserted.
    Insert,
    /// Document was updated in place.
    Update,
    /// Document was removed.
    Remove,
}

/// One affected document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// The document after the change (for removals, the removed copy with
    /// its revision bumped).
    pub document: Document,
    /// Kind of change.
    pub change_type: ChangeType,
    /// When the change was recorded (ms since Unix epoch).
    pub timestamp: i64,
}

impl ChangeRecord {
    /// Creates a record.
    pub fn new(document: Document, change_type: ChangeType, timestamp: i64) -> Self {
        Self {
            document,
            change_type,
            timestamp,
        }
    }
}

/// The change records of one write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Collection the call wrote to.
    pub collection: String,
    /// Kind of change shared by every record.
    pub change_type: ChangeType,
    /// Position in the notifier's posting order, starting at 1.
    pub sequence: u64,
    /// Records in processing order.
    pub records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct Registry {
    subscribers: RwLock<Vec<(u64, Sender<Arc<ChangeBatch>>)>>,
    next_subscriber: AtomicU64,
    sequence: AtomicU64,
}

impl Registry {
    fn unsubscribe(&self, id: u64) {
        self.subscribers.write().retain(|(sid, _)| *sid != id);
    }
}

/// Fan-out of change batches to subscribers.
///
/// Cloning a notifier yields another handle onto the same subscriber set.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<Registry>,
}

impl ChangeNotifier {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                subscribers: RwLock::new(Vec::new()),
                next_subscriber: AtomicU64::new(1),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Registers a new subscriber.
    ///
    /// The subscription receives every batch posted after this call.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.write().push((id, tx));
        Subscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Posts a batch of records to every subscriber.
    ///
    /// Returns the assigned sequence number, or `None` when `records` is
    /// empty and nothing was posted. Subscribers whose receiving end has
    /// been dropped are pruned.
    pub fn post(
        &self,
        collection: &str,
        change_type: ChangeType,
        records: Vec<ChangeRecord>,
    ) -> Option<u64> {
        if records.is_empty() {
            return None;
        }

        // Sequence is assigned under the subscriber lock so delivery order
        // matches sequence order.
        let mut subscribers = self.inner.subscribers.write();
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let batch = Arc::new(ChangeBatch {
            collection: collection.to_string(),
            change_type,
            sequence,
            records,
        });
        subscribers.retain(|(_, tx)| tx.send(Arc::clone(&batch)).is_ok());
        tracing::debug!(
            collection,
            ?change_type,
            sequence,
            records = batch.records.len(),
            subscribers = subscribers.len(),
            "change batch posted"
        );
        Some(sequence)
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Returns the sequence number of the last posted batch (0 if none).
    pub fn last_sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::SeqCst)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("last_sequence", &self.last_sequence())
            .finish()
    }
}

/// Receiving end of a subscription.
///
/// Dropping the subscription stops delivery; the notifier prunes it on its
/// next post. [`unsubscribe`](Self::unsubscribe) removes it immediately.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: Receiver<Arc<ChangeBatch>>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Returns this subscription's id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Blocks until a batch arrives.
    ///
    /// Returns `None` once the notifier is gone and the queue is drained.
    pub fn recv(&self) -> Option<Arc<ChangeBatch>> {
        self.receiver.recv().ok()
    }

    /// Returns a queued batch without blocking.
    pub fn try_recv(&self) -> Option<Arc<ChangeBatch>> {
        match self.receiver.try_recv() {
            Ok(batch) => Some(batch),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for a batch.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Arc<ChangeBatch>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(batch) => Some(batch),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains every batch queued so far.
    pub fn drain(&self) -> Vec<Arc<ChangeBatch>> {
        self.receiver.try_iter().collect()
    }

    /// Blocking iterator over incoming batches.
    pub fn iter(&self) -> impl Iterator<Item = Arc<ChangeBatch>> + '_ {
        self.receiver.iter()
    }

    /// Stops delivery to this subscription.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}
