//! Document identifier and generator.

use crate::clock::system_millis;
use docwell_codec::Value;
use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;

/// Custom epoch for generated ids (2024-01-01T00:00:00Z).
const ID_EPOCH_MILLIS: i64 = 1_704_067_200_000;
const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_NODE: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Unique identifier for a document.
///
/// Document ids are:
/// - Unique within a collection
/// - Immutable once assigned
/// - Totally ordered (the primary store iterates in id order)
///
/// Inside a document the id is stored under `_id` as decimal text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Creates a document id from a raw value.
    #[inline]
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id as a document field value.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::Text(self.0.to_string())
    }

    /// Parses an id from a document field value.
    ///
    /// Accepts decimal text and non-negative integers.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => s.parse().ok(),
            Value::Integer(n) => u64::try_from(*n).ok().map(Self),
            _ => None,
        }
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for DocumentId {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<DocumentId> for u64 {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Snowflake-style id generator.
///
/// Layout (most significant first): 41 bits of milliseconds since
/// [`ID_EPOCH_MILLIS`], 10 bits of node id, 12 bits of sequence. When the
/// sequence wraps within one millisecond the generator borrows the next
/// millisecond instead of sleeping, so ids stay strictly increasing.
#[derive(Debug)]
pub struct IdGenerator {
    node: u64,
    /// (last millisecond used, sequence within it)
    state: Mutex<(i64, u64)>,
}

impl IdGenerator {
    /// Creates a generator for the given node id.
    ///
    /// Only the low 10 bits of `node_id` are used.
    pub fn new(node_id: u16) -> Self {
        Self {
            node: u64::from(node_id & MAX_NODE),
            state: Mutex::new((-1, 0)),
        }
    }

    /// Returns the next id.
    pub fn next_id(&self) -> DocumentId {
        let now = (system_millis() - ID_EPOCH_MILLIS).max(0);
        let mut state = self.state.lock();
        let (last, seq) = *state;

        let (millis, seq) = if now > last {
            (now, 0)
        } else if seq < MAX_SEQUENCE {
            (last, seq + 1)
        } else {
            (last + 1, 0)
        };
        *state = (millis, seq);

        #[allow(clippy::cast_sign_loss)]
        let millis = millis as u64;
        DocumentId((millis << (NODE_BITS + SEQUENCE_BITS)) | (self.node << SEQUENCE_BITS) | seq)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
