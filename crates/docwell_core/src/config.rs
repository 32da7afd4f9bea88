//! Database configuration.

/// Default separator for nested field paths.
pub const DEFAULT_FIELD_SEPARATOR: &str = ".";

/// Configuration for opening a database.
///
/// A copy of the configuration is handed to every collection at creation
/// time; it is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Separator used to address nested fields (e.g. `address.city`).
    pub field_separator: String,

    /// Node id mixed into generated document ids (10 bits are used).
    pub node_id: u16,

    /// Whether collections post change batches to subscribers.
    pub notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            node_id: 0,
            notifications: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nested field separator.
    ///
    /// Empty separators are ignored and the default is kept.
    #[must_use]
    pub fn field_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        if !separator.is_empty() {
            self.field_separator = separator;
        }
        self
    }

    /// Sets the node id used by the id generator.
    #[must_use]
    pub const fn node_id(mut self, node_id: u16) -> Self {
        self.node_id = node_id;
        self
    }

    /// Enables or disables change notifications.
    #[must_use]
    pub const fn notifications(mut self, value: bool) -> Self {
        self.notifications = value;
        self
    }
}
