//! Per-call options for update and remove.

/// Options for [`WriteCoordinator::update`](crate::WriteCoordinator::update).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Fail with `InvalidOperation` if the filter matches more than one
    /// document.
    pub just_once: bool,
    /// Insert the patch when the filter matches nothing.
    pub upsert: bool,
}

impl UpdateOptions {
    /// Options with every flag off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            just_once: false,
            upsert: false,
        }
    }

    /// Sets `just_once`.
    #[must_use]
    pub const fn just_once(mut self, just_once: bool) -> Self {
        self.just_once = just_once;
        self
    }

    /// Sets `upsert`.
    #[must_use]
    pub const fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Options for [`WriteCoordinator::remove`](crate::WriteCoordinator::remove).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Stop after removing the first matched document.
    pub just_one: bool,
}

impl RemoveOptions {
    /// Options with every flag off.
    #[must_use]
    pub const fn new() -> Self {
        Self { just_one: false }
    }

    /// Sets `just_one`.
    #[must_use]
    pub const fn just_one(mut self, just_one: bool) -> Self {
        self.just_one = just_one;
        self
    }
}
