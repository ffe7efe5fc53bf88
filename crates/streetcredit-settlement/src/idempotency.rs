//! Settlement idempotency guard. Prevents double-application.
//!
//! Each ledger mutation is keyed by the id of the entity that triggered it.
//! The guard maps every applied key to the position of its journal entry,
//! so a redelivered event can be answered with the outcome that was
//! recorded the first time.
//!
//! Unlike a replay cache, nothing is ever evicted: forgetting a key would
//! let a late redelivery apply twice.

use std::collections::HashMap;

use streetcredit_types::{CreditError, Result, SettlementKey};

/// Per-account record of applied settlement keys.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyGuard {
    /// Applied key → index of its entry in the account journal.
    applied: HashMap<SettlementKey, usize>,
}

impl IdempotencyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` produced journal entry `journal_index`.
    ///
    /// # Errors
    /// Returns [`CreditError::AlreadyApplied`] if `key` was recorded before.
    pub fn mark_applied(&mut self, key: SettlementKey, journal_index: usize) -> Result<()> {
        if self.applied.contains_key(&key) {
            return Err(CreditError::AlreadyApplied(key));
        }
        self.applied.insert(key, journal_index);
        Ok(())
    }

    /// Journal position of `key`, if it was applied.
    #[must_use]
    pub fn lookup(&self, key: &SettlementKey) -> Option<usize> {
        self.applied.get(key).copied()
    }

    #[must_use]
    pub fn is_applied(&self, key: &SettlementKey) -> bool {
        self.applied.contains_key(key)
    }

    /// Number of keys tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}
