//! Ledger receipts and journal entries.
//!
//! Every ledger decision, including a refused debit, is recorded as a
//! [`LedgerEntry`] under its idempotency key. Receipts handed back to callers
//! carry a `replayed` flag so a redelivered event can be told apart from the
//! first application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Credits, SettlementKey, UserId};

/// What a journal entry did to the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    /// Balance decreased by `amount`.
    Debit,
    /// Balance increased by `amount`.
    Credit,
    /// Debit of `amount` refused; balance unchanged.
    RejectedDebit,
}

impl std::fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "DEBIT"),
            Self::Credit => write!(f, "CREDIT"),
            Self::RejectedDebit => write!(f, "REJECTED_DEBIT"),
        }
    }
}

/// One append-only line of an account's journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub key: SettlementKey,
    pub user_id: UserId,
    pub kind: LedgerEntryKind,
    pub amount: Credits,
    /// Balance immediately before the entry was applied.
    pub balance_before: Credits,
    /// Balance immediately after (equal to `balance_before` for rejections).
    pub balance_after: Credits,
    pub recorded_at: DateTime<Utc>,
}

/// Result of a successful conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitReceipt {
    pub key: SettlementKey,
    pub amount: Credits,
    pub new_balance: Credits,
    /// `true` when the key had already been applied and nothing changed.
    pub replayed: bool,
}

/// Result of a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReceipt {
    pub key: SettlementKey,
    pub amount: Credits,
    pub new_balance: Credits,
    /// `true` when the key had already been applied and nothing changed.
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_display() {
        assert_eq!(format!("{}", LedgerEntryKind::Debit), "DEBIT");
        assert_eq!(format!("{}", LedgerEntryKind::RejectedDebit), "REJECTED_DEBIT");
    }
}
