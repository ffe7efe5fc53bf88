//! Account model for the credit ledger.
//!
//! A user's balance is a plain count of prepaid credits. It is unsigned, so a
//! negative balance cannot be represented at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Prepaid credit amount. Integer, never negative.
pub type Credits = u64;

/// Snapshot of a user's ledger account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub user_id: UserId,
    pub display_name: String,
    /// Current spendable credits.
    pub balance: Credits,
    /// Balance at account creation; the baseline for completeness audits.
    pub opening_balance: Credits,
    pub opened_at: DateTime<Utc>,
}

impl Account {
    /// Create an account holding `opening_balance` credits.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, opening_balance: Credits) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            balance: opening_balance,
            opening_balance,
            opened_at: Utc::now(),
        }
    }

    /// Whether the account can cover `amount` right now.
    #[must_use]
    pub fn can_cover(&self, amount: Credits) -> bool {
        self.balance >= amount
    }

    /// Credits missing to cover `amount` (zero if affordable).
    #[must_use]
    pub fn shortfall(&self, amount: Credits) -> Credits {
        amount.saturating_sub(self.balance)
    }
}
