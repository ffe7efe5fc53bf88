//! Client-side affordability hint shown before the user confirms an export.
//!
//! The cached balance may be stale, so the answer is only ever a hint.
//! Submission goes ahead regardless; the ledger decides.

use serde::Serialize;
use streetcredit_pricing::Quote;
use streetcredit_types::Credits;

/// Result of comparing a quote against the client's cached balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AdvisoryCheck {
    Affordable,
    Shortfall {
        needed: Credits,
        cached_balance: Credits,
        missing: Credits,
    },
}

impl AdvisoryCheck {
    /// Compare `quote` with `cached_balance`. An empty quote costs nothing.
    #[must_use]
    pub fn evaluate(quote: &Quote, cached_balance: Credits) -> Self {
        match quote.total() {
            Some(needed) if needed > cached_balance => Self::Shortfall {
                needed,
                cached_balance,
                missing: needed - cached_balance,
            },
            _ => Self::Affordable,
        }
    }

    #[must_use]
    pub fn is_affordable(&self) -> bool {
        matches!(self, Self::Affordable)
    }
}
