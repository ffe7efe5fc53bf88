//! Quoting: turning a selection and a unit price into a total.

use serde::{Deserialize, Serialize};
use streetcredit_types::{CreditError, Credits, Result, SelectionItem};

/// Outcome of quoting a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quote {
    /// The selection was empty. Intake refuses to submit this.
    NothingSelected,
    /// `total == count × unit_price`.
    Priced {
        count: usize,
        unit_price: Credits,
        total: Credits,
    },
}

impl Quote {
    /// Total cost, or `None` when nothing is selected.
    #[must_use]
    pub fn total(&self) -> Option<Credits> {
        match self {
            Self::NothingSelected => None,
            Self::Priced { total, .. } => Some(*total),
        }
    }

    /// Number of priced objects (zero when nothing is selected).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::NothingSelected => 0,
            Self::Priced { count, .. } => *count,
        }
    }

    /// Convert into `(count, unit_price, total)`, refusing an empty quote.
    pub fn require_priced(self) -> Result<(usize, Credits, Credits)> {
        match self {
            Self::NothingSelected => Err(CreditError::NothingSelected),
            Self::Priced {
                count,
                unit_price,
                total,
            } => Ok((count, unit_price, total)),
        }
    }
}

/// Price `selection` at `unit_price` credits per object.
///
/// Pure: no I/O, no clock, no shared state.
///
/// # Errors
/// - `InvalidUnitPrice` if `unit_price` is zero (a non-empty selection
///   would otherwise produce a zero-cost order)
/// - `QuoteOverflow` if the total does not fit in [`Credits`]
pub fn quote(selection: &[SelectionItem], unit_price: Credits) -> Result<Quote> {
    if selection.is_empty() {
        return Ok(Quote::NothingSelected);
    }
    if unit_price == 0 {
        return Err(CreditError::InvalidUnitPrice(unit_price));
    }
    let count = selection.len();
    let total = Credits::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(unit_price))
        .ok_or(CreditError::QuoteOverflow { count, unit_price })?;
    Ok(Quote::Priced {
        count,
        unit_price,
        total,
    })
}
