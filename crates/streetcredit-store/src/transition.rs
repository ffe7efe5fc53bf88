//! Status transition guards shared by every store backend.
//!
//! ```text
//! Order:           PENDING ──► SETTLED
//!                          └─► REJECTED
//! BalanceRequest:  PENDING ──► PROCESSED
//! ```
//!
//! Writing the status an entity already has is accepted and changes nothing.

use streetcredit_types::{BalanceRequestStatus, CreditError, OrderStatus, Result};

/// Whether the write changes the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unchanged,
}

/// Validate moving an order from `current` to `next`.
pub fn order(entity: &str, current: OrderStatus, next: OrderStatus) -> Result<Transition> {
    if current == next {
        return Ok(Transition::Unchanged);
    }
    if current.is_terminal() || !next.is_terminal() {
        return Err(CreditError::StatusConflict {
            entity: entity.to_string(),
            recorded: current.to_string(),
            attempted: next.to_string(),
        });
    }
    Ok(Transition::Applied)
}

/// Validate moving a balance request from `current` to `next`.
pub fn balance_request(
    entity: &str,
    current: BalanceRequestStatus,
    next: BalanceRequestStatus,
) -> Result<Transition> {
    if current == next {
        return Ok(Transition::Unchanged);
    }
    if current.is_terminal() {
        return Err(CreditError::StatusConflict {
            entity: entity.to_string(),
            recorded: current.to_string(),
            attempted: next.to_string(),
        });
    }
    Ok(Transition::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REJECTED: OrderStatus = OrderStatus::Rejected {
        needed: 12,
        available: 10,
        shortfall: 2,
    };

    #[test]
    fn pending_to_terminal_applies() {
        assert_eq!(
            order("o", OrderStatus::Pending, OrderStatus::Settled).unwrap(),
            Transition::Applied
        );
        assert_eq!(
            order("o", OrderStatus::Pending, REJECTED).unwrap(),
            Transition::Applied
        );
    }

    #[test]
    fn same_terminal_is_unchanged() {
        assert_eq!(
            order("o", OrderStatus::Settled, OrderStatus::Settled).unwrap(),
            Transition::Unchanged
        );
        assert_eq!(order("o", REJECTED, REJECTED).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn terminal_flip_conflicts() {
        let err = order("o", OrderStatus::Settled, REJECTED).unwrap_err();
        assert!(matches!(err, CreditError::StatusConflict { .. }));
        let err = order("o", REJECTED, OrderStatus::Pending).unwrap_err();
        assert!(matches!(err, CreditError::StatusConflict { .. }));
    }

    #[test]
    fn balance_request_transitions() {
        use BalanceRequestStatus::{Pending, Processed};
        assert_eq!(
            balance_request("b", Pending, Processed).unwrap(),
            Transition::Applied
        );
        assert_eq!(
            balance_request("b", Processed, Processed).unwrap(),
            Transition::Unchanged
        );
        assert!(balance_request("b", Processed, Pending).is_err());
    }
}
