//! Entity-creation events consumed by the settlement dispatcher.
//!
//! Delivery is at-least-once: the same event may arrive any number of
//! times, and every handler must treat repeats as no-ops.

use serde::{Deserialize, Serialize};

use crate::{BalanceRequestId, Credits, OrderId, SettlementKey, UserId};

/// Notification that a settleable entity was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementEvent {
    OrderCreated {
        order_id: OrderId,
        user_id: UserId,
        quoted_price: Credits,
    },
    BalanceRequestCreated {
        request_id: BalanceRequestId,
        user_id: UserId,
        credits: Credits,
    },
}

impl SettlementEvent {
    /// Idempotency key of the entity this event refers to.
    #[must_use]
    pub fn key(&self) -> SettlementKey {
        match self {
            Self::OrderCreated { order_id, .. } => SettlementKey::Order(*order_id),
            Self::BalanceRequestCreated { request_id, .. } => {
                SettlementKey::BalanceRequest(*request_id)
            }
        }
    }
}
