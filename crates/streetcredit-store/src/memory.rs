//! In-memory store backed by `DashMap`.
//!
//! Each map is sharded, so status writes for different entities do not
//! contend. Every read returns a clone; callers never hold a shard guard.

use dashmap::{mapref::entry::Entry, DashMap};
use streetcredit_types::{
    BalanceRequest, BalanceRequestId, BalanceRequestStatus, CreditError, Order, OrderId,
    OrderStatus, Result, UserId,
};

use crate::store::SettlementStore;
use crate::transition::{self, Transition};

/// Process-local [`SettlementStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    orders: DashMap<OrderId, Order>,
    balance_requests: DashMap<BalanceRequestId, BalanceRequest>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of stored balance requests.
    #[must_use]
    pub fn balance_request_count(&self) -> usize {
        self.balance_requests.len()
    }
}

impl SettlementStore for InMemoryStore {
    fn insert_order(&self, order: Order) -> Result<()> {
        match self.orders.entry(order.id) {
            Entry::Occupied(_) => Err(CreditError::DuplicateEntity(format!("order {}", order.id))),
            Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(())
            }
        }
    }

    fn order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or(CreditError::OrderNotFound(id))
    }

    fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or(CreditError::OrderNotFound(id))?;
        let entity = format!("order {id}");
        match transition::order(&entity, order.status, status)? {
            Transition::Applied => order.status = status,
            Transition::Unchanged => tracing::debug!(order_id = %id, %status, "order status already recorded"),
        }
        Ok(())
    }

    fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .map(|o| o.value().clone())
            .collect())
    }

    fn pending_orders(&self) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.is_pending())
            .map(|o| o.value().clone())
            .collect())
    }

    fn insert_balance_request(&self, request: BalanceRequest) -> Result<()> {
        match self.balance_requests.entry(request.id) {
            Entry::Occupied(_) => Err(CreditError::DuplicateEntity(format!(
                "balance request {}",
                request.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(request);
                Ok(())
            }
        }
    }

    fn balance_request(&self, id: BalanceRequestId) -> Result<BalanceRequest> {
        self.balance_requests
            .get(&id)
            .map(|r| r.clone())
            .ok_or(CreditError::BalanceRequestNotFound(id))
    }

    fn set_balance_request_status(
        &self,
        id: BalanceRequestId,
        status: BalanceRequestStatus,
    ) -> Result<()> {
        let mut request = self
            .balance_requests
            .get_mut(&id)
            .ok_or(CreditError::BalanceRequestNotFound(id))?;
        let entity = format!("balance request {id}");
        match transition::balance_request(&entity, request.status, status)? {
            Transition::Applied => request.status = status,
            Transition::Unchanged => tracing::debug!(request_id = %id, %status, "balance request status already recorded"),
        }
        Ok(())
    }

    fn balance_requests_for_user(&self, user_id: UserId) -> Result<Vec<BalanceRequest>> {
        Ok(self
            .balance_requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    fn pending_balance_requests(&self) -> Result<Vec<BalanceRequest>> {
        Ok(self
            .balance_requests
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.value().clone())
            .collect())
    }
}
