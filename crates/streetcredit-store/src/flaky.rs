//! Fault-injecting store wrapper for exercising retry paths.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use streetcredit_types::{
    BalanceRequest, BalanceRequestId, BalanceRequestStatus, CreditError, Order, OrderId,
    OrderStatus, Result, UserId,
};

use crate::store::SettlementStore;

/// Wraps a store and fails the next N status writes with
/// `TransientStorageFailure`. Everything else is passed through.
#[derive(Debug, Default)]
pub struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicU32,
    status_writes: AtomicUsize,
}

impl<S: SettlementStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(0),
            status_writes: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` status writes fail.
    pub fn fail_next_status_writes(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Status writes attempted so far, failed ones included.
    pub fn status_write_attempts(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn maybe_fail(&self) -> Result<()> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            return Err(CreditError::TransientStorageFailure {
                reason: "injected fault".into(),
            });
        }
        Ok(())
    }
}

impl<S: SettlementStore> SettlementStore for FlakyStore<S> {
    fn insert_order(&self, order: Order) -> Result<()> {
        self.inner.insert_order(order)
    }

    fn order(&self, id: OrderId) -> Result<Order> {
        self.inner.order(id)
    }

    fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        self.maybe_fail()?;
        self.inner.set_order_status(id, status)
    }

    fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.inner.orders_for_user(user_id)
    }

    fn pending_orders(&self) -> Result<Vec<Order>> {
        self.inner.pending_orders()
    }

    fn insert_balance_request(&self, request: BalanceRequest) -> Result<()> {
        self.inner.insert_balance_request(request)
    }

    fn balance_request(&self, id: BalanceRequestId) -> Result<BalanceRequest> {
        self.inner.balance_request(id)
    }

    fn set_balance_request_status(
        &self,
        id: BalanceRequestId,
        status: BalanceRequestStatus,
    ) -> Result<()> {
        self.maybe_fail()?;
        self.inner.set_balance_request_status(id, status)
    }

    fn balance_requests_for_user(&self, user_id: UserId) -> Result<Vec<BalanceRequest>> {
        self.inner.balance_requests_for_user(user_id)
    }

    fn pending_balance_requests(&self) -> Result<Vec<BalanceRequest>> {
        self.inner.pending_balance_requests()
    }
}
