//! The storage seam between intake, dispatcher, and reconciliation.

use streetcredit_types::{
    BalanceRequest, BalanceRequestId, BalanceRequestStatus, Order, OrderId, OrderStatus, Result,
    UserId,
};

/// Durable home of orders and balance requests.
///
/// Implementations must make each method atomic on its own. Status setters
/// must follow [`crate::transition`] semantics: same terminal status again is
/// `Ok(())`, a different one is `StatusConflict`.
pub trait SettlementStore: Send + Sync {
    /// Persist a new order. Fails with `DuplicateEntity` if the id exists.
    fn insert_order(&self, order: Order) -> Result<()>;

    /// Load an order, or `OrderNotFound`.
    fn order(&self, id: OrderId) -> Result<Order>;

    /// Write the order's status.
    fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// All orders of one user, in no particular order.
    fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Every order still awaiting settlement.
    fn pending_orders(&self) -> Result<Vec<Order>>;

    /// Persist a new balance request. Fails with `DuplicateEntity` if the id exists.
    fn insert_balance_request(&self, request: BalanceRequest) -> Result<()>;

    /// Load a balance request, or `BalanceRequestNotFound`.
    fn balance_request(&self, id: BalanceRequestId) -> Result<BalanceRequest>;

    /// Write the request's status.
    fn set_balance_request_status(
        &self,
        id: BalanceRequestId,
        status: BalanceRequestStatus,
    ) -> Result<()>;

    /// All balance requests of one user, in no particular order.
    fn balance_requests_for_user(&self, user_id: UserId) -> Result<Vec<BalanceRequest>>;

    /// Every balance request still awaiting settlement.
    fn pending_balance_requests(&self) -> Result<Vec<BalanceRequest>>;
}
