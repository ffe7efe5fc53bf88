//! Read-only view of a user's orders and top-ups, as the history page
//! shows them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use streetcredit_store::SettlementStore;
use streetcredit_types::{
    BalanceRequest, Credits, ExportFormat, Order, OrderId, OrderStatus, ReconciliationConfig,
    Result, UserId,
};

/// How an order is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrderDisplay {
    /// Pending and younger than the processing threshold.
    Pending,
    /// Still pending past the threshold. Surfaced, never dropped.
    Processing,
    Settled,
    Rejected { shortfall: Credits },
}

impl std::fmt::Display for OrderDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Settled => write!(f, "settled"),
            Self::Rejected { shortfall } => write!(f, "rejected (short {shortfall} credits)"),
        }
    }
}

/// One history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub objects_count: usize,
    pub quoted_price: Credits,
    pub export_format: ExportFormat,
    pub created_at: DateTime<Utc>,
    pub display: OrderDisplay,
}

pub struct ReconciliationView {
    store: Arc<dyn SettlementStore>,
    config: ReconciliationConfig,
}

impl ReconciliationView {
    pub fn new(store: Arc<dyn SettlementStore>, config: ReconciliationConfig) -> Self {
        Self { store, config }
    }

    /// The user's orders, newest first. Equal timestamps fall back to id,
    /// also descending.
    pub fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut orders = self.store.orders_for_user(user_id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// The user's balance requests, newest first.
    pub fn list_balance_requests(&self, user_id: UserId) -> Result<Vec<BalanceRequest>> {
        let mut requests = self.store.balance_requests_for_user(user_id)?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    /// Display rows for [`Self::list_orders`] as of `now`.
    pub fn order_views(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<OrderView>> {
        let threshold = self.config.processing_after();
        Ok(self
            .list_orders(user_id)?
            .into_iter()
            .map(|order| {
                let display = match order.status {
                    OrderStatus::Pending if order.age(now) >= threshold => OrderDisplay::Processing,
                    OrderStatus::Pending => OrderDisplay::Pending,
                    OrderStatus::Settled => OrderDisplay::Settled,
                    OrderStatus::Rejected { shortfall, .. } => OrderDisplay::Rejected { shortfall },
                };
                OrderView {
                    order_id: order.id,
                    objects_count: order.objects_count,
                    quoted_price: order.quoted_price,
                    export_format: order.export_format,
                    created_at: order.created_at,
                    display,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use streetcredit_store::InMemoryStore;

    use super::*;

    fn view() -> (ReconciliationView, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let view = ReconciliationView::new(store.clone(), ReconciliationConfig::default());
        (view, store)
    }

    #[test]
    fn newest_first_with_id_tiebreak() {
        let (view, store) = view();
        let user = UserId::new();
        let t0 = Utc::now();

        let mut old = Order::dummy(user, 1, 3);
        old.created_at = t0 - Duration::minutes(5);
        let mut tie_a = Order::dummy(user, 2, 3);
        tie_a.created_at = t0;
        let mut tie_b = Order::dummy(user, 3, 3);
        tie_b.created_at = t0;
        let (old_id, a_id, b_id) = (old.id, tie_a.id, tie_b.id);
        assert!(a_id < b_id);

        for o in [tie_a, old, tie_b] {
            store.insert_order(o).unwrap();
        }
        store.insert_order(Order::dummy(UserId::new(), 1, 3)).unwrap();

        let ids: Vec<OrderId> = view.list_orders(user).unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![b_id, a_id, old_id]);
    }

    #[test]
    fn display_states() {
        let (view, store) = view();
        let user = UserId::new();
        let now = Utc::now();

        let mut stale = Order::dummy(user, 1, 3);
        stale.created_at = now - Duration::minutes(10);
        let fresh = Order::dummy(user, 1, 3);
        let mut settled = Order::dummy(user, 1, 3);
        settled.status = OrderStatus::Settled;
        let mut rejected = Order::dummy(user, 4, 3);
        rejected.status = OrderStatus::Rejected {
            needed: 12,
            available: 10,
            shortfall: 2,
        };
        let ids = [stale.id, fresh.id, settled.id, rejected.id];
        for o in [stale, fresh, settled, rejected] {
            store.insert_order(o).unwrap();
        }

        let rows = view.order_views(user, now).unwrap();
        let by_id = |id| rows.iter().find(|r| r.order_id == id).unwrap().display;
        assert_eq!(by_id(ids[0]), OrderDisplay::Processing);
        assert_eq!(by_id(ids[1]), OrderDisplay::Pending);
        assert_eq!(by_id(ids[2]), OrderDisplay::Settled);
        assert_eq!(by_id(ids[3]), OrderDisplay::Rejected { shortfall: 2 });
    }

    #[test]
    fn display_serializes_tagged() {
        let json = serde_json::to_value(OrderDisplay::Rejected { shortfall: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "rejected", "shortfall": 2}));
        assert_eq!(OrderDisplay::Processing.to_string(), "processing");
    }

    #[test]
    fn empty_history() {
        let (view, _store) = view();
        let user = UserId::new();
        assert!(view.list_orders(user).unwrap().is_empty());
        assert!(view.list_balance_requests(user).unwrap().is_empty());
    }
}
