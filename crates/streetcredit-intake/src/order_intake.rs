//! Order intake: persist a pending order at the quoted price, then notify
//! the dispatcher.

use std::sync::Arc;

use chrono::Utc;
use streetcredit_pricing::Selection;
use streetcredit_store::SettlementStore;
use streetcredit_types::{
    Credits, ExportFormat, Order, OrderId, OrderStatus, Result, SettlementEvent, UserId,
};

use crate::sink::EventSink;

/// Accepts export orders. Never reads or writes a balance.
pub struct OrderIntake {
    store: Arc<dyn SettlementStore>,
    sink: Arc<dyn EventSink>,
}

impl OrderIntake {
    pub fn new(store: Arc<dyn SettlementStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Submit `selection` at the unit price the user was quoted.
    ///
    /// The price is locked here: a later change to the published unit price
    /// does not alter this order. Returns as soon as the order is stored;
    /// settlement happens asynchronously.
    ///
    /// If the event cannot be queued the order stays pending and is logged;
    /// the dispatcher's redrive sweep picks it up.
    ///
    /// # Errors
    /// - `NothingSelected` for an empty selection (nothing is stored)
    /// - `InvalidUnitPrice` / `QuoteOverflow` from quoting
    /// - storage errors from persisting the order
    pub fn submit(
        &self,
        user_id: UserId,
        selection: &Selection,
        unit_price: Credits,
        export_format: ExportFormat,
    ) -> Result<OrderId> {
        let (objects_count, unit_price, quoted_price) = selection.quote(unit_price)?.require_priced()?;

        let order = Order {
            id: OrderId::new(),
            user_id,
            objects_count,
            selection_mode: selection.mode(),
            export_format,
            unit_price,
            quoted_price,
            specs: selection.items().to_vec(),
            created_at: Utc::now(),
            status: OrderStatus::Pending,
        };
        let order_id = order.id;
        self.store.insert_order(order)?;
        tracing::info!(%order_id, %user_id, objects_count, quoted_price, %export_format, "order accepted");

        let event = SettlementEvent::OrderCreated {
            order_id,
            user_id,
            quoted_price,
        };
        if let Err(e) = self.sink.emit(event) {
            tracing::error!(%order_id, %user_id, error = %e, "order stored but event not queued; awaiting redrive");
        }
        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use streetcredit_store::InMemoryStore;
    use streetcredit_types::{CreditError, SelectionItem, SelectionMode};
    use tokio::sync::mpsc;

    use super::*;

    fn selection(n: usize) -> Selection {
        let mut sel = Selection::new();
        for item in SelectionItem::dummies(n) {
            sel.select(item).unwrap();
        }
        sel
    }

    #[test]
    fn submit_persists_pending_and_emits() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let intake = OrderIntake::new(store.clone(), Arc::new(tx));
        let user = UserId::new();

        let id = intake.submit(user, &selection(3), 3, ExportFormat::Gltf).unwrap();

        let order = store.order(id).unwrap();
        assert!(order.is_pending());
        assert_eq!(order.objects_count, 3);
        assert_eq!(order.quoted_price, 9);
        assert_eq!(order.unit_price, 3);
        assert_eq!(order.specs.len(), 3);
        assert_eq!(order.selection_mode, None);
        assert_eq!(
            rx.try_recv().unwrap(),
            SettlementEvent::OrderCreated {
                order_id: id,
                user_id: user,
                quoted_price: 9
            }
        );
    }

    #[test]
    fn empty_selection_refused_and_nothing_stored() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let intake = OrderIntake::new(store.clone(), Arc::new(tx));

        let err = intake
            .submit(UserId::new(), &Selection::new(), 3, ExportFormat::Obj)
            .unwrap_err();
        assert_eq!(err, CreditError::NothingSelected);
        assert_eq!(store.order_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_keeps_order_pending() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, rx) = mpsc::channel::<SettlementEvent>(1);
        drop(rx);
        let intake = OrderIntake::new(store.clone(), Arc::new(tx));

        let id = intake
            .submit(UserId::new(), &selection(1), 3, ExportFormat::Stl)
            .unwrap();
        assert!(store.order(id).unwrap().is_pending());
        assert_eq!(store.pending_orders().unwrap().len(), 1);
    }

    #[test]
    fn price_locked_at_submission() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let intake = OrderIntake::new(store.clone(), Arc::new(tx));
        let user = UserId::new();
        let sel = selection(2);

        let cheap = intake.submit(user, &sel, 3, ExportFormat::Obj).unwrap();
        let dear = intake.submit(user, &sel, 5, ExportFormat::Obj).unwrap();
        assert_eq!(store.order(cheap).unwrap().quoted_price, 6);
        assert_eq!(store.order(dear).unwrap().quoted_price, 10);
    }

    #[test]
    fn preset_mode_recorded_on_order() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let intake = OrderIntake::new(store.clone(), Arc::new(tx));
        let scene = vec![
            SelectionItem::new("Road", "Mesh"),
            SelectionItem::new("Sidewalk Left", "Mesh"),
            SelectionItem::new("Sidewalk Right", "Mesh"),
            SelectionItem::new("Tree 0", "Group"),
            SelectionItem::new("Sun", "DirectionalLight"),
        ];

        let mut sel = Selection::new();
        sel.select_road_set(&scene).unwrap();
        let road = intake.submit(UserId::new(), &sel, 3, ExportFormat::Obj).unwrap();
        sel.select_street_set(&scene).unwrap();
        let everything = intake.submit(UserId::new(), &sel, 3, ExportFormat::Obj).unwrap();

        let road = store.order(road).unwrap();
        assert_eq!(road.selection_mode, Some(SelectionMode::Road));
        assert_eq!(road.quoted_price, 9);
        let everything = store.order(everything).unwrap();
        assert_eq!(everything.selection_mode, Some(SelectionMode::Everything));
        assert_eq!(everything.objects_count, 4);
    }
}
