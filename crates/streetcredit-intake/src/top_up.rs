//! Top-up desk: records an approved credit purchase as a pending balance
//! request. Payment itself is handled elsewhere; by the time `approve` is
//! called the money has been received.

use std::sync::Arc;

use rust_decimal::Decimal;
use streetcredit_store::SettlementStore;
use streetcredit_types::{
    BalanceRequest, BalanceRequestId, Credits, Result, SettlementEvent, TopUpPlan, UserId,
};

use crate::sink::EventSink;

/// What was bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUpAmount {
    Plan(TopUpPlan),
    Custom(Credits),
}

impl TopUpAmount {
    #[must_use]
    pub fn credits(self) -> Credits {
        match self {
            Self::Plan(plan) => plan.credits(),
            Self::Custom(credits) => credits,
        }
    }
}

impl From<TopUpPlan> for TopUpAmount {
    fn from(plan: TopUpPlan) -> Self {
        Self::Plan(plan)
    }
}

pub struct TopUpDesk {
    store: Arc<dyn SettlementStore>,
    sink: Arc<dyn EventSink>,
}

impl TopUpDesk {
    pub fn new(store: Arc<dyn SettlementStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Persist a pending balance request and queue it for settlement.
    ///
    /// # Errors
    /// - `InvalidBalanceRequest` for zero credits or a negative payment
    /// - storage errors from persisting the request
    pub fn approve(
        &self,
        user_id: UserId,
        amount: impl Into<TopUpAmount>,
        amount_paid: Decimal,
        contact_email: Option<String>,
    ) -> Result<BalanceRequestId> {
        let amount = amount.into();
        let mut request = BalanceRequest::pending(user_id, amount.credits(), amount_paid)?;
        if let TopUpAmount::Plan(plan) = amount {
            request.plan = Some(plan.label().to_string());
        }
        request.contact_email = contact_email;

        let request_id = request.id;
        let credits = request.credits;
        self.store.insert_balance_request(request)?;
        tracing::info!(%request_id, %user_id, credits, %amount_paid, "top-up approved");

        let event = SettlementEvent::BalanceRequestCreated {
            request_id,
            user_id,
            credits,
        };
        if let Err(e) = self.sink.emit(event) {
            tracing::error!(%request_id, %user_id, error = %e, "balance request stored but event not queued; awaiting redrive");
        }
        Ok(request_id)
    }
}

#[cfg(test)]
mod tests {
    use streetcredit_store::InMemoryStore;
    use streetcredit_types::CreditError;
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn plan_purchase_records_label_and_credits() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let desk = TopUpDesk::new(store.clone(), Arc::new(tx));
        let user = UserId::new();

        let id = desk
            .approve(user, TopUpPlan::Pro, TopUpPlan::Pro.price_eur(), Some("ada@example.com".into()))
            .unwrap();

        let request = store.balance_request(id).unwrap();
        assert!(request.is_pending());
        assert_eq!(request.credits, 100);
        assert_eq!(request.plan.as_deref(), Some("Pro Plan"));
        assert_eq!(request.contact_email.as_deref(), Some("ada@example.com"));
        assert_eq!(
            rx.try_recv().unwrap(),
            SettlementEvent::BalanceRequestCreated {
                request_id: id,
                user_id: user,
                credits: 100
            }
        );
    }

    #[test]
    fn custom_amount() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, _rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let desk = TopUpDesk::new(store.clone(), Arc::new(tx));

        let id = desk
            .approve(UserId::new(), TopUpAmount::Custom(50), Decimal::new(8, 0), None)
            .unwrap();
        let request = store.balance_request(id).unwrap();
        assert_eq!(request.credits, 50);
        assert_eq!(request.plan, None);
    }

    #[test]
    fn zero_credits_refused() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<SettlementEvent>();
        let desk = TopUpDesk::new(store.clone(), Arc::new(tx));

        let err = desk
            .approve(UserId::new(), TopUpAmount::Custom(0), Decimal::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, CreditError::InvalidBalanceRequest { .. }));
        assert_eq!(store.balance_request_count(), 0);
        assert!(rx.try_recv().is_err());
    }
}
