//! Settlement dispatcher: turns entity-creation events into ledger
//! mutations and terminal statuses.
//!
//! Per event:
//! ```text
//! load entity ──terminal──▶ Duplicate (no ledger call)
//!      │
//!   pending
//!      ▼
//! ledger (keyed by entity id) ──▶ decide status ──▶ status write (retried)
//! ```
//!
//! Only storage reads and status writes are retried. The ledger call runs
//! once per delivery; a redelivery after a failed status write reaches the
//! ledger again, which answers with the recorded outcome instead of
//! mutating twice.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use streetcredit_store::SettlementStore;
use streetcredit_types::{
    BalanceRequestId, BalanceRequestStatus, CreditError, Credits, DispatcherConfig, OrderId,
    OrderStatus, Result, SettlementEvent, SettlementKey, UserId,
};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::ledger::Ledger;

/// What one delivery of an event ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Order debited and marked settled.
    Settled { order_id: OrderId, new_balance: Credits },
    /// Order could not be covered and was marked rejected.
    Rejected { order_id: OrderId, shortfall: Credits },
    /// Balance request credited and marked processed.
    Processed {
        request_id: BalanceRequestId,
        new_balance: Credits,
    },
    /// Entity was already terminal; nothing touched.
    Duplicate(SettlementKey),
    /// Entity could not be settled now and stays pending. An alert was raised.
    LeftPending(SettlementKey),
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub settled: u64,
    pub rejected: u64,
    pub processed: u64,
    pub duplicates: u64,
    /// Events that needed operator attention.
    pub alerts: u64,
    /// Storage operations retried after a transient failure.
    pub write_retries: u64,
}

#[derive(Debug, Default)]
struct Counters {
    settled: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    duplicates: AtomicU64,
    alerts: AtomicU64,
    write_retries: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Consumes [`SettlementEvent`]s and settles them against the [`Ledger`].
pub struct SettlementDispatcher {
    ledger: Arc<Ledger>,
    store: Arc<dyn SettlementStore>,
    config: DispatcherConfig,
    counters: Counters,
}

impl SettlementDispatcher {
    pub fn new(ledger: Arc<Ledger>, store: Arc<dyn SettlementStore>, config: DispatcherConfig) -> Self {
        Self {
            ledger,
            store,
            config,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SettlementStore> {
        &self.store
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        let c = &self.counters;
        DispatchStats {
            settled: c.settled.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            processed: c.processed.load(Ordering::Relaxed),
            duplicates: c.duplicates.load(Ordering::Relaxed),
            alerts: c.alerts.load(Ordering::Relaxed),
            write_retries: c.write_retries.load(Ordering::Relaxed),
        }
    }

    /// Settle one delivery of `event`.
    ///
    /// Safe to call any number of times for the same event.
    ///
    /// # Errors
    /// - a storage error that outlasted every retry, or was not transient
    /// - `StatusConflict` if the store holds a different terminal status
    ///   than the ledger decided (raised as an alert)
    pub async fn dispatch(&self, event: SettlementEvent) -> Result<DispatchOutcome> {
        match event {
            SettlementEvent::OrderCreated {
                order_id,
                quoted_price,
                ..
            } => self.settle_order(order_id, quoted_price).await,
            SettlementEvent::BalanceRequestCreated { request_id, credits, .. } => {
                self.settle_balance_request(request_id, credits).await
            }
        }
    }

    async fn settle_order(&self, order_id: OrderId, event_price: Credits) -> Result<DispatchOutcome> {
        let key = SettlementKey::Order(order_id);
        let order = match self.with_retry(key, || self.store.order(order_id)).await {
            Ok(order) => order,
            Err(e) if e.is_not_found() => return Ok(self.alert(key, &e)),
            Err(e) => return Err(e),
        };

        if order.status.is_terminal() {
            bump(&self.counters.duplicates);
            tracing::debug!(%key, status = %order.status, "order already terminal; skipping");
            return Ok(DispatchOutcome::Duplicate(key));
        }
        if order.quoted_price != event_price {
            tracing::warn!(
                %key,
                stored = order.quoted_price,
                event = event_price,
                "event price differs from stored order; using stored"
            );
        }

        let (status, outcome) = match self.ledger.try_debit(order.user_id, order.quoted_price, order_id) {
            Ok(receipt) => (
                OrderStatus::Settled,
                DispatchOutcome::Settled {
                    order_id,
                    new_balance: receipt.new_balance,
                },
            ),
            Err(CreditError::InsufficientFunds {
                needed,
                available,
                shortfall,
            }) => (
                OrderStatus::Rejected {
                    needed,
                    available,
                    shortfall,
                },
                DispatchOutcome::Rejected { order_id, shortfall },
            ),
            Err(e) if e.is_not_found() => return Ok(self.alert(key, &e)),
            Err(e) => return Err(e),
        };

        if let Err(e) = self
            .with_retry(key, || self.store.set_order_status(order_id, status))
            .await
        {
            return self.status_write_failed(key, order.user_id, e);
        }

        match outcome {
            DispatchOutcome::Settled { .. } => bump(&self.counters.settled),
            _ => bump(&self.counters.rejected),
        }
        tracing::info!(%key, user_id = %order.user_id, %status, "order settled");
        Ok(outcome)
    }

    async fn settle_balance_request(
        &self,
        request_id: BalanceRequestId,
        event_credits: Credits,
    ) -> Result<DispatchOutcome> {
        let key = SettlementKey::BalanceRequest(request_id);
        let request = match self
            .with_retry(key, || self.store.balance_request(request_id))
            .await
        {
            Ok(request) => request,
            Err(e) if e.is_not_found() => return Ok(self.alert(key, &e)),
            Err(e) => return Err(e),
        };

        if request.status.is_terminal() {
            bump(&self.counters.duplicates);
            tracing::debug!(%key, "balance request already processed; skipping");
            return Ok(DispatchOutcome::Duplicate(key));
        }
        if request.credits != event_credits {
            tracing::warn!(
                %key,
                stored = request.credits,
                event = event_credits,
                "event credits differ from stored request; using stored"
            );
        }

        let receipt = match self.ledger.credit(request.user_id, request.credits, request_id) {
            Ok(receipt) => receipt,
            Err(e) if e.is_not_found() => return Ok(self.alert(key, &e)),
            Err(e @ CreditError::BalanceOverflow(_)) => return Ok(self.alert(key, &e)),
            Err(e) => return Err(e),
        };

        if let Err(e) = self
            .with_retry(key, || {
                self.store
                    .set_balance_request_status(request_id, BalanceRequestStatus::Processed)
            })
            .await
        {
            return self.status_write_failed(key, request.user_id, e);
        }

        bump(&self.counters.processed);
        tracing::info!(%key, user_id = %request.user_id, credits = request.credits, balance = receipt.new_balance, "balance request processed");
        Ok(DispatchOutcome::Processed {
            request_id,
            new_balance: receipt.new_balance,
        })
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of
    /// attempts. Only transient failures are retried.
    async fn with_retry<T>(&self, key: SettlementKey, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let max = self.config.max_status_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max => {
                    let delay = self.config.backoff_for(attempt);
                    bump(&self.counters.write_retries);
                    tracing::warn!(%key, attempt, max, ?delay, error = %e, "storage operation failed; retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn status_write_failed(&self, key: SettlementKey, user_id: UserId, e: CreditError) -> Result<DispatchOutcome> {
        bump(&self.counters.alerts);
        if e.is_transient() {
            // The ledger outcome is recorded; a redrive will write the status.
            tracing::error!(%key, %user_id, error = %e, "status write retries exhausted; entity left pending");
            Ok(DispatchOutcome::LeftPending(key))
        } else {
            tracing::error!(%key, %user_id, error = %e, "status write refused");
            Err(e)
        }
    }

    fn alert(&self, key: SettlementKey, e: &CreditError) -> DispatchOutcome {
        bump(&self.counters.alerts);
        tracing::error!(%key, error = %e, "cannot settle; entity left pending");
        DispatchOutcome::LeftPending(key)
    }

    /// Events for every entity the store still holds as pending, oldest first.
    pub fn pending_events(&self) -> Result<Vec<SettlementEvent>> {
        let mut pending: Vec<(chrono::DateTime<chrono::Utc>, SettlementKey, SettlementEvent)> =
            Vec::new();
        for order in self.store.pending_orders()? {
            pending.push((
                order.created_at,
                SettlementKey::Order(order.id),
                SettlementEvent::OrderCreated {
                    order_id: order.id,
                    user_id: order.user_id,
                    quoted_price: order.quoted_price,
                },
            ));
        }
        for request in self.store.pending_balance_requests()? {
            pending.push((
                request.created_at,
                SettlementKey::BalanceRequest(request.id),
                SettlementEvent::BalanceRequestCreated {
                    request_id: request.id,
                    user_id: request.user_id,
                    credits: request.credits,
                },
            ));
        }
        pending.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(pending.into_iter().map(|(_, _, event)| event).collect())
    }

    /// Re-dispatch everything still pending, one at a time in creation
    /// order. Recovers entities whose event was lost or whose status write
    /// gave up.
    pub async fn redrive_pending(&self) -> Result<Vec<DispatchOutcome>> {
        let events = self.pending_events()?;
        if !events.is_empty() {
            tracing::info!(count = events.len(), "redriving pending entities");
        }
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            match self.dispatch(event).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(key = %event.key(), error = %e, "redrive failed");
                    outcomes.push(DispatchOutcome::LeftPending(event.key()));
                }
            }
        }
        Ok(outcomes)
    }

    /// Redrive everything pending and log what could not be finished.
    async fn sweep(&self) {
        match self.redrive_pending().await {
            Ok(outcomes) => {
                let left = outcomes
                    .iter()
                    .filter(|o| matches!(o, DispatchOutcome::LeftPending(_)))
                    .count();
                if left > 0 {
                    tracing::warn!(left, swept = outcomes.len(), "pending sweep left entities pending");
                }
            }
            Err(e) => tracing::error!(error = %e, "pending sweep failed"),
        }
    }

    /// Consume `rx` until every sender is dropped, with at most
    /// `max_in_flight` events settling at once. Returns the final counters
    /// after all in-flight work has finished.
    ///
    /// Pending entities are swept once on start and again every
    /// `redrive_interval_ms`, so an entity whose event was lost or whose
    /// status write gave up is finished without outside help.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<SettlementEvent>) -> DispatchStats {
        let limit = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut tasks = JoinSet::new();
        tracing::info!(
            max_in_flight = self.config.max_in_flight,
            redrive_interval_ms = self.config.redrive_interval_ms,
            "settlement dispatcher started"
        );

        self.sweep().await;

        let period = self.config.redrive_interval();
        let mut redrive = time::interval_at(time::Instant::now() + period, period);
        redrive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(event) = received else {
                        break;
                    };
                    let Ok(permit) = Arc::clone(&limit).acquire_owned().await else {
                        break;
                    };
                    let this = Arc::clone(&self);
                    tasks.spawn(async move {
                        let _permit = permit;
                        if let Err(e) = this.dispatch(event).await {
                            tracing::error!(key = %event.key(), error = %e, "dispatch failed");
                        }
                    });
                }
                _ = redrive.tick() => self.sweep().await,
            }
            while let Some(done) = tasks.try_join_next() {
                log_join(done);
            }
        }

        while let Some(done) = tasks.join_next().await {
            log_join(done);
        }
        let stats = self.stats();
        tracing::info!(?stats, "event queue closed; settlement dispatcher stopped");
        stats
    }
}

fn log_join(done: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        tracing::error!(error = %e, "settlement task panicked");
    }
}
