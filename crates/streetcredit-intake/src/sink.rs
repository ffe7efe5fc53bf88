//! Where intake hands events to the settlement dispatcher.

use streetcredit_types::{CreditError, Result, SettlementEvent};
use tokio::sync::mpsc;

/// Non-blocking event emitter. Intake never waits on the dispatcher.
pub trait EventSink: Send + Sync {
    /// Queue `event` for settlement.
    ///
    /// # Errors
    /// - `QueueFull` if a bounded queue is at capacity
    /// - `QueueClosed` if the dispatcher has gone away
    fn emit(&self, event: SettlementEvent) -> Result<()>;
}

impl EventSink for mpsc::Sender<SettlementEvent> {
    fn emit(&self, event: SettlementEvent) -> Result<()> {
        self.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CreditError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CreditError::QueueClosed,
        })
    }
}

impl EventSink for mpsc::UnboundedSender<SettlementEvent> {
    fn emit(&self, event: SettlementEvent) -> Result<()> {
        self.send(event).map_err(|_| CreditError::QueueClosed)
    }
}
