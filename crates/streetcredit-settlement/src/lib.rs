//! # streetcredit-settlement
//!
//! **Settlement plane**: the only code that mutates a user's credit balance.
//!
//! ## Architecture
//!
//! The settlement plane receives [`SettlementEvent`]s and:
//! 1. Skips entities that already reached a terminal status (duplicate delivery)
//! 2. Applies the ledger mutation under the account's exclusive lock,
//!    keyed by the entity id (no double-debit, no double-credit)
//! 3. Writes the terminal status, retrying storage hiccups with backoff
//! 4. Keeps an append-only journal so every balance can be re-derived
//!
//! ## Per-user serialization
//!
//! Accounts live in a sharded concurrent map. A debit or credit holds the
//! account entry's write guard across its compare-and-mutate step, so two
//! settlements for the same user never interleave while settlements for
//! different users run in parallel.
//!
//! [`SettlementEvent`]: streetcredit_types::SettlementEvent

pub mod audit;
pub mod dispatcher;
pub mod idempotency;
pub mod ledger;
pub mod reconciliation;

pub use audit::{AuditReport, journal_digest, reconcile_user, verify_journal};
pub use dispatcher::{DispatchOutcome, DispatchStats, SettlementDispatcher};
pub use idempotency::IdempotencyGuard;
pub use ledger::Ledger;
pub use reconciliation::{OrderDisplay, OrderView, ReconciliationView};
