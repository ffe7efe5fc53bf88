//! # streetcredit-store
//!
//! Persisted state for settleable entities.
//!
//! ## Logical layout
//!
//! ```text
//! orders/{id}            Order            (status is the only mutable field)
//! balancerequests/{id}   BalanceRequest   (status is the only mutable field)
//! ```
//!
//! Balances are *not* here: `users/{id}.balance` is owned by the ledger and
//! nothing in this crate can write it.
//!
//! Status writes go through [`transition`], which makes re-writing the same
//! terminal status a no-op and refuses any other change to a terminal
//! entity. That is what lets the dispatcher retry a status write blindly.

pub mod memory;
pub mod store;
pub mod transition;

#[cfg(any(test, feature = "test-helpers"))]
pub mod flaky;

#[cfg(any(test, feature = "test-helpers"))]
pub use flaky::FlakyStore;
pub use memory::InMemoryStore;
pub use store::SettlementStore;
