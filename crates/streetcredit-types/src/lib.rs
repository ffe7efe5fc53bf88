//! # streetcredit-types
//!
//! Shared types, errors, and configuration for the **StreetCredit**
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`OrderId`], [`BalanceRequestId`], [`SettlementKey`]
//! - **Account model**: [`Account`], [`Credits`]
//! - **Selection model**: [`SelectionItem`], [`SelectionMode`]
//! - **Order model**: [`Order`], [`OrderStatus`], [`ExportFormat`]
//! - **Top-up model**: [`BalanceRequest`], [`BalanceRequestStatus`], [`TopUpPlan`]
//! - **Events**: [`SettlementEvent`]
//! - **Receipts / journal**: [`DebitReceipt`], [`CreditReceipt`], [`LedgerEntry`]
//! - **Configuration**: [`EngineConfig`], [`PriceConfig`], [`DispatcherConfig`], [`ReconciliationConfig`]
//! - **Errors**: [`CreditError`] with `SC_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod account;
pub mod balance_request;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod receipt;
pub mod selection;

// Re-export all primary types at crate root for ergonomic imports:
//   use streetcredit_types::{Order, OrderStatus, BalanceRequest, ...};

pub use account::*;
pub use balance_request::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use receipt::*;
pub use selection::*;

// Constants are accessed via `streetcredit_types::constants::FOO`
// (not re-exported to avoid name collisions).
