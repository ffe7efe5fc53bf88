//! Error types for the StreetCredit settlement engine.
//!
//! All errors use the `SC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Selection / pricing errors
//! - 2xx: Ledger / balance errors
//! - 3xx: Order and balance-request errors
//! - 4xx: Storage errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{BalanceRequestId, Credits, OrderId, SettlementKey, UserId};

/// Central error enum for all StreetCredit operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    // =================================================================
    // Selection / Pricing Errors (1xx)
    // =================================================================
    /// Nothing was selected; zero-cost orders are never submitted.
    #[error("SC_ERR_100: Nothing selected for export")]
    NothingSelected,

    /// `count × unit_price` does not fit in a credit amount.
    #[error("SC_ERR_101: Quote overflow: {count} objects at {unit_price} credits")]
    QuoteOverflow { count: usize, unit_price: Credits },

    /// The published unit price is unusable (e.g. zero).
    #[error("SC_ERR_102: Invalid unit price: {0}")]
    InvalidUnitPrice(Credits),

    /// The selection already holds the maximum number of items.
    #[error("SC_ERR_103: Selection full ({max} items)")]
    SelectionFull { max: usize },

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// The account cannot cover the debit. Terminal, never retried.
    #[error(
        "SC_ERR_200: Insufficient funds: need {needed}, have {available} (short by {shortfall})"
    )]
    InsufficientFunds {
        needed: Credits,
        available: Credits,
        shortfall: Credits,
    },

    /// The referenced user has no ledger account.
    #[error("SC_ERR_201: User not found: {0}")]
    UserNotFound(UserId),

    /// An account for this user already exists.
    #[error("SC_ERR_202: Account already exists: {0}")]
    DuplicateAccount(UserId),

    /// A credit would overflow the balance.
    #[error("SC_ERR_203: Balance overflow for user {0}")]
    BalanceOverflow(UserId),

    /// Ledger completeness check failed. Critical audit alert.
    #[error("SC_ERR_204: Ledger invariant violation: {reason}")]
    LedgerInvariantViolation { reason: String },

    /// The idempotency key was already recorded (guard-level; the ledger
    /// itself answers repeats with the recorded outcome instead).
    #[error("SC_ERR_205: Settlement key already applied: {0}")]
    AlreadyApplied(SettlementKey),

    // =================================================================
    // Order / BalanceRequest Errors (3xx)
    // =================================================================
    /// The requested order was not found.
    #[error("SC_ERR_300: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested balance request was not found.
    #[error("SC_ERR_301: Balance request not found: {0}")]
    BalanceRequestNotFound(BalanceRequestId),

    /// An entity with this ID already exists.
    #[error("SC_ERR_302: Duplicate entity: {0}")]
    DuplicateEntity(String),

    /// A terminal status was already recorded with a different outcome.
    #[error("SC_ERR_303: Status conflict for {entity}: recorded {recorded}, attempted {attempted}")]
    StatusConflict {
        entity: String,
        recorded: String,
        attempted: String,
    },

    /// The balance request is malformed (zero credits, negative payment, ...).
    #[error("SC_ERR_304: Invalid balance request: {reason}")]
    InvalidBalanceRequest { reason: String },

    /// Unknown top-up plan name.
    #[error("SC_ERR_305: Unknown top-up plan: {0}")]
    UnknownPlan(String),

    // =================================================================
    // Storage Errors (4xx)
    // =================================================================
    /// Storage write failed for a reason that may clear on retry.
    #[error("SC_ERR_400: Transient storage failure: {reason}")]
    TransientStorageFailure { reason: String },

    /// The settlement event queue is closed.
    #[error("SC_ERR_401: Event queue closed")]
    QueueClosed,

    /// The settlement event queue is at capacity.
    #[error("SC_ERR_402: Event queue full")]
    QueueFull,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("SC_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl CreditError {
    /// Whether the failure may clear on retry.
    ///
    /// Only storage hiccups are transient. `InsufficientFunds` in particular is
    /// a settled fact about the account, not a condition to wait out.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorageFailure { .. })
    }

    /// Whether the error means a referenced user or entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::OrderNotFound(_) | Self::BalanceRequestNotFound(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CreditError>;

impl From<serde_json::Error> for CreditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
