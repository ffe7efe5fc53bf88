//! Globally unique identifiers used throughout StreetCredit.
//!
//! All entity IDs use UUIDv7 so that creation order and lexicographic order
//! agree, which the reconciliation view relies on for tie-breaking.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique export-order identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BalanceRequestId
// ---------------------------------------------------------------------------

/// Unique identifier for an approved top-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BalanceRequestId(pub Uuid);

impl BalanceRequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BalanceRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BalanceRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "br:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SettlementKey
// ---------------------------------------------------------------------------

/// Idempotency key for a ledger mutation: the id of the entity whose
/// creation triggered it.
///
/// Orders and balance requests live in separate key spaces, so an order and
/// a top-up can never collide even if their UUIDs were equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SettlementKey {
    Order(OrderId),
    BalanceRequest(BalanceRequestId),
}

impl SettlementKey {
    /// Stable byte encoding used by the journal digest.
    #[must_use]
    pub fn tagged_bytes(&self) -> [u8; 17] {
        let (tag, uuid) = match self {
            Self::Order(id) => (b'o', id.0),
            Self::BalanceRequest(id) => (b'b', id.0),
        };
        let mut out = [0u8; 17];
        out[0] = tag;
        out[1..].copy_from_slice(uuid.as_bytes());
        out
    }
}

impl From<OrderId> for SettlementKey {
    fn from(id: OrderId) -> Self {
        Self::Order(id)
    }
}

impl From<BalanceRequestId> for SettlementKey {
    fn from(id: BalanceRequestId) -> Self {
        Self::BalanceRequest(id)
    }
}

impl fmt::Display for SettlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(id) => write!(f, "order:{id}"),
            Self::BalanceRequest(id) => write!(f, "{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
