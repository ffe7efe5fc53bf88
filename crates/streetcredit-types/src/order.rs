//! Export order types.
//!
//! An [`Order`] is created once by order intake and never edited afterwards,
//! except for its [`OrderStatus`], which the settlement dispatcher moves from
//! `Pending` to exactly one terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Credits, OrderId, SelectionItem, SelectionMode, UserId};

/// File format the client will export. Carried on the order, not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Obj,
    Gltf,
    Stl,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Obj => write!(f, "obj"),
            Self::Gltf => write!(f, "gltf"),
            Self::Stl => write!(f, "stl"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::CreditError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "obj" => Ok(Self::Obj),
            "gltf" | "glb" => Ok(Self::Gltf),
            "stl" => Ok(Self::Stl),
            other => Err(crate::CreditError::Configuration(format!(
                "unknown export format: {other}"
            ))),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrderStatus {
    /// Persisted, awaiting settlement.
    Pending,
    /// The ledger debited `quoted_price`.
    Settled,
    /// The ledger could not cover the debit; balance untouched.
    Rejected {
        needed: Credits,
        available: Credits,
        shortfall: Credits,
    },
}

impl OrderStatus {
    /// Terminal statuses never transition again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Rejected { shortfall, .. } => write!(f, "REJECTED(short {shortfall})"),
        }
    }
}

/// A request to export `objects_count` objects at a locked-in price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub objects_count: usize,
    /// Preset the selection was made with; `None` when picked by hand.
    pub selection_mode: Option<SelectionMode>,
    pub export_format: ExportFormat,
    /// Unit price at quote time.
    pub unit_price: Credits,
    /// `objects_count × unit_price`, fixed at creation.
    pub quoted_price: Credits,
    pub specs: Vec<SelectionItem>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Age of the order relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A pending order for `user_id` of `count` dummy objects at `unit_price`.
    pub fn dummy(user_id: UserId, count: usize, unit_price: Credits) -> Self {
        let specs = SelectionItem::dummies(count);
        Self {
            id: OrderId::new(),
            user_id,
            objects_count: count,
            selection_mode: None,
            export_format: ExportFormat::Obj,
            unit_price,
            quoted_price: unit_price * count as Credits,
            specs,
            created_at: Utc::now(),
            status: OrderStatus::Pending,
        }
    }
}
