//! Top-up (balance request) types.
//!
//! A [`BalanceRequest`] records an approved purchase of credits. Card
//! processing is out of scope: a request exists once an operator has
//! approved the payment, and the dispatcher turns it into a ledger credit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BalanceRequestId, CreditError, Credits, Result, UserId};

/// Lifecycle status of a balance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceRequestStatus {
    Pending,
    Processed,
}

impl BalanceRequestStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

impl std::fmt::Display for BalanceRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processed => write!(f, "PROCESSED"),
        }
    }
}

/// An approved credit purchase awaiting (or done with) settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub id: BalanceRequestId,
    pub user_id: UserId,
    /// Credits to add to the balance.
    pub credits: Credits,
    /// Money received for the credits, in EUR.
    pub amount_paid: Decimal,
    /// Plan label, when bought as a bundle.
    pub plan: Option<String>,
    pub contact_email: Option<String>,
    pub status: BalanceRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl BalanceRequest {
    /// Build a pending request, validating the amounts.
    pub fn pending(user_id: UserId, credits: Credits, amount_paid: Decimal) -> Result<Self> {
        if credits == 0 {
            return Err(CreditError::InvalidBalanceRequest {
                reason: "credits must be > 0".into(),
            });
        }
        if amount_paid.is_sign_negative() {
            return Err(CreditError::InvalidBalanceRequest {
                reason: format!("amount paid cannot be negative: {amount_paid}"),
            });
        }
        Ok(Self {
            id: BalanceRequestId::new(),
            user_id,
            credits,
            amount_paid,
            plan: None,
            contact_email: None,
            status: BalanceRequestStatus::Pending,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == BalanceRequestStatus::Pending
    }
}

/// Credit bundles offered on the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopUpPlan {
    Basic,
    Pro,
    Ultimate,
}

impl TopUpPlan {
    pub const ALL: [Self; 3] = [Self::Basic, Self::Pro, Self::Ultimate];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic Plan",
            Self::Pro => "Pro Plan",
            Self::Ultimate => "Ultimate Plan",
        }
    }

    #[must_use]
    pub fn credits(self) -> Credits {
        match self {
            Self::Basic => 30,
            Self::Pro => 100,
            Self::Ultimate => 170,
        }
    }

    /// Price in EUR.
    #[must_use]
    pub fn price_eur(self) -> Decimal {
        match self {
            Self::Basic => Decimal::new(5, 0),
            Self::Pro => Decimal::new(15, 0),
            Self::Ultimate => Decimal::new(20, 0),
        }
    }
}

impl std::str::FromStr for TopUpPlan {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "ultimate" => Ok(Self::Ultimate),
            other => Err(CreditError::UnknownPlan(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_request_validates_credits() {
        let err = BalanceRequest::pending(UserId::new(), 0, Decimal::ONE).unwrap_err();
        assert!(matches!(err, CreditError::InvalidBalanceRequest { .. }));
    }

    #[test]
    fn pending_request_rejects_negative_payment() {
        let err = BalanceRequest::pending(UserId::new(), 10, Decimal::new(-1, 0)).unwrap_err();
        assert!(matches!(err, CreditError::InvalidBalanceRequest { .. }));
    }

    #[test]
    fn pending_request_starts_pending() {
        let req = BalanceRequest::pending(UserId::new(), 50, Decimal::new(8, 0)).unwrap();
        assert!(req.is_pending());
        assert!(!req.status.is_terminal());
    }

    #[test]
    fn plan_catalogue() {
        assert_eq!(TopUpPlan::Basic.credits(), 30);
        assert_eq!(TopUpPlan::Pro.price_eur(), Decimal::new(15, 0));
        assert_eq!(TopUpPlan::Ultimate.label(), "Ultimate Plan");
        assert_eq!("PRO".parse::<TopUpPlan>().unwrap(), TopUpPlan::Pro);
        assert!(matches!(
            "gold".parse::<TopUpPlan>(),
            Err(CreditError::UnknownPlan(_))
        ));
    }
}
