//! Configuration types for the settlement engine.
//!
//! Every section has a `Default` built from [`crate::constants`], so a
//! config file only needs to name the values it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{constants, CreditError, Credits, Result};

/// Process-wide pricing, published by the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceConfig {
    /// Credits charged per exported object.
    pub object_unit_price: Credits,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            object_unit_price: constants::DEFAULT_OBJECT_UNIT_PRICE,
        }
    }
}

/// Settlement dispatcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Events processed concurrently (across all users).
    pub max_in_flight: usize,
    /// Bounded capacity of the event queue.
    pub queue_capacity: usize,
    /// Attempts for one status write, including the first.
    pub max_status_write_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Cap on the doubled retry delay.
    pub max_backoff_ms: u64,
    /// How often a running dispatcher re-dispatches entities still pending.
    pub redrive_interval_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_in_flight: constants::DEFAULT_MAX_IN_FLIGHT,
            queue_capacity: constants::DEFAULT_QUEUE_CAPACITY,
            max_status_write_attempts: constants::DEFAULT_STATUS_WRITE_ATTEMPTS,
            initial_backoff_ms: constants::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: constants::DEFAULT_MAX_BACKOFF_MS,
            redrive_interval_ms: constants::DEFAULT_REDRIVE_INTERVAL_MS,
        }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Period of the pending sweep. Never zero.
    #[must_use]
    pub fn redrive_interval(&self) -> Duration {
        Duration::from_millis(self.redrive_interval_ms.max(1))
    }

    /// Backoff before retry number `attempt` (1-based): doubles each time,
    /// capped at `max_backoff`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }
}

/// Reconciliation view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// A pending order older than this is displayed as "processing".
    pub processing_after_secs: u64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            processing_after_secs: constants::DEFAULT_PROCESSING_AFTER_SECS,
        }
    }
}

impl ReconciliationConfig {
    #[must_use]
    pub fn processing_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.processing_after_secs).unwrap_or(i64::MAX))
    }
}

/// Top-level configuration for one engine process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub price: PriceConfig,
    pub dispatcher: DispatcherConfig,
    pub reconciliation: ReconciliationConfig,
}

impl EngineConfig {
    /// Parse a JSON document. Missing sections fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.price.object_unit_price == 0 {
            return Err(CreditError::Configuration(
                "price.object_unit_price must be > 0".into(),
            ));
        }
        let d = &self.dispatcher;
        if d.max_in_flight == 0 {
            return Err(CreditError::Configuration(
                "dispatcher.max_in_flight must be > 0".into(),
            ));
        }
        if d.queue_capacity == 0 {
            return Err(CreditError::Configuration(
                "dispatcher.queue_capacity must be > 0".into(),
            ));
        }
        if d.max_status_write_attempts == 0 {
            return Err(CreditError::Configuration(
                "dispatcher.max_status_write_attempts must be > 0".into(),
            ));
        }
        if d.redrive_interval_ms == 0 {
            return Err(CreditError::Configuration(
                "dispatcher.redrive_interval_ms must be > 0".into(),
            ));
        }
        if d.initial_backoff_ms > d.max_backoff_ms {
            return Err(CreditError::Configuration(format!(
                "dispatcher.initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                d.initial_backoff_ms, d.max_backoff_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.price.object_unit_price, 3);
        assert_eq!(cfg.dispatcher.max_status_write_attempts, 5);
        assert_eq!(cfg.reconciliation.processing_after_secs, 30);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "price": { "object_unit_price": 5 } }"#).unwrap();
        assert_eq!(cfg.price.object_unit_price, 5);
        assert_eq!(cfg.dispatcher.queue_capacity, constants::DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn zero_price_rejected() {
        let err = EngineConfig::from_json(r#"{ "price": { "object_unit_price": 0 } }"#).unwrap_err();
        assert!(matches!(err, CreditError::Configuration(_)));
    }

    #[test]
    fn inverted_backoff_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.dispatcher.initial_backoff_ms = 5_000;
        cfg.dispatcher.max_backoff_ms = 100;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_redrive_interval_rejected() {
        let err = EngineConfig::from_json(r#"{ "dispatcher": { "redrive_interval_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, CreditError::Configuration(_)));
        assert_eq!(
            DispatcherConfig::default().redrive_interval(),
            Duration::from_millis(constants::DEFAULT_REDRIVE_INTERVAL_MS)
        );
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CreditError::Serialization(_)));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let cfg = DispatcherConfig {
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
            ..DispatcherConfig::default()
        };
        assert_eq!(cfg.backoff_for(1), Duration::from_millis(100));
        assert_eq!(cfg.backoff_for(2), Duration::from_millis(200));
        assert_eq!(cfg.backoff_for(3), Duration::from_millis(350));
        assert_eq!(cfg.backoff_for(40), Duration::from_millis(350));
    }
}
