//! Hot-reloadable unit price.
//!
//! The admin surface owns the write path ([`PriceFeed::publish`]); everything
//! else holds a [`PriceSubscriber`] and reads the latest value without
//! blocking. A price change never touches orders that were already quoted:
//! the price is locked into the order at submission.

use streetcredit_types::{CreditError, Credits, PriceConfig, Result};
use tokio::sync::watch;

/// Publisher side of the process-wide [`PriceConfig`].
#[derive(Debug)]
pub struct PriceFeed {
    tx: watch::Sender<PriceConfig>,
}

impl PriceFeed {
    /// Create a feed seeded with `initial`.
    #[must_use]
    pub fn new(initial: PriceConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a new price. Subscribers observe it on their next read.
    ///
    /// # Errors
    /// Returns `InvalidUnitPrice` for a zero price; the previous value stays.
    pub fn publish(&self, config: PriceConfig) -> Result<()> {
        if config.object_unit_price == 0 {
            return Err(CreditError::InvalidUnitPrice(config.object_unit_price));
        }
        let previous = self.tx.send_replace(config);
        tracing::info!(
            old = previous.object_unit_price,
            new = config.object_unit_price,
            "object unit price updated"
        );
        Ok(())
    }

    /// Latest published config.
    #[must_use]
    pub fn current(&self) -> PriceConfig {
        *self.tx.borrow()
    }

    /// Latest unit price.
    #[must_use]
    pub fn unit_price(&self) -> Credits {
        self.current().object_unit_price
    }

    /// New read handle.
    #[must_use]
    pub fn subscribe(&self) -> PriceSubscriber {
        PriceSubscriber {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new(PriceConfig::default())
    }
}

/// Read handle on the price feed.
#[derive(Debug, Clone)]
pub struct PriceSubscriber {
    rx: watch::Receiver<PriceConfig>,
}

impl PriceSubscriber {
    /// Latest value; never blocks.
    #[must_use]
    pub fn current(&self) -> PriceConfig {
        *self.rx.borrow()
    }

    #[must_use]
    pub fn unit_price(&self) -> Credits {
        self.current().object_unit_price
    }

    /// Wait for the next published value.
    ///
    /// # Errors
    /// Returns `QueueClosed` once the feed has been dropped.
    pub async fn changed(&mut self) -> Result<PriceConfig> {
        self.rx
            .changed()
            .await
            .map_err(|_| CreditError::QueueClosed)?;
        Ok(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_price_is_three() {
        let feed = PriceFeed::default();
        assert_eq!(feed.unit_price(), 3);
        assert_eq!(feed.subscribe().unit_price(), 3);
    }

    #[test]
    fn publish_visible_to_existing_subscribers() {
        let feed = PriceFeed::default();
        let sub = feed.subscribe();
        feed.publish(PriceConfig {
            object_unit_price: 5,
        })
        .unwrap();
        assert_eq!(sub.unit_price(), 5);
        assert_eq!(feed.unit_price(), 5);
    }

    #[test]
    fn zero_price_refused_and_previous_kept() {
        let feed = PriceFeed::default();
        let err = feed
            .publish(PriceConfig {
                object_unit_price: 0,
            })
            .unwrap_err();
        assert!(matches!(err, CreditError::InvalidUnitPrice(0)));
        assert_eq!(feed.unit_price(), 3);
    }

    #[tokio::test]
    async fn subscriber_wakes_on_change() {
        let feed = PriceFeed::default();
        let mut sub = feed.subscribe();
        let handle = tokio::spawn(async move { sub.changed().await });
        feed.publish(PriceConfig {
            object_unit_price: 7,
        })
        .unwrap();
        let seen = handle.await.unwrap().unwrap();
        assert_eq!(seen.object_unit_price, 7);
    }

    #[tokio::test]
    async fn changed_errors_after_feed_dropped() {
        let feed = PriceFeed::default();
        let mut sub = feed.subscribe();
        drop(feed);
        assert!(matches!(sub.changed().await, Err(CreditError::QueueClosed)));
    }
}
