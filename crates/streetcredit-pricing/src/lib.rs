//! # streetcredit-pricing
//!
//! **Pricing & Selection Model**: the client-side half of the export flow.
//!
//! Like a pure compute plane, this crate has:
//!
//! - **Zero side effects**: [`quote`] touches no storage and no balance
//! - **Deterministic output**: same selection + same unit price → same quote
//! - **No zero-cost quotes**: an empty selection is [`Quote::NothingSelected`],
//!   never a successful zero total
//!
//! The unit price comes from a [`PriceFeed`], a hot-reloadable value the
//! admin surface publishes and clients read without blocking.

pub mod price_feed;
pub mod quote;
pub mod selection;

pub use price_feed::{PriceFeed, PriceSubscriber};
pub use quote::{Quote, quote};
pub use selection::Selection;
