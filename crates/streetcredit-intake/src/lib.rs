//! # streetcredit-intake
//!
//! **Intake plane**: turns a quoted selection into a persisted order, and an
//! approved purchase into a persisted balance request.
//!
//! ## Flow
//!
//! ```text
//! Selection → quote → OrderIntake.submit() → store (pending) → EventSink
//! purchase → TopUpDesk.approve() → store (pending) → EventSink
//! ```
//!
//! Nothing here touches a balance. The affordability check is advisory: the
//! ledger is the only authority on whether an order settles.

pub mod advisory;
pub mod order_intake;
pub mod sink;
pub mod top_up;

pub use advisory::AdvisoryCheck;
pub use order_intake::OrderIntake;
pub use sink::EventSink;
pub use top_up::{TopUpAmount, TopUpDesk};
