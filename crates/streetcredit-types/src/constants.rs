//! System-wide constants for the StreetCredit settlement engine.

/// Unit price (credits per exported object) used until the admin surface
/// publishes a value.
pub const DEFAULT_OBJECT_UNIT_PRICE: u64 = 3;

/// Maximum number of settlement events processed concurrently.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Capacity of the settlement event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Attempts allowed for a single status write before giving up.
pub const DEFAULT_STATUS_WRITE_ATTEMPTS: u32 = 5;

/// First retry delay for a failed status write, in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 50;

/// Upper bound on the retry delay, in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 2_000;

/// Period of the dispatcher's sweep over still-pending entities, in milliseconds.
pub const DEFAULT_REDRIVE_INTERVAL_MS: u64 = 10_000;

/// Age after which a still-pending order is shown as "processing", in seconds.
pub const DEFAULT_PROCESSING_AFTER_SECS: u64 = 30;

/// Maximum items in a single export selection.
pub const MAX_SELECTION_ITEMS: usize = 10_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "StreetCredit";
