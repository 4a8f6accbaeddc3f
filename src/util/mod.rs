//! Shared utilities.

pub mod retry;
pub mod timeout;

pub use retry::{backoff_delay, RetryPolicy};
pub use timeout::with_timeout;
