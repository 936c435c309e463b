pub mod retry;

pub use retry::{DeliveryOutcome, RetryConfig, RetryPolicy};
