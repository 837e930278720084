//! Async helpers
//!
//! ```rust,ignore
//! use tooling::async_utils::{with_retry_if, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3).with_initial_interval(1.0);
//! let reply = with_retry_if(&policy, || model.chat(request.clone()), |e| e.is_retryable()).await?;
//! ```

pub mod retry;

pub use retry::{is_retryable_error, with_retry, with_retry_if, RetryPolicy};
