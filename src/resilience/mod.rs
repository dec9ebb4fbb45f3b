//! # Resilience Module
//!
//! Bounded per-item retry for the chunk loop.
//!
//! ## Architecture
//!
//! - **Retry Policy**: attempt limit plus the set of error kinds worth retrying
//! - **Backoff**: wait applied between attempts of the same item
//! - **Retry Executor**: stateless runner; per-item state lives in a [`RetryContext`]
//! - **Retry Listeners**: open / on_error / close hooks, failures logged only
//!
//! ## Usage
//!
//! ```rust
//! use chunk_batch::item::{ErrorKind, ItemError};
//! use chunk_batch::resilience::{BackoffPolicy, RetryExecutor, RetryPolicy};
//!
//! # tokio_test::block_on(async {
//! let executor = RetryExecutor::new(
//!     RetryPolicy::new(3, [ErrorKind::NOT_FOUND]),
//!     BackoffPolicy::NoBackoff,
//! );
//!
//! let mut context = executor.new_context(1);
//! let result: Result<u32, ItemError> = executor
//!     .execute(&mut context, || async { Err(ItemError::not_found("user 1")) })
//!     .await;
//!
//! assert!(result.is_err());
//! assert_eq!(context.attempt_count, 3);
//! assert!(context.exhausted);
//! # });
//! ```

pub mod backoff;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use retry::{RetryContext, RetryExecutor, RetryListener, RetryPolicy};
