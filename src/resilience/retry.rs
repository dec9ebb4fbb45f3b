//! # Retry Executor
//!
//! Runs one logical unit of work (processing one item) up to a bounded number
//! of attempts, waiting per the backoff policy between attempts and notifying
//! retry listeners at open, on every failed attempt, and at close.
//!
//! The executor itself is stateless and reentrant: all per-item state lives in
//! the [`RetryContext`] the caller allocates for each item.

use crate::item::{ErrorKind, ItemError};
use crate::resilience::BackoffPolicy;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-item retry state, fresh for every item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// Read ordinal of the item being retried (1-based)
    pub item_number: u64,
    /// Failed attempts so far
    pub attempt_count: u32,
    pub max_attempts: u32,
    /// Set once the sequence ended in failure
    pub exhausted: bool,
    pub last_error: Option<ItemError>,
}

impl RetryContext {
    pub fn new(item_number: u64, max_attempts: u32) -> Self {
        Self {
            item_number,
            attempt_count: 0,
            max_attempts,
            exhausted: false,
            last_error: None,
        }
    }
}

/// Hooks around a retry sequence.
///
/// Errors returned from `on_error`/`close` are logged and dropped; they never
/// change the outcome of the sequence.
pub trait RetryListener: Send + Sync {
    /// Called before the first attempt; returning false vetoes the whole sequence
    fn open(&self, context: &RetryContext) -> bool {
        let _ = context;
        true
    }

    /// Called after every failed attempt, with `attempt_count` already including it
    fn on_error(&self, context: &RetryContext, error: &ItemError) -> anyhow::Result<()> {
        let _ = (context, error);
        Ok(())
    }

    /// Called once when the sequence ends; `error` is the terminal failure, if any
    fn close(&self, context: &RetryContext, error: Option<&ItemError>) -> anyhow::Result<()> {
        let _ = (context, error);
        Ok(())
    }
}

/// Attempt limit plus the error kinds worth retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retryable: HashSet<ErrorKind>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retryable: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retryable: retryable.into_iter().collect(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable(&self, error: &ItemError) -> bool {
        self.retryable.contains(&error.kind)
    }

    /// Another attempt is allowed only for a retryable kind with attempts left
    pub fn can_retry(&self, context: &RetryContext, error: &ItemError) -> bool {
        self.is_retryable(error) && context.attempt_count < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, [])
    }
}

#[derive(Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    backoff: BackoffPolicy,
    listeners: Vec<Arc<dyn RetryListener>>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("backoff", &self.backoff)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, backoff: BackoffPolicy) -> Self {
        Self {
            policy,
            backoff,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn RetryListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_listeners(mut self, listeners: impl IntoIterator<Item = Arc<dyn RetryListener>>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fresh context for one item, sized to this executor's policy
    pub fn new_context(&self, item_number: u64) -> RetryContext {
        RetryContext::new(item_number, self.policy.max_attempts())
    }

    /// Run `operation` until it succeeds or the policy gives up.
    ///
    /// Only the terminal error reaches the caller; intermediate failures are
    /// visible through `on_error` and `context.attempt_count`.
    pub async fn execute<T, F, Fut>(
        &self,
        context: &mut RetryContext,
        mut operation: F,
    ) -> Result<T, ItemError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ItemError>>,
    {
        if !self.open(context) {
            let error = ItemError::new(
                ErrorKind::RETRY_TERMINATED,
                format!(
                    "retry listener vetoed processing of item #{}",
                    context.item_number
                ),
            );
            context.exhausted = true;
            context.last_error = Some(error.clone());
            self.close(context, Some(&error));
            return Err(error);
        }

        loop {
            match operation().await {
                Ok(value) => {
                    self.close(context, None);
                    return Ok(value);
                }
                Err(error) => {
                    context.attempt_count += 1;
                    context.last_error = Some(error.clone());
                    self.on_error(context, &error);

                    if self.policy.can_retry(context, &error) {
                        debug!(
                            item = context.item_number,
                            attempt = context.attempt_count,
                            max_attempts = context.max_attempts,
                            kind = %error.kind,
                            "Retrying item"
                        );
                        self.backoff.backoff(context.attempt_count).await;
                        continue;
                    }

                    context.exhausted = true;
                    self.close(context, Some(&error));
                    return Err(error);
                }
            }
        }
    }

    fn open(&self, context: &RetryContext) -> bool {
        let mut allowed = true;
        // Every listener is opened even after a veto
        for listener in &self.listeners {
            allowed &= listener.open(context);
        }
        allowed
    }

    fn on_error(&self, context: &RetryContext, error: &ItemError) {
        for listener in &self.listeners {
            if let Err(e) = listener.on_error(context, error) {
                warn!(item = context.item_number, error = %e, "Retry listener on_error failed");
            }
        }
    }

    fn close(&self, context: &RetryContext, error: Option<&ItemError>) {
        for listener in &self.listeners {
            if let Err(e) = listener.close(context, error) {
                warn!(item = context.item_number, error = %e, "Retry listener close failed");
            }
        }
    }
}
