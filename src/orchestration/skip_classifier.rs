//! # Skip Classifier
//!
//! Decides whether a terminal item failure may be skipped and enforces the
//! step-wide skip budget.
//!
//! Classification depends only on the error kind and the current skip count,
//! never on the message or on how many attempts preceded it, so the same
//! `(phase, kind)` pair against an unchanged budget always gets the same
//! verdict. Skips are recorded once per terminal failure.

use crate::error::{BatchError, Phase};
use crate::item::{ErrorKind, ItemError};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Skip budget plus the error kinds that may be skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    skip_limit: u64,
    skippable: HashSet<ErrorKind>,
}

impl SkipPolicy {
    pub fn new(skip_limit: u64, skippable: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self {
            skip_limit,
            skippable: skippable.into_iter().collect(),
        }
    }

    /// Nothing is skippable; every item failure is fatal
    pub fn never() -> Self {
        Self::new(0, [])
    }

    pub fn skip_limit(&self) -> u64 {
        self.skip_limit
    }

    pub fn is_skippable_kind(&self, kind: &ErrorKind) -> bool {
        self.skippable.contains(kind)
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::never()
    }
}

/// Outcome of classifying one terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipVerdict {
    Skip,
    /// Kind is outside the skippable set
    NotSkippable,
    /// Kind is skippable but the budget is spent
    LimitExceeded,
}

impl SkipVerdict {
    pub fn is_skip(&self) -> bool {
        matches!(self, SkipVerdict::Skip)
    }
}

impl fmt::Display for SkipVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipVerdict::Skip => write!(f, "skip"),
            SkipVerdict::NotSkippable => write!(f, "not_skippable"),
            SkipVerdict::LimitExceeded => write!(f, "limit_exceeded"),
        }
    }
}

/// Per-step-run classifier; owns the running skip count
#[derive(Debug, Clone)]
pub struct SkipClassifier {
    policy: SkipPolicy,
    skip_count: u64,
}

impl SkipClassifier {
    pub fn new(policy: SkipPolicy) -> Self {
        Self {
            policy,
            skip_count: 0,
        }
    }

    pub fn policy(&self) -> &SkipPolicy {
        &self.policy
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    pub fn verdict(&self, phase: Phase, error: &ItemError) -> SkipVerdict {
        let verdict = if !self.policy.is_skippable_kind(&error.kind) {
            SkipVerdict::NotSkippable
        } else if self.skip_count >= self.policy.skip_limit {
            SkipVerdict::LimitExceeded
        } else {
            SkipVerdict::Skip
        };

        debug!(
            %phase,
            kind = %error.kind,
            skip_count = self.skip_count,
            skip_limit = self.policy.skip_limit,
            %verdict,
            "Classified item failure"
        );
        verdict
    }

    /// True when the failure may be skipped without exceeding the budget
    pub fn classify(&self, phase: Phase, error: &ItemError) -> bool {
        self.verdict(phase, error).is_skip()
    }

    /// Count one skip event
    pub fn record_skip(&mut self, phase: Phase) -> u64 {
        self.skip_count += 1;
        debug!(%phase, skip_count = self.skip_count, "Skip recorded");
        self.skip_count
    }

    /// Classify and, when skippable, record the skip in one step.
    ///
    /// Returns the fatal error to propagate when the failure cannot be skipped.
    pub fn try_skip(&mut self, phase: Phase, error: ItemError) -> Result<ItemError, BatchError> {
        match self.verdict(phase, &error) {
            SkipVerdict::Skip => {
                self.record_skip(phase);
                Ok(error)
            }
            SkipVerdict::NotSkippable => Err(BatchError::from_phase(phase, error)),
            SkipVerdict::LimitExceeded => Err(BatchError::SkipLimitExceeded {
                phase,
                limit: self.policy.skip_limit,
                cause: error,
            }),
        }
    }
}
