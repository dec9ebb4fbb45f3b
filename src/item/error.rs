use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Classification key for item-level failures.
///
/// Retry and skip policies are configured as sets of kinds, so two failures
/// with the same kind are always treated the same way regardless of message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorKind(Cow<'static, str>);

impl ErrorKind {
    /// Lookup of a referenced entity failed (the canonical transient/skippable kind)
    pub const NOT_FOUND: ErrorKind = ErrorKind(Cow::Borrowed("not_found"));
    /// Downstream notification could not be delivered during write
    pub const NOTIFICATION_UNDELIVERABLE: ErrorKind =
        ErrorKind(Cow::Borrowed("notification_undeliverable"));
    /// A retry listener vetoed the retry sequence before the first attempt
    pub const RETRY_TERMINATED: ErrorKind = ErrorKind(Cow::Borrowed("retry_terminated"));
    /// Input could not be parsed into an item
    pub const PARSE: ErrorKind = ErrorKind(Cow::Borrowed("parse"));

    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ErrorKind {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Typed failure raised by a reader, processor or writer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ItemError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ItemError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NOT_FOUND, message)
    }

    pub fn is_kind(&self, kind: &ErrorKind) -> bool {
        &self.kind == kind
    }
}
