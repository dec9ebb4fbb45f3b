use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing outcome code plus free-text description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub exit_code: String,
    pub exit_description: String,
}

impl ExitStatus {
    pub const UNKNOWN: &'static str = "UNKNOWN";
    pub const EXECUTING: &'static str = "EXECUTING";
    pub const COMPLETED: &'static str = "COMPLETED";
    pub const FAILED: &'static str = "FAILED";
    pub const STOPPED: &'static str = "STOPPED";

    pub fn new(exit_code: impl Into<String>) -> Self {
        Self {
            exit_code: exit_code.into(),
            exit_description: String::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn executing() -> Self {
        Self::new(Self::EXECUTING)
    }

    pub fn completed() -> Self {
        Self::new(Self::COMPLETED)
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self::new(Self::FAILED).with_description(description)
    }

    pub fn stopped() -> Self {
        Self::new(Self::STOPPED)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.exit_description = description.into();
        self
    }

    pub fn is_failed(&self) -> bool {
        self.exit_code == Self::FAILED
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exit_description.is_empty() {
            write!(f, "{}", self.exit_code)
        } else {
            write!(f, "{} ({})", self.exit_code, self.exit_description)
        }
    }
}
