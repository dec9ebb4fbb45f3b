use super::states::BatchStatus;
use serde::{Deserialize, Serialize};

/// Events that drive job and step execution status transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ExecutionEvent {
    /// Begin running
    Start,
    /// Finish successfully
    Complete,
    /// Abort with an error description
    Fail(String),
    /// Halt before completion
    Stop,
}

impl ExecutionEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Stop => "stop",
        }
    }

    /// Status an execution lands in after this event
    pub fn target_status(&self) -> BatchStatus {
        match self {
            Self::Start => BatchStatus::Started,
            Self::Complete => BatchStatus::Completed,
            Self::Fail(_) => BatchStatus::Failed,
            Self::Stop => BatchStatus::Stopped,
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
