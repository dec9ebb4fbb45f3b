use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by job and step executions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Execution created, not yet running
    #[default]
    Starting,
    /// Execution is running
    Started,
    /// Finished without a fatal error
    Completed,
    /// Aborted by a fatal error
    Failed,
    /// Halted before completion
    Stopped,
}

impl BatchStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Started)
    }

    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }

    /// Transitions only move forward: STARTING → STARTED → terminal.
    /// STARTING may also jump straight to a terminal status.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        match (self, next) {
            (Self::Starting, Self::Started) => true,
            (Self::Starting | Self::Started, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "STARTING"),
            Self::Started => write!(f, "STARTED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(Self::Starting),
            "STARTED" => Ok(Self::Started),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "STOPPED" => Ok(Self::Stopped),
            _ => Err(format!("Invalid batch status: {s}")),
        }
    }
}

/// Where the chunk loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    Reading,
    Processing,
    Writing,
    Committing,
    RollingBack,
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading => write!(f, "reading"),
            Self::Processing => write!(f, "processing"),
            Self::Writing => write!(f, "writing"),
            Self::Committing => write!(f, "committing"),
            Self::RollingBack => write!(f, "rolling_back"),
        }
    }
}
