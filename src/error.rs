use crate::item::ItemError;
use crate::state_machine::BatchStatus;

/// Phase of the chunk loop in which an item-level failure surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Read,
    Process,
    Write,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Read => write!(f, "read"),
            Phase::Process => write!(f, "process"),
            Phase::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("State transition error: cannot move from {from} to {to}")]
    StateTransition { from: BatchStatus, to: BatchStatus },

    #[error("Read failed: {0}")]
    ItemRead(ItemError),

    #[error("Process failed: {0}")]
    ItemProcess(ItemError),

    #[error("Write failed: {0}")]
    ItemWrite(ItemError),

    #[error("Skip limit {limit} exceeded in {phase} phase: {cause}")]
    SkipLimitExceeded {
        phase: Phase,
        limit: u64,
        cause: ItemError,
    },

    #[error("Step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },
}

impl BatchError {
    /// Wrap a non-skippable item failure according to the phase it came from
    pub fn from_phase(phase: Phase, error: ItemError) -> Self {
        match phase {
            Phase::Read => BatchError::ItemRead(error),
            Phase::Process => BatchError::ItemProcess(error),
            Phase::Write => BatchError::ItemWrite(error),
        }
    }

    /// The item-level cause, when there is one
    pub fn item_error(&self) -> Option<&ItemError> {
        match self {
            BatchError::ItemRead(e) | BatchError::ItemProcess(e) | BatchError::ItemWrite(e) => {
                Some(e)
            }
            BatchError::SkipLimitExceeded { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
