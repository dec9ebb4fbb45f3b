// Status model for job and step executions.
//
// Statuses only move forward; once an execution reaches COMPLETED, FAILED or
// STOPPED it never changes again.

pub mod events;
pub mod exit_status;
pub mod states;

pub use events::ExecutionEvent;
pub use exit_status::ExitStatus;
pub use states::{BatchStatus, ChunkState};
