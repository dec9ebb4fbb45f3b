//! # Execution Models
//!
//! In-memory records of a job run: its parameters, the job execution, the
//! step executions it owns, and each step's counters and execution context.
//! Nothing here is persisted; the caller consumes the returned
//! [`JobExecution`] and drops it.

pub mod execution_context;
pub mod job_execution;
pub mod job_parameters;
pub mod step_counters;
pub mod step_execution;

pub use execution_context::{ContextValue, ExecutionContext, RETRY_COUNT_KEY};
pub use job_execution::JobExecution;
pub use job_parameters::{JobParameter, JobParameters, JobParametersBuilder, RUN_TIMESTAMP_KEY};
pub use step_counters::StepCounters;
pub use step_execution::StepExecution;
