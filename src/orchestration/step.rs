use crate::error::Result;
use crate::models::StepExecution;
use async_trait::async_trait;

/// A unit of work run by the job launcher against its own step execution
#[async_trait]
pub trait Step: Send {
    fn name(&self) -> &str;

    /// Drive `step_execution` from STARTING to a terminal status.
    ///
    /// The outcome is always recorded on `step_execution`; an `Err` is
    /// returned as well when the step ended FAILED.
    async fn execute(&mut self, step_execution: &mut StepExecution) -> Result<()>;
}
