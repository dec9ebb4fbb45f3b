use crate::error::{BatchError, Result};
use crate::models::{JobParameters, StepExecution};
use crate::state_machine::{BatchStatus, ExecutionEvent, ExitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// One run of a named job; owns its step executions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecution {
    id: Uuid,
    job_name: String,
    parameters: JobParameters,
    status: BatchStatus,
    exit_status: ExitStatus,
    create_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    step_executions: Vec<StepExecution>,
}

impl JobExecution {
    pub fn new(job_name: impl Into<String>, parameters: JobParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_name: job_name.into(),
            parameters,
            status: BatchStatus::Starting,
            exit_status: ExitStatus::unknown(),
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            step_executions: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn exit_status(&self) -> &ExitStatus {
        &self.exit_status
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn step_executions(&self) -> &[StepExecution] {
        &self.step_executions
    }

    pub fn step_execution(&self, step_name: &str) -> Option<&StepExecution> {
        self.step_executions
            .iter()
            .find(|s| s.step_name() == step_name)
    }

    /// Retry count summed over every step's execution context
    pub fn total_retry_count(&self) -> i64 {
        self.step_executions.iter().map(|s| s.retry_count()).sum()
    }

    /// Open a new step execution owned by this job run
    pub fn create_step_execution(&mut self, step_name: impl Into<String>) -> &mut StepExecution {
        let step = StepExecution::new(step_name, self.id);
        self.step_executions.push(step);
        let last = self.step_executions.len() - 1;
        &mut self.step_executions[last]
    }

    /// Apply a lifecycle event, enforcing forward-only transitions
    pub fn apply(&mut self, event: ExecutionEvent) -> Result<()> {
        let next = event.target_status();
        if !self.status.can_transition_to(next) {
            return Err(BatchError::StateTransition {
                from: self.status,
                to: next,
            });
        }

        match &event {
            ExecutionEvent::Start => {
                self.start_time = Some(Utc::now());
                self.exit_status = ExitStatus::executing();
            }
            ExecutionEvent::Complete => {
                self.exit_status = ExitStatus::completed();
                self.end_time = Some(Utc::now());
            }
            ExecutionEvent::Fail(reason) => {
                self.exit_status = ExitStatus::failed(reason.clone());
                self.end_time = Some(Utc::now());
            }
            ExecutionEvent::Stop => {
                self.exit_status = ExitStatus::stopped();
                self.end_time = Some(Utc::now());
            }
        }
        self.status = next;
        Ok(())
    }

    /// Snapshot for logging and callers
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "job_execution_id": self.id,
            "job_name": self.job_name,
            "parameters": self.parameters,
            "status": self.status,
            "exit_status": self.exit_status,
            "start_time": self.start_time.map(|t| t.to_rfc3339()),
            "end_time": self.end_time.map(|t| t.to_rfc3339()),
            "steps": self
                .step_executions
                .iter()
                .map(StepExecution::summary)
                .collect::<Vec<_>>(),
        })
    }
}
