use crate::error::{BatchError, Phase, Result};
use crate::models::execution_context::{ExecutionContext, RETRY_COUNT_KEY};
use crate::models::StepCounters;
use crate::state_machine::{BatchStatus, ExecutionEvent, ExitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// One run of a step within a job execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecution {
    id: Uuid,
    job_execution_id: Uuid,
    step_name: String,
    status: BatchStatus,
    exit_status: ExitStatus,
    counters: StepCounters,
    execution_context: ExecutionContext,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    failures: Vec<String>,
}

impl StepExecution {
    pub fn new(step_name: impl Into<String>, job_execution_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_execution_id,
            step_name: step_name.into(),
            status: BatchStatus::Starting,
            exit_status: ExitStatus::executing(),
            counters: StepCounters::default(),
            execution_context: ExecutionContext::new(),
            start_time: None,
            end_time: None,
            failures: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_execution_id(&self) -> Uuid {
        self.job_execution_id
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn exit_status(&self) -> &ExitStatus {
        &self.exit_status
    }

    pub fn counters(&self) -> &StepCounters {
        &self.counters
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.execution_context
    }

    /// Listeners may stash their own entries here
    pub fn execution_context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.execution_context
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Descriptions of the fatal errors that ended this step
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Cumulative failed processing attempts as persisted for listeners
    pub fn retry_count(&self) -> i64 {
        self.execution_context.get_int(RETRY_COUNT_KEY, 0)
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
            }
            ExecutionEvent::Complete => {
                self.exit_status = ExitStatus::completed();
                self.end_time = Some(Utc::now());
            }
            ExecutionEvent::Fail(reason) => {
                self.failures.push(reason.clone());
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

    pub(crate) fn counters_mut(&mut self) -> &mut StepCounters {
        &mut self.counters
    }

    /// Record failed attempts and mirror the running total into the context
    pub(crate) fn record_retries(&mut self, failed_attempts: u64) {
        if failed_attempts == 0 {
            return;
        }
        self.counters.record_retries(failed_attempts);
        let total = i64::try_from(self.counters.retry_count()).unwrap_or(i64::MAX);
        self.execution_context.put_int(RETRY_COUNT_KEY, total);
    }

    pub(crate) fn record_skip(&mut self, phase: Phase) {
        self.counters.record_skip(phase);
    }

    /// Snapshot for logging and callers
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "step_execution_id": self.id,
            "step_name": self.step_name,
            "status": self.status,
            "exit_status": self.exit_status,
            "read_count": self.counters.read_count(),
            "write_count": self.counters.write_count(),
            "filter_count": self.counters.filter_count(),
            "commit_count": self.counters.commit_count(),
            "rollback_count": self.counters.rollback_count(),
            "skip_count": self.counters.skip_count(),
            "read_skip_count": self.counters.read_skip_count(),
            "process_skip_count": self.counters.process_skip_count(),
            "write_skip_count": self.counters.write_skip_count(),
            "retry_count": self.retry_count(),
            "execution_context": self.execution_context,
            "start_time": self.start_time.map(|t| t.to_rfc3339()),
            "end_time": self.end_time.map(|t| t.to_rfc3339()),
        })
    }
}
