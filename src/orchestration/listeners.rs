//! # Lifecycle Listeners
//!
//! Observer hooks for jobs, steps, chunks and skips, plus the stock logging
//! listeners. Every callback runs synchronously on the executing task; an
//! `Err` from a callback is logged by the caller and never changes the
//! outcome of the run.

use crate::error::{BatchError, Phase};
use crate::item::ItemError;
use crate::models::{JobExecution, StepExecution};
use crate::resilience::{RetryContext, RetryListener};
use std::fmt::Debug;
use std::marker::PhantomData;
use tracing::{error, info, warn};

/// Log a failed listener callback; the run continues regardless
pub(crate) fn log_listener_failure(listener: &str, hook: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!(listener, hook, error = %e, "Listener callback failed");
    }
}

pub trait JobExecutionListener: Send + Sync {
    fn before_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        let _ = job_execution;
        Ok(())
    }

    /// Invoked with the final execution whatever the outcome
    fn after_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        let _ = job_execution;
        Ok(())
    }
}

pub trait StepExecutionListener: Send + Sync {
    fn before_step(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        let _ = step_execution;
        Ok(())
    }

    fn after_step(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        let _ = step_execution;
        Ok(())
    }
}

pub trait ChunkListener: Send + Sync {
    fn before_chunk(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        let _ = step_execution;
        Ok(())
    }

    /// After a chunk committed
    fn after_chunk(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        let _ = step_execution;
        Ok(())
    }

    /// After a chunk rolled back
    fn after_chunk_error(
        &self,
        step_execution: &StepExecution,
        error: &BatchError,
    ) -> anyhow::Result<()> {
        let _ = (step_execution, error);
        Ok(())
    }
}

/// Skip notifications; `I` is the read item type, `O` the written one
pub trait SkipListener<I, O>: Send + Sync {
    /// No item is available for a failed read
    fn on_skip_in_read(&self, error: &ItemError) -> anyhow::Result<()> {
        let _ = error;
        Ok(())
    }

    fn on_skip_in_process(&self, item: &I, error: &ItemError) -> anyhow::Result<()> {
        let _ = (item, error);
        Ok(())
    }

    fn on_skip_in_write(&self, item: &O, error: &ItemError) -> anyhow::Result<()> {
        let _ = (item, error);
        Ok(())
    }
}

/// Logs every failed attempt and the end of each retry sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRetryListener;

impl RetryListener for LoggingRetryListener {
    fn on_error(&self, context: &RetryContext, error: &ItemError) -> anyhow::Result<()> {
        warn!(
            item = context.item_number,
            attempt = context.attempt_count,
            max_attempts = context.max_attempts,
            kind = %error.kind,
            error = %error.message,
            "Item processing attempt failed"
        );
        Ok(())
    }

    fn close(&self, context: &RetryContext, error: Option<&ItemError>) -> anyhow::Result<()> {
        match error {
            None => info!(
                item = context.item_number,
                failed_attempts = context.attempt_count,
                "Item processed"
            ),
            Some(error) => warn!(
                item = context.item_number,
                failed_attempts = context.attempt_count,
                exhausted = context.exhausted,
                kind = %error.kind,
                "Item retries exhausted"
            ),
        }
        Ok(())
    }
}

/// Logs each skip with its phase, item and cause
pub struct LoggingSkipListener<I, O> {
    _marker: PhantomData<fn(&I, &O)>,
}

impl<I, O> LoggingSkipListener<I, O> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<I, O> Default for LoggingSkipListener<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Debug, O: Debug> SkipListener<I, O> for LoggingSkipListener<I, O> {
    fn on_skip_in_read(&self, error: &ItemError) -> anyhow::Result<()> {
        warn!(phase = %Phase::Read, kind = %error.kind, error = %error.message, "Skipped unreadable item");
        Ok(())
    }

    fn on_skip_in_process(&self, item: &I, error: &ItemError) -> anyhow::Result<()> {
        warn!(phase = %Phase::Process, item = ?item, kind = %error.kind, error = %error.message, "Skipped item");
        Ok(())
    }

    fn on_skip_in_write(&self, item: &O, error: &ItemError) -> anyhow::Result<()> {
        warn!(phase = %Phase::Write, item = ?item, kind = %error.kind, error = %error.message, "Skipped item");
        Ok(())
    }
}

/// Reports retry totals and counters once the job has finished
#[derive(Debug, Clone, Copy, Default)]
pub struct JobSummaryListener;

impl JobExecutionListener for JobSummaryListener {
    fn before_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        info!(
            job_execution_id = %job_execution.id(),
            job_name = %job_execution.job_name(),
            parameters = %serde_json::to_string(job_execution.parameters())?,
            "Job starting"
        );
        Ok(())
    }

    fn after_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        for step in job_execution.step_executions() {
            let counters = step.counters();
            info!(
                job_name = %job_execution.job_name(),
                step_name = %step.step_name(),
                status = %step.status(),
                retry_count = step.retry_count(),
                read_count = counters.read_count(),
                write_count = counters.write_count(),
                filter_count = counters.filter_count(),
                skip_count = counters.skip_count(),
                commit_count = counters.commit_count(),
                rollback_count = counters.rollback_count(),
                "Step summary"
            );
        }

        if job_execution.status().is_unsuccessful() {
            error!(
                job_name = %job_execution.job_name(),
                status = %job_execution.status(),
                exit_status = %job_execution.exit_status(),
                "Job did not complete"
            );
        } else {
            info!(
                job_name = %job_execution.job_name(),
                status = %job_execution.status(),
                total_retry_count = job_execution.total_retry_count(),
                "Job finished"
            );
        }
        Ok(())
    }
}
