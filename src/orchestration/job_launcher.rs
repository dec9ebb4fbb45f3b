//! # Job Launcher
//!
//! Runs a [`Job`]'s steps in declared order against a fresh
//! [`JobExecution`], stopping at the first step that does not complete.
//! Job listeners bracket the run and always see the final execution.

use crate::error::BatchError;
use crate::logging::{log_error, log_job_operation};
use crate::models::{JobExecution, JobParameters};
use crate::orchestration::listeners::log_listener_failure;
use crate::orchestration::Job;
use crate::state_machine::{BatchStatus, ExecutionEvent};
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct JobLauncher;

impl JobLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Run `job` to a terminal status and hand back its execution record
    #[instrument(skip_all, fields(job = %job.name()))]
    pub async fn run(&self, job: &mut Job, parameters: JobParameters) -> JobExecution {
        let mut execution = JobExecution::new(job.name(), parameters);
        let listeners = job.listeners().to_vec();

        Self::transition(&mut execution, ExecutionEvent::Start);
        log_job_operation(
            "launch",
            Some(execution.id()),
            Some(execution.job_name()),
            &execution.status().to_string(),
            None,
        );
        for listener in &listeners {
            log_listener_failure("job", "before_job", listener.before_job(&execution));
        }

        let mut failure: Option<(String, BatchStatus, String)> = None;
        for step in job.steps_mut() {
            let step_name = step.name().to_string();
            let step_execution = execution.create_step_execution(step_name.clone());
            let result = step.execute(step_execution).await;
            let status = step_execution.status();

            if status == BatchStatus::Completed {
                info!(step = %step_name, "Step completed");
                continue;
            }

            let reason = match result {
                Err(e) => e.to_string(),
                Ok(()) => format!("step ended with status {status}"),
            };
            failure = Some((step_name, status, reason));
            break;
        }

        let event = match failure {
            None => ExecutionEvent::Complete,
            Some((_, BatchStatus::Stopped, _)) => ExecutionEvent::Stop,
            Some((step, _, reason)) => {
                let error = BatchError::StepFailed { step, reason };
                log_error("job_launcher", "run", &error.to_string(), Some(execution.job_name()));
                ExecutionEvent::fail_with_error(error.to_string())
            }
        };
        Self::transition(&mut execution, event);

        for listener in &listeners {
            log_listener_failure("job", "after_job", listener.after_job(&execution));
        }

        let exit_status = execution.exit_status().to_string();
        log_job_operation(
            "finish",
            Some(execution.id()),
            Some(execution.job_name()),
            &execution.status().to_string(),
            Some(&exit_status),
        );
        execution
    }

    fn transition(execution: &mut JobExecution, event: ExecutionEvent) {
        let event_type = event.event_type();
        if let Err(e) = execution.apply(event) {
            error!(event = event_type, error = %e, "Job status transition rejected");
        }
    }
}
