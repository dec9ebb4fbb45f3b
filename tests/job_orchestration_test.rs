mod common;

use async_trait::async_trait;
use chunk_batch::error::Result;
use chunk_batch::item::{ErrorKind, ListItemReader};
use chunk_batch::logging::init_structured_logging;
use chunk_batch::models::{JobParameters, StepExecution, RUN_TIMESTAMP_KEY};
use chunk_batch::orchestration::{
    ChunkStepBuilder, Job, JobLauncher, JobSummaryListener, LoggingRetryListener,
    LoggingSkipListener, Step,
};
use chunk_batch::state_machine::{BatchStatus, ExecutionEvent, ExitStatus};
use common::*;
use std::sync::Arc;

fn chunk_step(
    name: &str,
    input: Vec<u32>,
    processor: FlakyProcessor,
    writer: PoisonedWriter,
    listener: Arc<RecordingLifecycleListener>,
) -> impl Step {
    ChunkStepBuilder::<u32, u32>::new(name)
        .retry_listener(Arc::new(LoggingRetryListener))
        .skip_listener(Arc::new(LoggingSkipListener::<u32, u32>::new()))
        .step_listener(listener.clone())
        .chunk_listener(listener)
        .build(ListItemReader::new(input), processor, writer)
        .unwrap()
}

/// Step that finishes as STOPPED without reading anything
struct StoppingStep;

#[async_trait]
impl Step for StoppingStep {
    fn name(&self) -> &str {
        "stoppingStep"
    }

    async fn execute(&mut self, step_execution: &mut StepExecution) -> Result<()> {
        step_execution.apply(ExecutionEvent::Start)?;
        step_execution.apply(ExecutionEvent::Stop)
    }
}

#[tokio::test]
async fn test_listeners_bracket_a_successful_run() {
    init_structured_logging();
    let listener = Arc::new(RecordingLifecycleListener::default());
    let writer = PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []);
    // Exactly one full chunk, so the second pass finds the input drained
    let step = chunk_step(
        "retryStep",
        ids(5),
        FlakyProcessor::new(ErrorKind::NOT_FOUND),
        writer.clone(),
        listener.clone(),
    );
    let mut job = Job::builder("retryBatchJob")
        .start(step)
        .listener(listener.clone())
        .listener(Arc::new(JobSummaryListener))
        .build()
        .unwrap();

    let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;

    assert_eq!(execution.status(), BatchStatus::Completed);
    assert_eq!(execution.exit_status().exit_code, ExitStatus::COMPLETED);
    assert!(execution.start_time().is_some());
    assert!(execution.end_time().is_some());
    assert_eq!(writer.written(), vec![10, 20, 30, 40, 50]);
    assert_eq!(
        listener.events(),
        vec![
            "before_job:STARTED",
            "before_step:retryStep",
            "before_chunk",
            "after_chunk:1",
            "before_chunk",
            "after_chunk:1",
            "after_step:retryStep:COMPLETED",
            "after_job:COMPLETED",
        ]
    );
    assert_eq!(*listener.final_job_status.lock(), Some(BatchStatus::Completed));
}

#[tokio::test]
async fn test_failing_listeners_do_not_change_outcome() {
    let listener = Arc::new(RecordingLifecycleListener::failing());
    let step = chunk_step(
        "retryStep",
        ids(2),
        FlakyProcessor::new(ErrorKind::NOT_FOUND),
        PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []),
        listener.clone(),
    );
    let mut job = Job::builder("retryBatchJob")
        .start(step)
        .listener(listener.clone())
        .build()
        .unwrap();

    let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;

    assert_eq!(execution.status(), BatchStatus::Completed);
    assert_eq!(listener.events().len(), 6);
}

#[tokio::test]
async fn test_failed_step_stops_the_job() {
    let listener = Arc::new(RecordingLifecycleListener::default());
    let failing = chunk_step(
        "loadStep",
        ids(2),
        FlakyProcessor::new(ErrorKind::PARSE).always_failing(2),
        PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []),
        listener.clone(),
    );
    let never_run_writer = PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []);
    let never_run = chunk_step(
        "notifyStep",
        ids(2),
        FlakyProcessor::new(ErrorKind::NOT_FOUND),
        never_run_writer.clone(),
        listener.clone(),
    );
    let mut job = Job::builder("retryBatchJob")
        .start(failing)
        .next(never_run)
        .listener(listener.clone())
        .build()
        .unwrap();

    let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;

    assert_eq!(execution.status(), BatchStatus::Failed);
    assert!(execution.exit_status().is_failed());
    assert!(execution
        .exit_status()
        .exit_description
        .contains("Step 'loadStep' failed"));
    assert_eq!(execution.step_executions().len(), 1);
    assert!(execution.step_execution("notifyStep").is_none());
    assert!(never_run_writer.calls().is_empty());
    assert!(listener
        .events()
        .contains(&"after_chunk_error:process".to_string()));
    assert_eq!(listener.events().last().unwrap(), "after_job:FAILED");
}

#[tokio::test]
async fn test_steps_run_in_declared_order() {
    let listener = Arc::new(RecordingLifecycleListener::default());
    let first = chunk_step(
        "first",
        ids(1),
        FlakyProcessor::new(ErrorKind::NOT_FOUND),
        PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []),
        listener.clone(),
    );
    let second = chunk_step(
        "second",
        ids(1),
        FlakyProcessor::new(ErrorKind::NOT_FOUND).always_failing(1),
        PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []),
        listener.clone(),
    );
    let mut job = Job::builder("twoStepJob")
        .start(first)
        .next(second)
        .build()
        .unwrap();

    let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;

    assert_eq!(execution.status(), BatchStatus::Completed);
    let names: Vec<_> = execution
        .step_executions()
        .iter()
        .map(|s| s.step_name())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(execution.total_retry_count(), 3);
    assert!(execution
        .step_executions()
        .iter()
        .all(|s| s.job_execution_id() == execution.id()));
}

#[tokio::test]
async fn test_stopped_step_stops_the_job() {
    let mut job = Job::builder("stoppableJob")
        .start(StoppingStep)
        .build()
        .unwrap();

    let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;

    assert_eq!(execution.status(), BatchStatus::Stopped);
    assert_eq!(execution.exit_status().exit_code, ExitStatus::STOPPED);
}

#[tokio::test]
async fn test_parameters_are_kept_on_the_execution() {
    let listener = Arc::new(RecordingLifecycleListener::default());
    let step = chunk_step(
        "retryStep",
        vec![],
        FlakyProcessor::new(ErrorKind::NOT_FOUND),
        PoisonedWriter::new(ErrorKind::NOTIFICATION_UNDELIVERABLE, []),
        listener,
    );
    let mut job = Job::builder("retryBatchJob").start(step).build().unwrap();
    let parameters = JobParameters::builder()
        .add_run_timestamp()
        .add_string("source", "users.csv")
        .build();

    let execution = JobLauncher::new().run(&mut job, parameters).await;

    assert_eq!(execution.status(), BatchStatus::Completed);
    assert!(execution.parameters().get(RUN_TIMESTAMP_KEY).is_some());
    assert_eq!(execution.parameters().get_string("source"), Some("users.csv"));
    let step = execution.step_execution("retryStep").unwrap();
    assert_eq!(step.counters().read_count(), 0);
    assert_eq!(step.counters().commit_count(), 0);
    assert_eq!(execution.summary()["status"], "COMPLETED");
}
