//! # Orchestration Engine
//!
//! Chunk-oriented step execution and the job runs built on top of it.
//!
//! ## Core Components
//!
//! - **SkipClassifier**: skippable-or-fatal verdicts against a step-wide skip budget
//! - **ChunkOrientedStep**: the read/process/write/commit loop, driving the
//!   retry executor per item and the skip classifier per terminal failure
//! - **Job / JobBuilder**: named, ordered list of steps with job-level listeners
//! - **JobLauncher**: runs a job's steps in order and aggregates the final status
//! - **Listeners**: job, step, chunk and skip hooks plus stock logging listeners
//!
//! ## Usage
//!
//! ```rust
//! use chunk_batch::item::{CollectingItemWriter, FnItemProcessor, ItemError, ListItemReader};
//! use chunk_batch::models::JobParameters;
//! use chunk_batch::orchestration::{ChunkStepBuilder, Job, JobLauncher};
//! use chunk_batch::state_machine::BatchStatus;
//!
//! # tokio_test::block_on(async {
//! let writer = CollectingItemWriter::new();
//! let step = ChunkStepBuilder::new("retryStep")
//!     .chunk_size(5)
//!     .retry_limit(3)
//!     .build(
//!         ListItemReader::new(vec![1_u32]),
//!         FnItemProcessor::new(|id: &u32| -> Result<Option<String>, ItemError> {
//!             Err(ItemError::not_found(format!("user {id}")))
//!         }),
//!         writer.clone(),
//!     )
//!     .unwrap();
//!
//! let mut job = Job::builder("retryBatchJob").start(step).build().unwrap();
//! let execution = JobLauncher::new().run(&mut job, JobParameters::new()).await;
//!
//! assert_eq!(execution.status(), BatchStatus::Completed);
//! assert_eq!(execution.total_retry_count(), 3);
//! assert!(writer.written().is_empty());
//! # });
//! ```

pub mod chunk_step;
pub mod job;
pub mod job_launcher;
pub mod listeners;
pub mod skip_classifier;
pub mod step;

pub use chunk_step::{ChunkOrientedStep, ChunkStepBuilder};
pub use job::{Job, JobBuilder};
pub use job_launcher::JobLauncher;
pub use listeners::{
    ChunkListener, JobExecutionListener, JobSummaryListener, LoggingRetryListener,
    LoggingSkipListener, SkipListener, StepExecutionListener,
};
pub use skip_classifier::{SkipClassifier, SkipPolicy, SkipVerdict};
pub use step::Step;
