#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Chunk Batch Core
//!
//! Chunk-oriented batch step execution with bounded per-item retry, skip
//! classification and chunk-level commit/rollback.
//!
//! ## Overview
//!
//! Records flow from a reader through a processor to a writer in fixed-size
//! chunks. Each chunk is one transaction: its surviving items are written
//! together and committed, or the chunk is rolled back. Individual items may
//! fail transiently; they are retried a bounded number of times and, when
//! the error kind allows it, skipped instead of failing the whole run. A
//! step-wide skip budget bounds how much failure is tolerated.
//!
//! ## Module Organization
//!
//! - [`item`] - Reader/processor/writer contracts, item errors, chunk assembly
//! - [`resilience`] - Retry executor, retry policy, backoff
//! - [`orchestration`] - Skip classifier, chunk-oriented step, jobs and the launcher
//! - [`models`] - Job/step executions, counters and execution context
//! - [`state_machine`] - Batch statuses, exit statuses and lifecycle events
//! - [`config`] - Step option set with file and environment loading
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use chunk_batch::config::StepConfig;
//! use chunk_batch::item::{CollectingItemWriter, FnItemProcessor, ListItemReader};
//! use chunk_batch::models::JobParameters;
//! use chunk_batch::orchestration::{ChunkStepBuilder, Job, JobLauncher, JobSummaryListener};
//! use chunk_batch::state_machine::BatchStatus;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let writer = CollectingItemWriter::new();
//! let step = ChunkStepBuilder::new("upperStep")
//!     .config(StepConfig::default())
//!     .build(
//!         ListItemReader::new(vec!["a".to_string(), "b".to_string()]),
//!         FnItemProcessor::new(|s: &String| Ok(Some(s.to_uppercase()))),
//!         writer.clone(),
//!     )?;
//!
//! let mut job = Job::builder("upperJob")
//!     .start(step)
//!     .listener(Arc::new(JobSummaryListener))
//!     .build()?;
//!
//! let parameters = JobParameters::builder().add_run_timestamp().build();
//! let execution = JobLauncher::new().run(&mut job, parameters).await;
//!
//! assert_eq!(execution.status(), BatchStatus::Completed);
//! assert_eq!(writer.written(), vec!["A".to_string(), "B".to_string()]);
//! # Ok::<(), chunk_batch::BatchError>(())
//! # }).unwrap();
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests, including property-based tests
//! cargo bench --features benchmarks
//! ```

pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod resilience;
pub mod state_machine;

pub use config::{BackoffConfig, BackoffStrategy, StepConfig};
pub use error::{BatchError, Phase, Result};
pub use item::{ErrorKind, ItemError, ItemProcessor, ItemReader, ItemWriter};
pub use models::{ExecutionContext, JobExecution, JobParameters, StepCounters, StepExecution};
pub use orchestration::{ChunkOrientedStep, ChunkStepBuilder, Job, JobLauncher, Step};
pub use resilience::{BackoffPolicy, RetryExecutor, RetryPolicy};
pub use state_machine::{BatchStatus, ExitStatus};
