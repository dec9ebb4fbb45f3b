//! # Chunk-Oriented Step
//!
//! The central read/process/write loop. Each chunk moves through
//! READING → PROCESSING → WRITING → COMMITTING, or ROLLING_BACK when an
//! unrecoverable failure surfaces, and chunk N is fully resolved before
//! chunk N+1 starts reading.
//!
//! ## Failure handling
//!
//! - Read failures go straight to the skip classifier.
//! - Every item is processed through the [`RetryExecutor`]; only the terminal
//!   error of an item reaches the skip classifier, so an item contributes at
//!   most one skip however many attempts it took.
//! - A failed write rolls the chunk back. A skippable write error is then
//!   narrowed down by writing the batch one item per transaction; a fatal one
//!   fails the step.
//!
//! Counters are telemetry and are never un-counted by a rollback.

use crate::config::StepConfig;
use crate::error::{BatchError, Phase, Result};
use crate::item::{ChunkAssembler, ItemError, ItemProcessor, ItemReader, ItemWriter};
use crate::logging::log_step_operation;
use crate::models::StepExecution;
use crate::orchestration::listeners::log_listener_failure;
use crate::orchestration::{
    ChunkListener, SkipClassifier, SkipListener, SkipPolicy, SkipVerdict, Step,
    StepExecutionListener,
};
use crate::resilience::{RetryExecutor, RetryListener};
use crate::state_machine::{ChunkState, ExecutionEvent};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// How a chunk ended when it did not fail the step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkOutcome {
    Committed { end_of_input: bool },
    /// Nothing left to read; no transaction was opened
    Drained,
}

pub struct ChunkOrientedStep<I, O, R, P, W> {
    name: String,
    assembler: ChunkAssembler,
    reader: R,
    processor: P,
    writer: W,
    retry: RetryExecutor,
    skip_policy: SkipPolicy,
    skip_listeners: Vec<Arc<dyn SkipListener<I, O>>>,
    step_listeners: Vec<Arc<dyn StepExecutionListener>>,
    chunk_listeners: Vec<Arc<dyn ChunkListener>>,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, R, P, W> std::fmt::Debug for ChunkOrientedStep<I, O, R, P, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkOrientedStep")
            .field("name", &self.name)
            .field("chunk_size", &self.assembler.chunk_size())
            .field("retry", &self.retry)
            .field("skip_policy", &self.skip_policy)
            .finish_non_exhaustive()
    }
}

impl<I, O, R, P, W> ChunkOrientedStep<I, O, R, P, W>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    R: ItemReader<I>,
    P: ItemProcessor<I, O>,
    W: ItemWriter<O>,
{
    pub fn chunk_size(&self) -> usize {
        self.assembler.chunk_size()
    }

    #[instrument(skip_all, fields(step = %self.name, step_execution_id = %step_execution.id()))]
    async fn run_chunks(&mut self, step_execution: &mut StepExecution) -> Result<()> {
        let mut classifier = SkipClassifier::new(self.skip_policy.clone());
        let mut chunk_number: u64 = 0;

        loop {
            chunk_number += 1;
            for listener in &self.chunk_listeners {
                log_listener_failure("chunk", "before_chunk", listener.before_chunk(step_execution));
            }

            let outcome = self.run_chunk(step_execution, &mut classifier).await;
            if outcome.is_ok() {
                // Closes the bracket for drained chunks too
                for listener in &self.chunk_listeners {
                    log_listener_failure("chunk", "after_chunk", listener.after_chunk(step_execution));
                }
            }

            match outcome {
                Ok(ChunkOutcome::Committed { end_of_input }) => {
                    debug!(chunk = chunk_number, end_of_input, "Chunk committed");
                    if end_of_input {
                        return Ok(());
                    }
                }
                Ok(ChunkOutcome::Drained) => {
                    debug!(chunk = chunk_number, "Input exhausted");
                    return Ok(());
                }
                Err(e) => {
                    error!(chunk = chunk_number, error = %e, "Chunk failed");
                    for listener in &self.chunk_listeners {
                        log_listener_failure(
                            "chunk",
                            "after_chunk_error",
                            listener.after_chunk_error(step_execution, &e),
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn run_chunk(
        &mut self,
        step_execution: &mut StepExecution,
        classifier: &mut SkipClassifier,
    ) -> Result<ChunkOutcome> {
        // READING
        debug!(state = %ChunkState::Reading);
        let skip_listeners = &self.skip_listeners;
        let chunk = self
            .assembler
            .assemble(&mut self.reader, step_execution.counters_mut(), |counters, error| {
                let error = classifier.try_skip(Phase::Read, error)?;
                counters.record_skip(Phase::Read);
                for listener in skip_listeners {
                    log_listener_failure("skip", "on_skip_in_read", listener.on_skip_in_read(&error));
                }
                Ok(())
            })
            .await;

        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Err(Self::roll_back(step_execution, e)),
        };

        if !chunk.has_activity() {
            return Ok(ChunkOutcome::Drained);
        }
        let end_of_input = chunk.is_end_of_input();

        // PROCESSING
        debug!(state = %ChunkState::Processing, items = chunk.len());
        let mut outputs: Vec<O> = Vec::with_capacity(chunk.len());
        for (item_number, item) in chunk.numbered() {
            let mut context = self.retry.new_context(item_number);
            let processor = &self.processor;
            let item_ref = &item;
            let result = self
                .retry
                .execute(&mut context, move || processor.process(item_ref))
                .await;
            step_execution.record_retries(u64::from(context.attempt_count));

            match result {
                Ok(Some(output)) => outputs.push(output),
                Ok(None) => {
                    debug!(item = item_number, "Item filtered");
                    step_execution.counters_mut().record_filtered();
                }
                Err(error) => match classifier.try_skip(Phase::Process, error) {
                    Ok(error) => {
                        step_execution.record_skip(Phase::Process);
                        for listener in &self.skip_listeners {
                            log_listener_failure(
                                "skip",
                                "on_skip_in_process",
                                listener.on_skip_in_process(&item, &error),
                            );
                        }
                    }
                    Err(e) => return Err(Self::roll_back(step_execution, e)),
                },
            }
        }

        // WRITING
        if outputs.is_empty() {
            debug!(state = %ChunkState::Committing, "No items left to write");
            step_execution.counters_mut().record_commit();
            return Ok(ChunkOutcome::Committed { end_of_input });
        }

        debug!(state = %ChunkState::Writing, items = outputs.len());
        match self.writer.write(&outputs).await {
            Ok(()) => {
                debug!(state = %ChunkState::Committing);
                let counters = step_execution.counters_mut();
                counters.record_written(outputs.len() as u64);
                counters.record_commit();
            }
            Err(error) => {
                debug!(state = %ChunkState::RollingBack, kind = %error.kind, "Chunk write failed");
                step_execution.counters_mut().record_rollback();

                match classifier.verdict(Phase::Write, &error) {
                    SkipVerdict::Skip => self.scan(step_execution, classifier, outputs).await?,
                    SkipVerdict::NotSkippable => return Err(BatchError::ItemWrite(error)),
                    SkipVerdict::LimitExceeded => {
                        return Err(BatchError::SkipLimitExceeded {
                            phase: Phase::Write,
                            limit: classifier.policy().skip_limit(),
                            cause: error,
                        })
                    }
                }
            }
        }

        Ok(ChunkOutcome::Committed { end_of_input })
    }

    /// Re-drive a rolled-back batch one item per transaction to isolate the
    /// items the writer rejects.
    async fn scan(
        &mut self,
        step_execution: &mut StepExecution,
        classifier: &mut SkipClassifier,
        outputs: Vec<O>,
    ) -> Result<()> {
        info!(items = outputs.len(), "Scanning rolled-back chunk item by item");

        for output in outputs {
            match self.writer.write(std::slice::from_ref(&output)).await {
                Ok(()) => {
                    let counters = step_execution.counters_mut();
                    counters.record_written(1);
                    counters.record_commit();
                }
                Err(error) => {
                    step_execution.counters_mut().record_rollback();
                    let error: ItemError = classifier.try_skip(Phase::Write, error)?;
                    step_execution.record_skip(Phase::Write);
                    for listener in &self.skip_listeners {
                        log_listener_failure(
                            "skip",
                            "on_skip_in_write",
                            listener.on_skip_in_write(&output, &error),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn roll_back(step_execution: &mut StepExecution, error: BatchError) -> BatchError {
        debug!(state = %ChunkState::RollingBack, error = %error);
        step_execution.counters_mut().record_rollback();
        error
    }
}

#[async_trait]
impl<I, O, R, P, W> Step for ChunkOrientedStep<I, O, R, P, W>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    R: ItemReader<I>,
    P: ItemProcessor<I, O>,
    W: ItemWriter<O>,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, step_execution: &mut StepExecution) -> Result<()> {
        step_execution.apply(ExecutionEvent::Start)?;
        log_step_operation(
            "execute",
            Some(step_execution.job_execution_id()),
            Some(&self.name),
            &step_execution.status().to_string(),
            None,
        );
        for listener in &self.step_listeners {
            log_listener_failure("step", "before_step", listener.before_step(step_execution));
        }

        let outcome = self.run_chunks(step_execution).await;
        match &outcome {
            Ok(()) => step_execution.apply(ExecutionEvent::Complete)?,
            Err(e) => step_execution.apply(ExecutionEvent::fail_with_error(e.to_string()))?,
        }

        for listener in &self.step_listeners {
            log_listener_failure("step", "after_step", listener.after_step(step_execution));
        }

        let counters = step_execution.counters();
        let details = format!(
            "read={} write={} filter={} skip={} retry={} commit={} rollback={}",
            counters.read_count(),
            counters.write_count(),
            counters.filter_count(),
            counters.skip_count(),
            step_execution.retry_count(),
            counters.commit_count(),
            counters.rollback_count()
        );
        log_step_operation(
            "execute",
            Some(step_execution.job_execution_id()),
            Some(&self.name),
            &step_execution.status().to_string(),
            Some(&details),
        );

        if let Err(e) = &outcome {
            warn!(step = %self.name, error = %e, "Step failed");
        }
        outcome
    }
}

/// Builder for [`ChunkOrientedStep`]; options default to [`StepConfig::default`]
pub struct ChunkStepBuilder<I, O> {
    name: String,
    config: StepConfig,
    retry_listeners: Vec<Arc<dyn RetryListener>>,
    skip_listeners: Vec<Arc<dyn SkipListener<I, O>>>,
    step_listeners: Vec<Arc<dyn StepExecutionListener>>,
    chunk_listeners: Vec<Arc<dyn ChunkListener>>,
}

impl<I, O> ChunkStepBuilder<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: StepConfig::default(),
            retry_listeners: Vec::new(),
            skip_listeners: Vec::new(),
            step_listeners: Vec::new(),
            chunk_listeners: Vec::new(),
        }
    }

    pub fn config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn retry_limit(mut self, retry_limit: u32) -> Self {
        self.config.retry_limit = retry_limit;
        self
    }

    pub fn skip_limit(mut self, skip_limit: u64) -> Self {
        self.config.skip_limit = skip_limit;
        self
    }

    pub fn retry_listener(mut self, listener: Arc<dyn RetryListener>) -> Self {
        self.retry_listeners.push(listener);
        self
    }

    pub fn skip_listener(mut self, listener: Arc<dyn SkipListener<I, O>>) -> Self {
        self.skip_listeners.push(listener);
        self
    }

    pub fn step_listener(mut self, listener: Arc<dyn StepExecutionListener>) -> Self {
        self.step_listeners.push(listener);
        self
    }

    pub fn chunk_listener(mut self, listener: Arc<dyn ChunkListener>) -> Self {
        self.chunk_listeners.push(listener);
        self
    }

    /// Validate the options and bind the reader, processor and writer
    pub fn build<R, P, W>(
        self,
        reader: R,
        processor: P,
        writer: W,
    ) -> Result<ChunkOrientedStep<I, O, R, P, W>>
    where
        R: ItemReader<I>,
        P: ItemProcessor<I, O>,
        W: ItemWriter<O>,
    {
        self.config.validate()?;

        let retry = RetryExecutor::new(self.config.retry_policy(), self.config.backoff.policy())
            .with_listeners(self.retry_listeners);

        Ok(ChunkOrientedStep {
            name: self.name,
            assembler: ChunkAssembler::new(self.config.chunk_size),
            reader,
            processor,
            writer,
            retry,
            skip_policy: self.config.skip_policy(),
            skip_listeners: self.skip_listeners,
            step_listeners: self.step_listeners,
            chunk_listeners: self.chunk_listeners,
            _types: PhantomData,
        })
    }
}
