//! Shared doubles for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chunk_batch::error::{BatchError, Phase};
use chunk_batch::item::{ErrorKind, ItemError, ItemProcessor, ItemWriter};
use chunk_batch::models::{JobExecution, StepExecution};
use chunk_batch::orchestration::{
    ChunkListener, JobExecutionListener, SkipListener, StepExecutionListener,
};
use chunk_batch::resilience::{RetryContext, RetryListener};
use chunk_batch::state_machine::BatchStatus;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Processor that multiplies by ten, failing selected items a set number of
/// times first. Clones share the attempt log.
#[derive(Clone)]
pub struct FlakyProcessor {
    kind: ErrorKind,
    failures: HashMap<u32, u32>,
    filtered: HashSet<u32>,
    attempts: Arc<Mutex<HashMap<u32, u32>>>,
}

impl FlakyProcessor {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            failures: HashMap::new(),
            filtered: HashSet::new(),
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn always_failing(self, item: u32) -> Self {
        self.failing_times(item, u32::MAX)
    }

    pub fn failing_times(mut self, item: u32, times: u32) -> Self {
        self.failures.insert(item, times);
        self
    }

    pub fn filtering(mut self, item: u32) -> Self {
        self.filtered.insert(item);
        self
    }

    pub fn attempts(&self, item: u32) -> u32 {
        self.attempts.lock().get(&item).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ItemProcessor<u32, u32> for FlakyProcessor {
    async fn process(&self, item: &u32) -> Result<Option<u32>, ItemError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let entry = attempts.entry(*item).or_insert(0);
            *entry += 1;
            *entry
        };

        if attempt <= self.failures.get(item).copied().unwrap_or(0) {
            return Err(ItemError::new(
                self.kind.clone(),
                format!("user {item} not found (attempt {attempt})"),
            ));
        }
        if self.filtered.contains(item) {
            return Ok(None);
        }
        Ok(Some(item * 10))
    }
}

/// Writer that rejects any batch containing a poisoned item
#[derive(Clone)]
pub struct PoisonedWriter {
    kind: ErrorKind,
    poisoned: HashSet<u32>,
    written: Arc<Mutex<Vec<u32>>>,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl PoisonedWriter {
    pub fn new(kind: ErrorKind, poisoned: impl IntoIterator<Item = u32>) -> Self {
        Self {
            kind,
            poisoned: poisoned.into_iter().collect(),
            written: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn written(&self) -> Vec<u32> {
        self.written.lock().clone()
    }

    /// Batch size of every write call, failed ones included
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ItemWriter<u32> for PoisonedWriter {
    async fn write(&mut self, items: &[u32]) -> Result<(), ItemError> {
        self.calls.lock().push(items.len());
        if let Some(bad) = items.iter().find(|item| self.poisoned.contains(*item)) {
            return Err(ItemError::new(
                self.kind.clone(),
                format!("notification for {bad} undeliverable"),
            ));
        }
        self.written.lock().extend_from_slice(items);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEvent {
    pub phase: Phase,
    pub item: Option<u32>,
    pub kind: ErrorKind,
}

#[derive(Default)]
pub struct RecordingSkipListener {
    pub events: Mutex<Vec<SkipEvent>>,
}

impl RecordingSkipListener {
    pub fn events(&self) -> Vec<SkipEvent> {
        self.events.lock().clone()
    }
}

impl SkipListener<u32, u32> for RecordingSkipListener {
    fn on_skip_in_read(&self, error: &ItemError) -> anyhow::Result<()> {
        self.events.lock().push(SkipEvent {
            phase: Phase::Read,
            item: None,
            kind: error.kind.clone(),
        });
        Ok(())
    }

    fn on_skip_in_process(&self, item: &u32, error: &ItemError) -> anyhow::Result<()> {
        self.events.lock().push(SkipEvent {
            phase: Phase::Process,
            item: Some(*item),
            kind: error.kind.clone(),
        });
        Ok(())
    }

    fn on_skip_in_write(&self, item: &u32, error: &ItemError) -> anyhow::Result<()> {
        self.events.lock().push(SkipEvent {
            phase: Phase::Write,
            item: Some(*item),
            kind: error.kind.clone(),
        });
        anyhow::bail!("skip listener failures must not escalate")
    }
}

#[derive(Default)]
pub struct RecordingRetryListener {
    pub events: Mutex<Vec<String>>,
}

impl RecordingRetryListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl RetryListener for RecordingRetryListener {
    fn open(&self, context: &RetryContext) -> bool {
        self.events
            .lock()
            .push(format!("open:{}", context.item_number));
        true
    }

    fn on_error(&self, context: &RetryContext, _error: &ItemError) -> anyhow::Result<()> {
        self.events.lock().push(format!(
            "error:{}:{}",
            context.item_number, context.attempt_count
        ));
        Ok(())
    }

    fn close(&self, context: &RetryContext, error: Option<&ItemError>) -> anyhow::Result<()> {
        self.events.lock().push(format!(
            "close:{}:{}",
            context.item_number,
            if error.is_some() { "failed" } else { "ok" }
        ));
        Ok(())
    }
}

/// Records job/step/chunk callbacks; optionally fails every callback
#[derive(Default)]
pub struct RecordingLifecycleListener {
    pub events: Mutex<Vec<String>>,
    pub final_job_status: Mutex<Option<BatchStatus>>,
    pub fail_callbacks: bool,
}

impl RecordingLifecycleListener {
    pub fn failing() -> Self {
        Self {
            fail_callbacks: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: String) -> anyhow::Result<()> {
        self.events.lock().push(event);
        if self.fail_callbacks {
            anyhow::bail!("listener failure");
        }
        Ok(())
    }
}

impl JobExecutionListener for RecordingLifecycleListener {
    fn before_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        self.record(format!("before_job:{}", job_execution.status()))
    }

    fn after_job(&self, job_execution: &JobExecution) -> anyhow::Result<()> {
        *self.final_job_status.lock() = Some(job_execution.status());
        self.record(format!("after_job:{}", job_execution.status()))
    }
}

impl StepExecutionListener for RecordingLifecycleListener {
    fn before_step(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        self.record(format!("before_step:{}", step_execution.step_name()))
    }

    fn after_step(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        self.record(format!(
            "after_step:{}:{}",
            step_execution.step_name(),
            step_execution.status()
        ))
    }
}

impl ChunkListener for RecordingLifecycleListener {
    fn before_chunk(&self, _step_execution: &StepExecution) -> anyhow::Result<()> {
        self.record("before_chunk".to_string())
    }

    fn after_chunk(&self, step_execution: &StepExecution) -> anyhow::Result<()> {
        self.record(format!(
            "after_chunk:{}",
            step_execution.counters().commit_count()
        ))
    }

    fn after_chunk_error(
        &self,
        _step_execution: &StepExecution,
        error: &BatchError,
    ) -> anyhow::Result<()> {
        let phase = match error {
            BatchError::ItemRead(_) => "read",
            BatchError::ItemProcess(_) => "process",
            BatchError::ItemWrite(_) => "write",
            BatchError::SkipLimitExceeded { .. } => "skip_limit",
            _ => "other",
        };
        self.record(format!("after_chunk_error:{phase}"))
    }
}

/// Ids `1..=count`
pub fn ids(count: u32) -> Vec<u32> {
    (1..=count).collect()
}
