use crate::error::Phase;
use serde::{Deserialize, Serialize};

/// Monotonic execution counters of one step run.
///
/// Counters are telemetry, not transactional state: a rolled-back chunk keeps
/// whatever read/process/skip counts it already accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounters {
    read_count: u64,
    write_count: u64,
    filter_count: u64,
    commit_count: u64,
    rollback_count: u64,
    read_skip_count: u64,
    process_skip_count: u64,
    write_skip_count: u64,
    retry_count: u64,
}

impl StepCounters {
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    pub fn filter_count(&self) -> u64 {
        self.filter_count
    }

    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    pub fn rollback_count(&self) -> u64 {
        self.rollback_count
    }

    pub fn read_skip_count(&self) -> u64 {
        self.read_skip_count
    }

    pub fn process_skip_count(&self) -> u64 {
        self.process_skip_count
    }

    pub fn write_skip_count(&self) -> u64 {
        self.write_skip_count
    }

    /// Failed processing attempts across all items (cumulative)
    pub fn retry_count(&self) -> u64 {
        self.retry_count
    }

    /// Aggregate skips over all phases
    pub fn skip_count(&self) -> u64 {
        self.read_skip_count + self.process_skip_count + self.write_skip_count
    }

    pub(crate) fn record_read(&mut self) {
        self.read_count += 1;
    }

    pub(crate) fn record_written(&mut self, items: u64) {
        self.write_count += items;
    }

    pub(crate) fn record_filtered(&mut self) {
        self.filter_count += 1;
    }

    pub(crate) fn record_commit(&mut self) {
        self.commit_count += 1;
    }

    pub(crate) fn record_rollback(&mut self) {
        self.rollback_count += 1;
    }

    pub(crate) fn record_retries(&mut self, failed_attempts: u64) {
        self.retry_count += failed_attempts;
    }

    pub(crate) fn record_skip(&mut self, phase: Phase) {
        match phase {
            Phase::Read => self.read_skip_count += 1,
            Phase::Process => self.process_skip_count += 1,
            Phase::Write => self.write_skip_count += 1,
        }
    }
}
