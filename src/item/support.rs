//! In-memory adapters for the item contracts.

use crate::item::{ItemError, ItemProcessor, ItemReader, ItemWriter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reader over a pre-built list of read outcomes
#[derive(Debug)]
pub struct ListItemReader<T> {
    remaining: VecDeque<Result<T, ItemError>>,
}

impl<T> ListItemReader<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            remaining: items.into_iter().map(Ok).collect(),
        }
    }

    /// Interleave read failures with items; each `Err` is returned by exactly one `read`
    pub fn from_results(results: Vec<Result<T, ItemError>>) -> Self {
        Self {
            remaining: results.into(),
        }
    }
}

#[async_trait]
impl<T: Send> ItemReader<T> for ListItemReader<T> {
    async fn read(&mut self) -> Result<Option<T>, ItemError> {
        match self.remaining.pop_front() {
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }
}

/// Processor that forwards every item unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughItemProcessor;

#[async_trait]
impl<T: Clone + Send + Sync> ItemProcessor<T, T> for PassThroughItemProcessor {
    async fn process(&self, item: &T) -> Result<Option<T>, ItemError> {
        Ok(Some(item.clone()))
    }
}

/// Processor backed by a synchronous closure
pub struct FnItemProcessor<I, O, F> {
    f: F,
    _types: PhantomData<fn(&I) -> O>,
}

impl<I, O, F> FnItemProcessor<I, O, F>
where
    F: Fn(&I) -> Result<Option<O>, ItemError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<I, O, F> ItemProcessor<I, O> for FnItemProcessor<I, O, F>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> Result<Option<O>, ItemError> + Send + Sync,
{
    async fn process(&self, item: &I) -> Result<Option<O>, ItemError> {
        (self.f)(item)
    }
}

/// Writer that appends every committed batch to a shared buffer.
///
/// Clones share the buffer, so a handle kept by the caller observes what the
/// step wrote after the writer has been moved into it.
#[derive(Debug)]
pub struct CollectingItemWriter<T> {
    written: Arc<Mutex<Vec<T>>>,
    batches: Arc<Mutex<usize>>,
}

impl<T> Clone for CollectingItemWriter<T> {
    fn clone(&self) -> Self {
        Self {
            written: Arc::clone(&self.written),
            batches: Arc::clone(&self.batches),
        }
    }
}

impl<T> Default for CollectingItemWriter<T> {
    fn default() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            batches: Arc::new(Mutex::new(0)),
        }
    }
}

impl<T: Clone> CollectingItemWriter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Vec<T> {
        self.written.lock().clone()
    }

    pub fn batch_count(&self) -> usize {
        *self.batches.lock()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> ItemWriter<T> for CollectingItemWriter<T> {
    async fn write(&mut self, items: &[T]) -> Result<(), ItemError> {
        self.written.lock().extend_from_slice(items);
        *self.batches.lock() += 1;
        Ok(())
    }
}
