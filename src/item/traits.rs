//! # Item I/O Contracts
//!
//! The three collaborators a chunk-oriented step drives. Implementations live
//! at the adapter boundary (files, HTTP lookups, queues); the executor only
//! sees these signatures.

use crate::item::ItemError;
use async_trait::async_trait;

/// Source of items, pulled one at a time in source order
#[async_trait]
pub trait ItemReader<T: Send>: Send {
    /// Read the next item.
    ///
    /// * `Ok(Some(item))` - the next item
    /// * `Ok(None)` - end of input; the reader will not be called again in this step
    /// * `Err` - the read failed; subject to read-phase skip classification
    async fn read(&mut self) -> Result<Option<T>, ItemError>;
}

/// Per-item transformation, invoked once per retry attempt
#[async_trait]
pub trait ItemProcessor<I: Sync, O: Send>: Send + Sync {
    /// Transform an item.
    ///
    /// Returning `Ok(None)` filters the item out of the write batch.
    async fn process(&self, item: &I) -> Result<Option<O>, ItemError>;
}

/// Sink for a whole chunk; one call per transaction
#[async_trait]
pub trait ItemWriter<T: Sync>: Send {
    /// Write the batch. Either every item is applied or the call fails.
    async fn write(&mut self, items: &[T]) -> Result<(), ItemError>;
}
