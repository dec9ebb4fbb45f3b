use crate::error::BatchError;
use crate::item::{ItemError, ItemReader};
use crate::models::StepCounters;
use tracing::debug;

/// Ordered batch of items sharing one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<T> {
    items: Vec<T>,
    /// Read ordinal (1-based) of the first item in this chunk
    first_item_number: u64,
    skipped_reads: u64,
    end_of_input: bool,
}

impl<T> Chunk<T> {
    pub fn new(first_item_number: u64) -> Self {
        Self {
            items: Vec::new(),
            first_item_number,
            skipped_reads: 0,
            end_of_input: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn skipped_reads(&self) -> u64 {
        self.skipped_reads
    }

    /// True when the reader signalled end-of-input while filling this chunk
    pub fn is_end_of_input(&self) -> bool {
        self.end_of_input
    }

    /// A chunk that neither read an item nor skipped a read has nothing to commit
    pub fn has_activity(&self) -> bool {
        !self.items.is_empty() || self.skipped_reads > 0
    }

    /// Items paired with their read ordinal, in source order
    pub fn numbered(self) -> impl Iterator<Item = (u64, T)> {
        let first = self.first_item_number;
        self.items
            .into_iter()
            .enumerate()
            .map(move |(offset, item)| (first + offset as u64, item))
    }
}

/// Pulls items from a reader until a chunk is full or input is exhausted
#[derive(Debug, Clone, Copy)]
pub struct ChunkAssembler {
    chunk_size: usize,
}

impl ChunkAssembler {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fill one chunk.
    ///
    /// Every successful read bumps `read_count` immediately, so items read
    /// before a fatal failure stay counted. Read failures are handed to
    /// `on_read_error`; returning `Ok(())` treats the failure as skipped and
    /// keeps reading, returning `Err` aborts the chunk.
    pub async fn assemble<T, R, F>(
        &self,
        reader: &mut R,
        counters: &mut StepCounters,
        mut on_read_error: F,
    ) -> Result<Chunk<T>, BatchError>
    where
        T: Send,
        R: ItemReader<T> + ?Sized,
        F: FnMut(&mut StepCounters, ItemError) -> Result<(), BatchError>,
    {
        let mut chunk = Chunk::new(counters.read_count() + 1);

        while chunk.items.len() < self.chunk_size {
            match reader.read().await {
                Ok(Some(item)) => {
                    counters.record_read();
                    chunk.items.push(item);
                }
                Ok(None) => {
                    chunk.end_of_input = true;
                    break;
                }
                Err(error) => {
                    on_read_error(counters, error)?;
                    chunk.skipped_reads += 1;
                }
            }
        }

        debug!(
            items = chunk.items.len(),
            skipped_reads = chunk.skipped_reads,
            end_of_input = chunk.end_of_input,
            "Chunk assembled"
        );

        Ok(chunk)
    }
}
