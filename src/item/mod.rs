//! # Items and Chunks
//!
//! Reader/processor/writer contracts, the typed item error they fail with,
//! and chunk assembly on top of a reader.

pub mod chunk;
pub mod error;
pub mod support;
pub mod traits;

pub use chunk::{Chunk, ChunkAssembler};
pub use error::{ErrorKind, ItemError};
pub use support::{CollectingItemWriter, FnItemProcessor, ListItemReader, PassThroughItemProcessor};
pub use traits::{ItemProcessor, ItemReader, ItemWriter};
