pub mod batch;
pub mod chunk;
pub mod splitter;

pub use batch::{ChunkBatch, assemble_batch};
pub use chunk::{Chunk, chunk_id};
pub use splitter::{SplitPolicy, TextSplitter};
