pub mod byte_source;
pub mod file;
pub mod memory;

pub use byte_source::{ByteSource, SourceError, SourceFactory};
pub use file::{DEFAULT_CHUNK_SIZE, FileSource, FileSourceFactory, MAX_CHUNK_SIZE};
pub use memory::{MemorySource, MemorySourceFactory};
