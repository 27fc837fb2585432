//! Binary store implementations - local filesystem and in-memory.

mod local;
mod memory;

pub use local::{LocalFileStore, LocalStoreConfig};
pub use memory::InMemoryBinaryStore;
