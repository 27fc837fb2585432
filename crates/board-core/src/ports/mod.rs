//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod repository;
mod storage;

pub use repository::{BaseRepository, MemberDirectory, MemberRepository, PostRepository};
pub use storage::{BinaryStore, StoredBlob};
