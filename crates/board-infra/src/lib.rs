//! # Board Infrastructure
//!
//! Concrete implementations of the ports defined in `board-core`.
//! This crate contains the database repositories and the binary stores.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `thumbnails` - Thumbnail rendering for the local file store

#[cfg(feature = "postgres")]
pub mod database;
pub mod memory;
pub mod storage;

// Re-exports - In-Memory
pub use memory::{InMemoryMemberRepository, InMemoryPostRepository};
pub use storage::{InMemoryBinaryStore, LocalFileStore, LocalStoreConfig};

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, PostgresMemberRepository, PostgresPostRepository};
