//! In-memory repositories - fallback when no database is configured.

mod member;
mod post;

pub use member::InMemoryMemberRepository;
pub use post::InMemoryPostRepository;
