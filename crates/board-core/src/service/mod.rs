//! Application services - use cases built on top of the ports.

mod member;
mod post;
mod sweep;

pub use member::MemberService;
pub use post::PostService;
pub use sweep::{OrphanSweeper, SweepReport};
