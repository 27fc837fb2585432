//! # Board Core
//!
//! The domain layer of the board backend.
//! This crate contains the post lifecycle rules and the ports they depend on,
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::{MemberService, OrphanSweeper, PostService};
