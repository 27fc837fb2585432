//! # Board Shared
//!
//! Wire types for the board API. Kept free of server dependencies so clients
//! can compile against the same definitions.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
