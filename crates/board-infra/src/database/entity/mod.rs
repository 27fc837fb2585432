//! SeaORM entities for the board schema.

pub mod attachment;
pub mod member;
pub mod post;
