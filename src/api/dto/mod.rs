//! Data Transfer Objects for REST request/response serialization.
//!
//! Records, listings and statistics are serialized as the domain types
//! themselves; only query strings and the kill form get their own shapes.

pub mod kill_dto;
pub mod murder_dto;

pub use kill_dto::*;
pub use murder_dto::*;
