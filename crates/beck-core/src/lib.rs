//! # beck-core
//! Foundation types and collaborator contracts for the Beck spend engine.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod view;
