//! `taskgate-core`: shared domain primitives.
//!
//! This crate contains **pure domain** building blocks (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod validation;

pub use error::{DomainError, DomainResult};
pub use id::{TaskId, UserId};
pub use validation::FieldErrors;
