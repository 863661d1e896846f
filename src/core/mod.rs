// src/core/mod.rs

//! Core data structures and types

pub mod amplitude;
pub mod constants;
pub mod error;
pub(crate) mod bits;

// Re-export public types for convenient access via `qstate::core::TypeName`
pub use amplitude::Amplitude;
pub use constants::tolerance::EPSILON;
pub use error::{QStateError, QStateResult, QubitId};
