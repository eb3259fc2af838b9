//! Core types, traits, and configuration for mtprep.
//!
//! This crate provides the foundational abstractions shared by the builder,
//! the batch assembler, and the CLI:
//!
//! - Pipeline configuration (reserved ids, vocabulary caps, length limits, batching)
//! - Tokenizer, dataset, and build-callback traits
//! - Common type definitions
//! - Error handling infrastructure

#![warn(missing_docs)]

mod config;
mod error;
mod traits;
mod types;

pub use config::*;
pub use error::*;
pub use traits::*;
pub use types::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{MtPrepError, Result};
    pub use crate::traits::*;
    pub use crate::types::*;
}
