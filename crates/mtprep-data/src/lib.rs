//! Corpus preprocessing and batching for mtprep.
//!
//! This crate provides:
//! - Tokenizers for the source and target languages
//! - Token counting and frequency-capped vocabularies
//! - Offline encoding of parallel corpora into id sequences
//! - JSON artifacts for vocabularies and encoded samples
//! - Padding collation and a DataLoader for training batches
//! - Length histograms and build callbacks

#![warn(missing_docs)]

pub mod artifacts;
pub mod builder;
pub mod callbacks;
pub mod collator;
pub mod corpus;
pub mod dataloader;
pub mod dataset;
pub mod stats;
pub mod tokenizer;
pub mod vocab;

pub use artifacts::*;
pub use builder::*;
pub use callbacks::*;
pub use collator::*;
pub use corpus::*;
pub use dataloader::*;
pub use dataset::*;
pub use stats::*;
pub use tokenizer::*;
pub use vocab::*;
