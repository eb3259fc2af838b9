//! Error types for mtprep.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mtprep operations.
pub type Result<T> = std::result::Result<T, MtPrepError>;

/// Main error type for mtprep operations.
#[derive(Error, Debug)]
pub enum MtPrepError {
    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parallel corpus files do not have the same number of lines.
    #[error(
        "Corpus mismatch: {} has {source_lines} lines but {} has {target_lines}",
        .source_path.display(),
        .target_path.display()
    )]
    CorpusMismatch {
        /// Source-language file.
        source_path: PathBuf,
        /// Target-language file.
        target_path: PathBuf,
        /// Line count of the source file.
        source_lines: usize,
        /// Line count of the target file.
        target_lines: usize,
    },

    /// A token was not found in the vocabulary while unknown tokens are rejected.
    #[error("Unknown token {token:?} on line {line}")]
    UnknownToken {
        /// The token that has no id.
        token: String,
        /// 1-based corpus line number.
        line: usize,
    },

    /// Batch collation was asked to assemble zero samples.
    #[error("Cannot collate an empty batch")]
    EmptyBatch,

    /// Vocabulary directions disagree or reserved ids are wrong.
    #[error("Inconsistent vocabulary: {0}")]
    VocabularyInconsistent(String),

    /// Named split is not present in the sample store.
    #[error("Unknown split '{name}' (available: {available:?})")]
    UnknownSplit {
        /// Requested split name.
        name: String,
        /// Splits that exist.
        available: Vec<String>,
    },

    /// Sample index past the end of a split.
    #[error("Index {index} out of range for split of {len} samples")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of samples in the split.
        len: usize,
    },

    /// Tokenizer errors.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MtPrepError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io_at(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}
