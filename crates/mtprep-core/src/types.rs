//! Common type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a parallel corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Source language (model input).
    Source,
    /// Target language (model output).
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Phase of a corpus build, reported to callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStage {
    /// Counting token frequencies on one side of the vocabulary split.
    CountTokens {
        /// Side being counted.
        side: Side,
    },
    /// Encoding a split into id sequences.
    EncodeSplit {
        /// Split name.
        split: String,
    },
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountTokens { side } => write!(f, "counting {} tokens", side),
            Self::EncodeSplit { split } => write!(f, "encoding {}", split),
        }
    }
}

/// Per-split outcome of encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    /// Split name.
    pub split: String,
    /// Line pairs read.
    pub lines: usize,
    /// Samples kept after length filtering.
    pub kept: usize,
    /// Samples dropped for meeting or exceeding a length limit.
    pub dropped: usize,
    /// Source tokens replaced with the unknown id, over every line read.
    pub source_unknown: usize,
    /// Target tokens replaced with the unknown id, over every line read.
    pub target_unknown: usize,
}
