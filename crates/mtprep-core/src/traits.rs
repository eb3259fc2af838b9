//! Core trait definitions.

use crate::{BuildStage, Result, SplitReport};

/// Maps a string to an ordered sequence of string tokens.
///
/// Implementations are pluggable; the builder never assumes a particular
/// segmentation algorithm.
pub trait TextTokenizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Tokenize one line of text.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;
}

impl<T: TextTokenizer + ?Sized> TextTokenizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        (**self).tokenize(text)
    }
}

/// Dataset trait for indexed sample access.
pub trait Dataset {
    /// The item type yielded by this dataset.
    type Item;

    /// Get the number of samples in the dataset.
    fn len(&self) -> usize;

    /// Check if the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a sample by index.
    fn get(&self, index: usize) -> Option<Self::Item>;
}

/// Callback trait for corpus build events.
pub trait BuildCallback {
    /// Called before a stage starts. `total` is the number of lines it will visit.
    fn on_stage_start(&mut self, _stage: &BuildStage, _total: usize) {}

    /// Called after each line of the current stage.
    fn on_line(&mut self, _position: usize) {}

    /// Called after a stage finishes.
    fn on_stage_end(&mut self, _stage: &BuildStage) {}

    /// Called after a split has been encoded.
    fn on_split_encoded(&mut self, _report: &SplitReport) {}
}
