//! DataLoader for creating training batches.

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::collator::{PadCollator, TranslationBatch};
use crate::dataset::{SampleRecord, TranslationDataset};
use mtprep_core::{BatchConfig, MtPrepError, Result};

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Batch size.
    pub batch_size: usize,
    /// Whether to shuffle the data.
    pub shuffle: bool,
    /// Random seed for shuffling.
    pub seed: u64,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            seed: 42,
            drop_last: false,
        }
    }
}

impl From<&BatchConfig> for DataLoaderConfig {
    fn from(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            shuffle: config.shuffle,
            seed: config.seed,
            drop_last: config.drop_last,
        }
    }
}

/// DataLoader that yields collated batches from a dataset split.
pub struct DataLoader {
    /// The dataset.
    dataset: TranslationDataset,
    /// Collator applied to every batch.
    collator: PadCollator,
    /// Configuration.
    config: DataLoaderConfig,
    /// Current index permutation.
    indices: Vec<usize>,
    /// Current position in the dataset.
    position: usize,
}

impl DataLoader {
    /// Create a new DataLoader.
    pub fn new(
        dataset: TranslationDataset,
        collator: PadCollator,
        config: DataLoaderConfig,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(MtPrepError::Config("batch_size must be positive".into()));
        }

        let n = dataset.len();
        let mut indices: Vec<usize> = (0..n).collect();

        if config.shuffle {
            let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
            indices.shuffle(&mut rng);
        }

        tracing::debug!(
            split = dataset.split(),
            samples = n,
            batch_size = config.batch_size,
            shuffle = config.shuffle,
            "DataLoader ready"
        );

        Ok(Self {
            dataset,
            collator,
            config,
            indices,
            position: 0,
        })
    }

    /// Reset the DataLoader for a new epoch.
    pub fn reset(&mut self, new_seed: Option<u64>) {
        self.position = 0;
        if self.config.shuffle {
            let seed = new_seed.unwrap_or(self.config.seed);
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            self.indices.sort_unstable();
            self.indices.shuffle(&mut rng);
        }
    }

    /// Get the number of batches.
    pub fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.config.drop_last {
            n / self.config.batch_size
        } else {
            n.div_ceil(self.config.batch_size)
        }
    }

    /// Get the total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Check if the loader is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Get the next batch.
    pub fn next_batch(&mut self) -> Option<Result<TranslationBatch>> {
        if self.position >= self.indices.len() {
            return None;
        }

        let batch_end = (self.position + self.config.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.position..batch_end];

        // Check if we should drop incomplete batch
        if self.config.drop_last && batch_indices.len() < self.config.batch_size {
            return None;
        }

        let samples: Vec<&SampleRecord> = batch_indices
            .iter()
            .filter_map(|&i| self.dataset.samples().get(i))
            .collect();
        let batch = self.collator.collate(&samples);
        self.position = batch_end;

        Some(batch)
    }
}

impl Iterator for DataLoader {
    type Item = Result<TranslationBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}
