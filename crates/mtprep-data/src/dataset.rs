//! Sample types, the persisted sample store, and split retrieval.

use mtprep_core::{Dataset, MtPrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One encoded sample pair.
///
/// `target_ids` carries the start/end sentinels; `source_ids` does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Source-language token ids.
    pub source_ids: Vec<u32>,
    /// Target-language token ids, wrapped in sos/eos.
    pub target_ids: Vec<u32>,
}

impl SampleRecord {
    /// Create a new sample.
    pub fn new(source_ids: Vec<u32>, target_ids: Vec<u32>) -> Self {
        Self {
            source_ids,
            target_ids,
        }
    }
}

impl From<(Vec<u32>, Vec<u32>)> for SampleRecord {
    fn from((source_ids, target_ids): (Vec<u32>, Vec<u32>)) -> Self {
        Self::new(source_ids, target_ids)
    }
}

/// Named splits of encoded samples, persisted as one JSON object keyed by
/// split name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleStore {
    splits: BTreeMap<String, Vec<SampleRecord>>,
}

impl SampleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a split.
    pub fn insert(&mut self, name: impl Into<String>, samples: Vec<SampleRecord>) {
        self.splits.insert(name.into(), samples);
    }

    /// Get a split by name.
    pub fn split(&self, name: &str) -> Result<&[SampleRecord]> {
        self.splits
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MtPrepError::UnknownSplit {
                name: name.to_owned(),
                available: self.split_names().map(str::to_owned).collect(),
            })
    }

    /// Remove and return a split.
    pub fn take_split(&mut self, name: &str) -> Result<Vec<SampleRecord>> {
        match self.splits.remove(name) {
            Some(samples) => Ok(samples),
            None => Err(MtPrepError::UnknownSplit {
                name: name.to_owned(),
                available: self.split_names().map(str::to_owned).collect(),
            }),
        }
    }

    /// Split names in sorted order.
    pub fn split_names(&self) -> impl Iterator<Item = &str> {
        self.splits.keys().map(String::as_str)
    }

    /// Total samples across splits.
    pub fn total_samples(&self) -> usize {
        self.splits.values().map(Vec::len).sum()
    }

    /// Write the store as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MtPrepError::io_at(parent, e))?;
        }
        let file = File::create(path).map_err(|e| MtPrepError::io_at(path, e))?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|e| {
            MtPrepError::Serialization(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tracing::info!(path = %path.display(), samples = self.total_samples(), "Saved samples");
        Ok(())
    }

    /// Read a store written by [`SampleStore::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MtPrepError::io_at(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            MtPrepError::Serialization(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

/// Read-only access to one split of encoded samples.
#[derive(Debug, Clone)]
pub struct TranslationDataset {
    split: String,
    samples: Vec<SampleRecord>,
}

impl TranslationDataset {
    /// Load one split from a sample artifact.
    pub fn load<P: AsRef<Path>>(path: P, split: &str) -> Result<Self> {
        tracing::info!(split = split, "loading {} samples...", split);
        let mut store = SampleStore::load(path)?;
        let samples = store.take_split(split)?;
        tracing::info!(split = split, samples = samples.len(), "Split loaded");
        Ok(Self::from_samples(split, samples))
    }

    /// Create a dataset from samples already in memory.
    pub fn from_samples(split: impl Into<String>, samples: Vec<SampleRecord>) -> Self {
        Self {
            split: split.into(),
            samples,
        }
    }

    /// Split name.
    pub fn split(&self) -> &str {
        &self.split
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the raw `(source_ids, target_ids)` pair at `index`.
    pub fn get(&self, index: usize) -> Option<(&[u32], &[u32])> {
        self.samples
            .get(index)
            .map(|s| (s.source_ids.as_slice(), s.target_ids.as_slice()))
    }

    /// Owned `(source_ids, target_ids)` pair at `index`.
    pub fn pair(&self, index: usize) -> Result<(Vec<u32>, Vec<u32>)> {
        self.samples
            .get(index)
            .map(|s| (s.source_ids.clone(), s.target_ids.clone()))
            .ok_or(MtPrepError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            })
    }

    /// Get all samples.
    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }
}

impl Dataset for TranslationDataset {
    type Item = SampleRecord;

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Option<SampleRecord> {
        self.samples.get(index).cloned()
    }
}
