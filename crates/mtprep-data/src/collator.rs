//! Data collation utilities.
//!
//! [`PadCollator`] turns a list of variable-length sample pairs into three
//! row-aligned arrays: padded source ids, padded target ids and the true
//! source lengths. Rows are ordered by descending source length, which is
//! what packed-sequence encoders expect.

use crate::dataset::SampleRecord;
use mtprep_core::{MtPrepError, PipelineConfig, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Anything that exposes a source and a target id sequence.
pub trait SamplePair {
    /// Source-language ids.
    fn source_ids(&self) -> &[u32];
    /// Target-language ids.
    fn target_ids(&self) -> &[u32];
}

impl SamplePair for SampleRecord {
    fn source_ids(&self) -> &[u32] {
        &self.source_ids
    }

    fn target_ids(&self) -> &[u32] {
        &self.target_ids
    }
}

impl SamplePair for (Vec<u32>, Vec<u32>) {
    fn source_ids(&self) -> &[u32] {
        &self.0
    }

    fn target_ids(&self) -> &[u32] {
        &self.1
    }
}

impl SamplePair for (&[u32], &[u32]) {
    fn source_ids(&self) -> &[u32] {
        self.0
    }

    fn target_ids(&self) -> &[u32] {
        self.1
    }
}

impl<T: SamplePair + ?Sized> SamplePair for &T {
    fn source_ids(&self) -> &[u32] {
        (**self).source_ids()
    }

    fn target_ids(&self) -> &[u32] {
        (**self).target_ids()
    }
}

/// Pads, sorts and stacks translation samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadCollator {
    pad_id: i64,
    ignore_id: i64,
}

impl PadCollator {
    /// Create a collator. The ignore sentinel must differ from the pad id.
    pub fn new(pad_id: u32, ignore_id: i64) -> Result<Self> {
        let pad_id = i64::from(pad_id);
        if pad_id == ignore_id {
            return Err(MtPrepError::Config(format!(
                "ignore_id {} collides with pad_id",
                ignore_id
            )));
        }
        Ok(Self { pad_id, ignore_id })
    }

    /// Create a collator from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.special.pad_id, config.batch.ignore_id)
    }

    /// Source padding value.
    pub fn pad_id(&self) -> i64 {
        self.pad_id
    }

    /// Target padding value.
    pub fn ignore_id(&self) -> i64 {
        self.ignore_id
    }

    /// Collate samples into a batch.
    ///
    /// Source rows are right-padded with the pad id and target rows with the
    /// ignore id, each to the longest sequence on its side. Rows are then
    /// stably sorted by source length, longest first; samples of equal
    /// length keep their input order.
    pub fn collate<S: SamplePair>(&self, samples: &[S]) -> Result<TranslationBatch> {
        if samples.is_empty() {
            return Err(MtPrepError::EmptyBatch);
        }

        let batch_size = samples.len();
        let max_source_len = samples
            .iter()
            .map(|s| s.source_ids().len())
            .max()
            .unwrap_or(0);
        let max_target_len = samples
            .iter()
            .map(|s| s.target_ids().len())
            .max()
            .unwrap_or(0);

        // `sort_by_key` is stable, so ties keep input order.
        let mut order: Vec<usize> = (0..batch_size).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(samples[i].source_ids().len()));

        let mut padded_source = Array2::from_elem((batch_size, max_source_len), self.pad_id);
        let mut padded_target = Array2::from_elem((batch_size, max_target_len), self.ignore_id);
        let mut source_lengths = Array1::<i64>::zeros(batch_size);

        for (row, &index) in order.iter().enumerate() {
            let sample = &samples[index];
            let source = sample.source_ids();
            let target = sample.target_ids();

            for (dst, &id) in padded_source.row_mut(row).iter_mut().zip(source) {
                *dst = i64::from(id);
            }
            for (dst, &id) in padded_target.row_mut(row).iter_mut().zip(target) {
                *dst = i64::from(id);
            }
            source_lengths[row] = source.len() as i64;
        }

        Ok(TranslationBatch {
            padded_source,
            padded_target,
            source_lengths,
            order,
            batch_size,
            max_source_len,
            max_target_len,
        })
    }
}

/// A collated batch ready for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationBatch {
    /// Padded source ids [batch_size, max_source_len].
    pub padded_source: Array2<i64>,
    /// Padded target ids [batch_size, max_target_len].
    pub padded_target: Array2<i64>,
    /// Unpadded source lengths [batch_size], non-increasing.
    pub source_lengths: Array1<i64>,
    /// Input position of the sample in each output row.
    pub order: Vec<usize>,
    /// Batch size.
    pub batch_size: usize,
    /// Longest source sequence.
    pub max_source_len: usize,
    /// Longest target sequence.
    pub max_target_len: usize,
}

impl TranslationBatch {
    /// Source row `row`, padding included.
    pub fn source_row(&self, row: usize) -> ArrayView1<'_, i64> {
        self.padded_source.row(row)
    }

    /// Target row `row`, padding included.
    pub fn target_row(&self, row: usize) -> ArrayView1<'_, i64> {
        self.padded_target.row(row)
    }

    /// Number of non-padding target positions.
    pub fn target_tokens(&self, ignore_id: i64) -> usize {
        self.padded_target.iter().filter(|&&id| id != ignore_id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn collator() -> PadCollator {
        PadCollator::new(0, -1).unwrap()
    }

    #[test]
    fn test_two_sample_scenario() {
        let batch: Vec<(Vec<u32>, Vec<u32>)> = vec![
            (vec![5, 6, 7], vec![1, 9, 2]),
            (vec![4, 4], vec![1, 8, 8, 2]),
        ];
        let out = collator().collate(&batch).unwrap();

        assert_eq!(out.batch_size, 2);
        assert_eq!(out.max_source_len, 3);
        assert_eq!(out.max_target_len, 4);
        assert_eq!(out.padded_source, array![[5i64, 6, 7], [4, 4, 0]]);
        assert_eq!(out.padded_target, array![[1i64, 9, 2, -1], [1, 8, 8, 2]]);
        assert_eq!(out.source_lengths, array![3i64, 2]);
        assert_eq!(out.order, vec![0, 1]);
    }

    #[test]
    fn test_sort_reorders_rows_together() {
        let batch: Vec<(Vec<u32>, Vec<u32>)> = vec![
            (vec![4], vec![1, 2]),
            (vec![5, 6, 7], vec![1, 9, 9, 9, 2]),
            (vec![8, 9], vec![1, 3, 2]),
        ];
        let out = collator().collate(&batch).unwrap();

        assert_eq!(out.order, vec![1, 2, 0]);
        assert_eq!(out.source_lengths, array![3i64, 2, 1]);
        assert_eq!(out.padded_source, array![[5i64, 6, 7], [8, 9, 0], [4, 0, 0]]);
        assert_eq!(
            out.padded_target,
            array![[1i64, 9, 9, 9, 2], [1, 3, 2, -1, -1], [1, 2, -1, -1, -1]]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let batch: Vec<(Vec<u32>, Vec<u32>)> = vec![
            (vec![10, 11], vec![1, 2]),
            (vec![20], vec![1, 2]),
            (vec![30, 31], vec![1, 5, 2]),
            (vec![40, 41, 42], vec![1, 2]),
            (vec![50, 51], vec![1, 2]),
        ];
        let out = collator().collate(&batch).unwrap();

        assert_eq!(out.order, vec![3, 0, 2, 4, 1]);
        assert_eq!(out.source_row(1)[0], 10);
        assert_eq!(out.source_row(2)[0], 30);
        assert_eq!(out.source_row(3)[0], 50);
    }

    #[test]
    fn test_single_sample_has_no_padding() {
        let batch = vec![SampleRecord::new(vec![7, 8, 9], vec![1, 4, 2])];
        let out = collator().collate(&batch).unwrap();

        assert_eq!(out.padded_source, array![[7i64, 8, 9]]);
        assert_eq!(out.padded_target, array![[1i64, 4, 2]]);
        assert_eq!(out.source_lengths, array![3i64]);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let batch: Vec<SampleRecord> = Vec::new();
        assert!(matches!(
            collator().collate(&batch),
            Err(MtPrepError::EmptyBatch)
        ));
    }

    #[test]
    fn test_zero_length_sequences() {
        let batch: Vec<(Vec<u32>, Vec<u32>)> = vec![(vec![], vec![1, 2]), (vec![], vec![])];
        let out = collator().collate(&batch).unwrap();

        assert_eq!(out.padded_source.dim(), (2, 0));
        assert_eq!(out.source_lengths, array![0i64, 0]);
        assert_eq!(out.padded_target, array![[1i64, 2], [-1, -1]]);
    }

    #[test]
    fn test_resorting_sorted_batch_is_identity() {
        let batch: Vec<(Vec<u32>, Vec<u32>)> = vec![
            (vec![1, 2, 3], vec![1, 2]),
            (vec![1, 2], vec![1, 2]),
            (vec![1, 2], vec![1, 7, 2]),
        ];
        let out = collator().collate(&batch).unwrap();
        assert_eq!(out.order, vec![0, 1, 2]);
    }

    #[test]
    fn test_borrowed_pairs() {
        let src = [4u32, 5];
        let tgt = [1u32, 2];
        let batch = vec![(&src[..], &tgt[..])];
        let out = collator().collate(&batch).unwrap();
        assert_eq!(out.padded_source, array![[4i64, 5]]);
    }

    #[test]
    fn test_ignore_must_differ_from_pad() {
        assert!(PadCollator::new(0, 0).is_err());
        let custom = PadCollator::new(3, -100).unwrap();
        let batch: Vec<(Vec<u32>, Vec<u32>)> =
            vec![(vec![4, 4], vec![1, 2]), (vec![4], vec![1, 5, 2])];
        let out = custom.collate(&batch).unwrap();
        assert_eq!(out.padded_source, array![[4i64, 4], [4, 3]]);
        assert_eq!(out.padded_target, array![[1i64, 2, -100], [1, 5, 2]]);
        assert_eq!(out.target_tokens(custom.ignore_id()), 5);
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::default();
        let collator = PadCollator::from_config(&config).unwrap();
        assert_eq!(collator.pad_id(), 0);
        assert_eq!(collator.ignore_id(), -1);
    }
}
