//! Sequence length histograms for inspecting a corpus before choosing
//! `maxlen_in` / `maxlen_out`.

use std::fmt::Write;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 50;

/// Equal-width histogram over sequence lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthHistogram {
    min: usize,
    max: usize,
    bin_width: f64,
    counts: Vec<usize>,
    total: usize,
    sum: usize,
}

impl LengthHistogram {
    /// Bin `lengths` into `bins` equal-width buckets spanning `[min, max]`.
    ///
    /// An empty input yields a histogram with all-zero counts.
    pub fn new(lengths: &[usize], bins: usize) -> Self {
        let bins = bins.max(1);
        let min = lengths.iter().copied().min().unwrap_or(0);
        let max = lengths.iter().copied().max().unwrap_or(0);
        // A degenerate range still gets a unit-width bin.
        let span = (max - min).max(1) as f64;
        let bin_width = span / bins as f64;

        let mut counts = vec![0; bins];
        for &len in lengths {
            let bin = (((len - min) as f64 / bin_width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Self {
            min,
            max,
            bin_width,
            counts,
            total: lengths.len(),
            sum: lengths.iter().sum(),
        }
    }

    /// Per-bin counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of lengths binned.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Shortest length seen.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Longest length seen.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Mean length, or zero for an empty histogram.
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.sum as f64 / self.total as f64
        }
    }

    /// `[lower, upper)` edges of bin `i`.
    pub fn bin_edges(&self, i: usize) -> (f64, f64) {
        let lower = self.min as f64 + i as f64 * self.bin_width;
        (lower, lower + self.bin_width)
    }

    /// Probability densities; they integrate to one over the bin range.
    pub fn densities(&self) -> Vec<f64> {
        if self.total == 0 {
            return vec![0.0; self.counts.len()];
        }
        let norm = self.total as f64 * self.bin_width;
        self.counts.iter().map(|&c| c as f64 / norm).collect()
    }

    /// Render as text, one line per non-empty bin: range, count, density,
    /// and a bar scaled to `width`.
    pub fn render(&self, width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let densities = self.densities();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "lengths: n={} min={} max={} mean={:.2}",
            self.total,
            self.min,
            self.max,
            self.mean()
        );
        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let (lo, hi) = self.bin_edges(i);
            let bar = "#".repeat((count * width).div_ceil(peak));
            let _ = writeln!(
                out,
                "{:>7.1}-{:<7.1} {:>8} {:>8.4} {}",
                lo, hi, count, densities[i], bar
            );
        }
        out
    }
}
