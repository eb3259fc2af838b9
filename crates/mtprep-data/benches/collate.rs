//! Benchmarks for batch collation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtprep_data::{PadCollator, SampleRecord};

fn synthetic_batch(n: usize, max_len: usize) -> Vec<SampleRecord> {
    (0..n)
        .map(|i| {
            let src_len = (i * 7) % max_len + 1;
            let tgt_len = (i * 11) % max_len + 2;
            SampleRecord::new(
                (0..src_len).map(|j| (4 + j) as u32).collect(),
                (0..tgt_len).map(|j| (4 + j) as u32).collect(),
            )
        })
        .collect()
}

fn bench_collate_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("collate");
    let collator = PadCollator::new(0, -1).unwrap();

    for n in [8, 32, 128, 512] {
        let batch = synthetic_batch(n, 50);
        group.bench_with_input(BenchmarkId::new("batch", n), &batch, |b, batch| {
            b.iter(|| collator.collate(black_box(batch)).unwrap());
        });
    }

    group.finish();
}

fn bench_collate_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("collate_max_len");
    let collator = PadCollator::new(0, -1).unwrap();

    for max_len in [10, 50, 100, 200] {
        let batch = synthetic_batch(32, max_len);
        group.bench_with_input(BenchmarkId::new("max_len", max_len), &batch, |b, batch| {
            b.iter(|| collator.collate(black_box(batch)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_collate_batch_sizes, bench_collate_lengths);
criterion_main!(benches);
