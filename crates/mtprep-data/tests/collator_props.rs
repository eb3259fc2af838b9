//! Property tests for batch collation.

use mtprep_data::PadCollator;
use proptest::prelude::*;

type Pair = (Vec<u32>, Vec<u32>);

fn pairs() -> impl Strategy<Value = Vec<Pair>> {
    prop::collection::vec(
        (
            prop::collection::vec(4u32..100, 0..12),
            prop::collection::vec(4u32..100, 0..12),
        ),
        1..24,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_shapes_match_batch(batch in pairs()) {
        let out = PadCollator::new(0, -1).unwrap().collate(&batch).unwrap();
        let max_src = batch.iter().map(|p| p.0.len()).max().unwrap();
        let max_tgt = batch.iter().map(|p| p.1.len()).max().unwrap();

        prop_assert_eq!(out.padded_source.dim(), (batch.len(), max_src));
        prop_assert_eq!(out.padded_target.dim(), (batch.len(), max_tgt));
        prop_assert_eq!(out.source_lengths.len(), batch.len());
    }

    #[test]
    fn prop_lengths_non_increasing(batch in pairs()) {
        let out = PadCollator::new(0, -1).unwrap().collate(&batch).unwrap();
        let lengths = out.source_lengths.to_vec();
        prop_assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_order_is_stable_permutation(batch in pairs()) {
        let out = PadCollator::new(0, -1).unwrap().collate(&batch).unwrap();

        let mut seen = out.order.clone();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..batch.len()).collect::<Vec<_>>());

        for w in out.order.windows(2) {
            if batch[w[0]].0.len() == batch[w[1]].0.len() {
                prop_assert!(w[0] < w[1]);
            }
        }
    }

    #[test]
    fn prop_rows_aligned_and_padded(batch in pairs(), pad in 0u32..4, ignore in -200i64..-1) {
        let collator = PadCollator::new(pad, ignore).unwrap();
        let out = collator.collate(&batch).unwrap();

        for (row, &index) in out.order.iter().enumerate() {
            let (src, tgt) = &batch[index];
            prop_assert_eq!(out.source_lengths[row], src.len() as i64);

            let src_row = out.source_row(row);
            for (col, &value) in src_row.iter().enumerate() {
                let expected = src.get(col).map_or(i64::from(pad), |&id| i64::from(id));
                prop_assert_eq!(value, expected);
            }

            let tgt_row = out.target_row(row);
            for (col, &value) in tgt_row.iter().enumerate() {
                let expected = tgt.get(col).map_or(ignore, |&id| i64::from(id));
                prop_assert_eq!(value, expected);
            }
        }
    }

    #[test]
    fn prop_recollate_sorted_is_identity(batch in pairs()) {
        let collator = PadCollator::new(0, -1).unwrap();
        let first = collator.collate(&batch).unwrap();
        let sorted: Vec<&Pair> = first.order.iter().map(|&i| &batch[i]).collect();
        let second = collator.collate(&sorted).unwrap();

        prop_assert_eq!(second.order, (0..batch.len()).collect::<Vec<_>>());
        prop_assert_eq!(second.padded_source, first.padded_source);
        prop_assert_eq!(second.padded_target, first.padded_target);
    }
}
