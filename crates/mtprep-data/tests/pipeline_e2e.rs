//! End-to-end pipeline tests.
//!
//! These tests run the whole offline flow on files in a temp directory:
//! - corpus files -> builder -> vocab.json / data.json
//! - artifacts reloaded -> dataset -> DataLoader -> padded batches

use std::fs;
use std::path::Path;

use mtprep_core::{BuildCallback, MtPrepError, PipelineConfig, Side, SplitFiles};
use mtprep_data::{
    CorpusBuilder, DataLoader, DataLoaderConfig, PadCollator, SampleStore, TranslationDataset,
    VocabPair,
};

struct Silent;
impl BuildCallback for Silent {}

fn write_lines(path: &Path, lines: &[&str]) {
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

fn config_in(dir: &Path) -> PipelineConfig {
    let train_en = dir.join("train.en");
    let train_zh = dir.join("train.zh");
    let valid_en = dir.join("valid.en");
    let valid_zh = dir.join("valid.zh");

    write_lines(
        &train_en,
        &[
            "The cat sat.",
            "  The dog ran!  ",
            "A cat and a dog.",
            "Where is the cat?",
            "this line is far too long to keep around",
        ],
    );
    write_lines(&train_zh, &["猫坐着。", "狗跑了！", "一只猫和一只狗。", "猫在哪里？", "太长"]);
    write_lines(&valid_en, &["The bird sang."]);
    write_lines(&valid_zh, &["鸟唱歌。"]);

    let mut config = PipelineConfig::default();
    config.lengths.maxlen_in = 8;
    config.lengths.maxlen_out = 12;
    config.corpus.splits = vec![
        SplitFiles {
            name: "train".into(),
            source: train_en,
            target: train_zh,
        },
        SplitFiles {
            name: "valid".into(),
            source: valid_en,
            target: valid_zh,
        },
    ];
    config.corpus.vocab_file = dir.join("out/vocab.json");
    config.corpus.data_file = dir.join("out/data.json");
    config
}

#[test]
fn test_build_save_load_and_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let builder = CorpusBuilder::from_config(config.clone()).unwrap();
    let output = builder.build(&mut Silent).unwrap();
    output.save(&config).unwrap();

    let train = &output.reports[0];
    assert_eq!(train.lines, 5);
    assert_eq!(train.kept, 4);
    assert_eq!(train.dropped, 1);

    let vocabs = VocabPair::load(&config.corpus.vocab_file, &config.special).unwrap();
    assert_eq!(vocabs.source.len(), output.vocabs.source.len());
    assert_eq!(vocabs.side(Side::Source).get_id("cat"), Some(4));
    assert_eq!(vocabs.side(Side::Source).get_id("the"), Some(5));
    vocabs.source.check_consistency(&config.special).unwrap();
    vocabs.target.check_consistency(&config.special).unwrap();

    let store = SampleStore::load(&config.corpus.data_file).unwrap();
    assert_eq!(store.split_names().collect::<Vec<_>>(), vec!["train", "valid"]);
    assert_eq!(store.total_samples(), 5);

    // "The bird sang." -> the, <unk>, <unk>, "."
    let valid = TranslationDataset::load(&config.corpus.data_file, "valid").unwrap();
    let (source, target) = valid.pair(0).unwrap();
    let the = vocabs.source.get_id("the").unwrap();
    let dot = vocabs.source.get_id(".").unwrap();
    assert_eq!(source, vec![the, 3, 3, dot]);
    assert_eq!(target.first(), Some(&1));
    assert_eq!(target.last(), Some(&2));

    let dataset = TranslationDataset::load(&config.corpus.data_file, "train").unwrap();
    let loader = DataLoader::new(
        dataset,
        PadCollator::from_config(&config).unwrap(),
        DataLoaderConfig {
            batch_size: 3,
            shuffle: false,
            ..Default::default()
        },
    )
    .unwrap();

    let batches: Vec<_> = loader.collect::<mtprep_core::Result<_>>().unwrap();
    assert_eq!(batches.len(), 2);
    for batch in &batches {
        let lengths = batch.source_lengths.to_vec();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        for (row, &len) in lengths.iter().enumerate() {
            let src = batch.source_row(row);
            assert!(src.iter().skip(len as usize).all(|&id| id == 0));
            let tgt = batch.target_row(row);
            assert_eq!(tgt[0], 1);
            assert!(!tgt.iter().any(|&id| id == 0));
        }
    }
}

#[test]
fn test_mismatched_corpus_fails_before_tokenizing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    write_lines(&config.corpus.splits[1].target, &["鸟", "多余"]);
    config.corpus.data_file = dir.path().join("never.json");

    let builder = CorpusBuilder::from_config(config.clone()).unwrap();
    let err = builder.build(&mut Silent).unwrap_err();
    match err {
        MtPrepError::CorpusMismatch {
            source_lines,
            target_lines,
            ..
        } => {
            assert_eq!(source_lines, 1);
            assert_eq!(target_lines, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.corpus.data_file.exists());
}

#[test]
fn test_missing_corpus_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.corpus.splits[0].source = dir.path().join("missing.en");

    let err = CorpusBuilder::from_config(config)
        .unwrap()
        .build(&mut Silent)
        .unwrap_err();
    assert!(err.to_string().contains("missing.en"));
}

#[test]
fn test_unknown_split_lists_available() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let output = CorpusBuilder::from_config(config.clone())
        .unwrap()
        .build(&mut Silent)
        .unwrap();
    output.save(&config).unwrap();

    match TranslationDataset::load(&config.corpus.data_file, "test") {
        Err(MtPrepError::UnknownSplit { name, available }) => {
            assert_eq!(name, "test");
            assert_eq!(available, vec!["train".to_string(), "valid".to_string()]);
        }
        other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
    }
}
