//! Offline vocabulary and sample construction.
//!
//! The builder counts tokens on the vocabulary split, keeps the most
//! frequent tokens per side, then encodes every configured split with those
//! vocabularies and drops pairs that reach a length limit.

use crate::artifacts::VocabPair;
use crate::corpus::ParallelCorpus;
use crate::dataset::{SampleRecord, SampleStore};
use crate::stats::{LengthHistogram, DEFAULT_BINS};
use crate::tokenizer::build_tokenizer;
use crate::vocab::{TokenCounter, Vocabulary};
use mtprep_core::{
    BuildCallback, BuildStage, MtPrepError, PipelineConfig, Result, Side, SplitReport,
    TextTokenizer, UnknownTokenPolicy,
};

/// Everything a build produces.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Source and target vocabularies.
    pub vocabs: VocabPair,
    /// Encoded samples per split.
    pub store: SampleStore,
    /// Per-split encoding summaries, in configured order.
    pub reports: Vec<SplitReport>,
    /// Token lengths of the source side of the vocabulary split.
    pub source_lengths: LengthHistogram,
    /// Token lengths of the target side of the vocabulary split.
    pub target_lengths: LengthHistogram,
}

impl BuildOutput {
    /// Persist the vocabulary and sample artifacts to the configured paths.
    pub fn save(&self, config: &PipelineConfig) -> Result<()> {
        self.vocabs.save(&config.corpus.vocab_file)?;
        self.store.save(&config.corpus.data_file)?;
        Ok(())
    }
}

/// Builds vocabularies and encoded samples from parallel corpora.
pub struct CorpusBuilder {
    config: PipelineConfig,
    source_tokenizer: Box<dyn TextTokenizer>,
    target_tokenizer: Box<dyn TextTokenizer>,
}

impl CorpusBuilder {
    /// Create a builder with explicit tokenizers.
    pub fn new(
        config: PipelineConfig,
        source_tokenizer: Box<dyn TextTokenizer>,
        target_tokenizer: Box<dyn TextTokenizer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source_tokenizer,
            target_tokenizer,
        })
    }

    /// Create a builder with the tokenizers the config names.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let source = build_tokenizer(&config.tokenizers.source, &config.special)?;
        let target = build_tokenizer(&config.tokenizers.target, &config.special)?;
        Self::new(config, source, target)
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn tokenizer(&self, side: Side) -> &dyn TextTokenizer {
        match side {
            Side::Source => &*self.source_tokenizer,
            Side::Target => &*self.target_tokenizer,
        }
    }

    /// Load every configured split from disk and build.
    pub fn build(&self, callback: &mut dyn BuildCallback) -> Result<BuildOutput> {
        let mut corpora = Vec::with_capacity(self.config.corpus.splits.len());
        for files in &self.config.corpus.splits {
            let corpus = ParallelCorpus::load_split(files)?;
            tracing::info!(split = %files.name, lines = corpus.len(), "Loaded corpus");
            corpora.push((files.name.clone(), corpus));
        }
        self.build_from_corpora(&corpora, callback)
    }

    /// Build from corpora already in memory.
    ///
    /// The split named by `corpus.vocab_split` must be among `corpora`.
    pub fn build_from_corpora(
        &self,
        corpora: &[(String, ParallelCorpus)],
        callback: &mut dyn BuildCallback,
    ) -> Result<BuildOutput> {
        let vocab_split = &self.config.corpus.vocab_split;
        let (_, vocab_corpus) = corpora
            .iter()
            .find(|(name, _)| name == vocab_split)
            .ok_or_else(|| MtPrepError::UnknownSplit {
                name: vocab_split.clone(),
                available: corpora.iter().map(|(name, _)| name.clone()).collect(),
            })?;

        let (source, source_lengths) = self.build_vocab(vocab_corpus, Side::Source, callback)?;
        let (target, target_lengths) = self.build_vocab(vocab_corpus, Side::Target, callback)?;
        let vocabs = VocabPair { source, target };

        let mut store = SampleStore::new();
        let mut reports = Vec::with_capacity(corpora.len());
        for (name, corpus) in corpora {
            let (samples, report) = self.encode_split(name, corpus, &vocabs, callback)?;
            store.insert(name.clone(), samples);
            reports.push(report);
        }

        Ok(BuildOutput {
            vocabs,
            store,
            reports,
            source_lengths,
            target_lengths,
        })
    }

    /// Count one side of a corpus and build its vocabulary.
    ///
    /// Also returns a histogram of the tokenized line lengths.
    pub fn build_vocab(
        &self,
        corpus: &ParallelCorpus,
        side: Side,
        callback: &mut dyn BuildCallback,
    ) -> Result<(Vocabulary, LengthHistogram)> {
        let (lines, cap) = match side {
            Side::Source => (corpus.source(), self.config.vocab.source_size),
            Side::Target => (corpus.target(), self.config.vocab.target_size),
        };
        let tokenizer = self.tokenizer(side);
        let stage = BuildStage::CountTokens { side };
        callback.on_stage_start(&stage, lines.len());

        let mut counter = TokenCounter::new();
        let mut lengths = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let tokens = tokenizer.tokenize(line)?;
            lengths.push(tokens.len());
            counter.update(&tokens);
            callback.on_line(i + 1);
        }
        callback.on_stage_end(&stage);

        let vocab = Vocabulary::from_counts(&counter, cap, &self.config.special)?;
        let histogram = LengthHistogram::new(&lengths, DEFAULT_BINS);
        tracing::info!(
            side = %side,
            tokenizer = tokenizer.name(),
            distinct = counter.len(),
            occurrences = counter.total(),
            vocab_size = vocab.len(),
            mean_length = histogram.mean(),
            max_length = histogram.max(),
            "Built vocabulary"
        );
        tracing::debug!(
            side = %side,
            top = ?counter.most_common(10),
            "Most frequent tokens"
        );
        Ok((vocab, histogram))
    }

    /// Encode one split with fixed vocabularies.
    pub fn encode_split(
        &self,
        name: &str,
        corpus: &ParallelCorpus,
        vocabs: &VocabPair,
        callback: &mut dyn BuildCallback,
    ) -> Result<(Vec<SampleRecord>, SplitReport)> {
        let stage = BuildStage::EncodeSplit {
            split: name.to_owned(),
        };
        callback.on_stage_start(&stage, corpus.len());

        let special = &self.config.special;
        let mut report = SplitReport {
            split: name.to_owned(),
            lines: corpus.len(),
            ..Default::default()
        };
        let mut samples = Vec::new();

        for (i, (source_line, target_line)) in corpus.pairs().enumerate() {
            let line = i + 1;

            let source_tokens = self.source_tokenizer.tokenize(source_line)?;
            let (source_ids, source_unknown) =
                self.lookup(&vocabs.source, &source_tokens, line)?;

            let target_tokens = self.target_tokenizer.tokenize(target_line)?;
            let (ids, target_unknown) = self.lookup(&vocabs.target, &target_tokens, line)?;
            let mut target_ids = Vec::with_capacity(ids.len() + 2);
            target_ids.push(special.sos_id);
            target_ids.extend(ids);
            target_ids.push(special.eos_id);

            report.source_unknown += source_unknown;
            report.target_unknown += target_unknown;
            if self
                .config
                .lengths
                .accepts(source_ids.len(), target_ids.len())
            {
                report.kept += 1;
                samples.push(SampleRecord::new(source_ids, target_ids));
            } else {
                report.dropped += 1;
            }
            callback.on_line(line);
        }

        callback.on_stage_end(&stage);
        callback.on_split_encoded(&report);
        Ok((samples, report))
    }

    fn lookup(
        &self,
        vocab: &Vocabulary,
        tokens: &[String],
        line: usize,
    ) -> Result<(Vec<u32>, usize)> {
        match self.config.vocab.unknown_policy {
            UnknownTokenPolicy::Substitute => Ok(vocab.encode(tokens)),
            UnknownTokenPolicy::Reject => {
                let ids = tokens
                    .iter()
                    .map(|token| {
                        vocab.get_id(token).ok_or_else(|| MtPrepError::UnknownToken {
                            token: token.clone(),
                            line,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((ids, 0))
            }
        }
    }
}
