//! Configuration types for mtprep.

use crate::{MtPrepError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level pipeline configuration.
///
/// Every section is defaulted, so an empty YAML document is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Reserved token ids and strings.
    #[serde(default)]
    pub special: SpecialTokensConfig,

    /// Vocabulary caps and lookup policy.
    #[serde(default)]
    pub vocab: VocabConfig,

    /// Sequence length limits.
    #[serde(default)]
    pub lengths: LengthConfig,

    /// Batch assembly settings.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Tokenizer selection per language side.
    #[serde(default)]
    pub tokenizers: TokenizersConfig,

    /// Corpus inputs and artifact outputs.
    #[serde(default)]
    pub corpus: CorpusConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::parse_yaml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config = Self::parse_yaml_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file without validating it.
    ///
    /// For callers that apply overrides first; they must call
    /// [`validate`](Self::validate) afterwards.
    pub fn parse_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MtPrepError::io_at(path, e))?;
        Self::parse_yaml_str(&content)
    }

    /// Parse a YAML string without validating it.
    pub fn parse_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| MtPrepError::Serialization(format!("Invalid config: {}", e)))
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        self.special.validate()?;
        self.vocab.validate()?;
        self.lengths.validate()?;
        self.batch.validate(&self.special)?;
        self.corpus.validate()?;
        Ok(())
    }
}

/// Reserved control tokens.
///
/// The four ids must be a permutation of `0..4` so ordinary tokens always
/// start at id 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialTokensConfig {
    /// Padding id.
    #[serde(default = "default_pad_id")]
    pub pad_id: u32,
    /// Start-of-sequence id.
    #[serde(default = "default_sos_id")]
    pub sos_id: u32,
    /// End-of-sequence id.
    #[serde(default = "default_eos_id")]
    pub eos_id: u32,
    /// Unknown-token id.
    #[serde(default = "default_unk_id")]
    pub unk_id: u32,

    /// Padding token string.
    #[serde(default = "default_pad_token")]
    pub pad_token: String,
    /// Start-of-sequence token string.
    #[serde(default = "default_sos_token")]
    pub sos_token: String,
    /// End-of-sequence token string.
    #[serde(default = "default_eos_token")]
    pub eos_token: String,
    /// Unknown token string.
    #[serde(default = "default_unk_token")]
    pub unk_token: String,
}

impl SpecialTokensConfig {
    /// Number of reserved ids.
    pub const RESERVED: usize = 4;

    /// Reserved `(id, token)` pairs ordered by id.
    pub fn reserved(&self) -> Vec<(u32, &str)> {
        let mut pairs = vec![
            (self.pad_id, self.pad_token.as_str()),
            (self.sos_id, self.sos_token.as_str()),
            (self.eos_id, self.eos_token.as_str()),
            (self.unk_id, self.unk_token.as_str()),
        ];
        pairs.sort_by_key(|&(id, _)| id);
        pairs
    }

    /// Whether `token` is one of the reserved strings.
    pub fn is_reserved_token(&self, token: &str) -> bool {
        token == self.pad_token
            || token == self.sos_token
            || token == self.eos_token
            || token == self.unk_token
    }

    fn validate(&self) -> Result<()> {
        let mut ids = [self.pad_id, self.sos_id, self.eos_id, self.unk_id];
        ids.sort_unstable();
        if ids != [0, 1, 2, 3] {
            return Err(MtPrepError::Config(format!(
                "reserved ids must be a permutation of 0..4, got pad={} sos={} eos={} unk={}",
                self.pad_id, self.sos_id, self.eos_id, self.unk_id
            )));
        }

        let mut tokens = [
            self.pad_token.as_str(),
            self.sos_token.as_str(),
            self.eos_token.as_str(),
            self.unk_token.as_str(),
        ];
        tokens.sort_unstable();
        if tokens.windows(2).any(|w| w[0] == w[1]) || tokens.iter().any(|t| t.is_empty()) {
            return Err(MtPrepError::Config(
                "reserved token strings must be non-empty and distinct".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SpecialTokensConfig {
    fn default() -> Self {
        Self {
            pad_id: default_pad_id(),
            sos_id: default_sos_id(),
            eos_id: default_eos_id(),
            unk_id: default_unk_id(),
            pad_token: default_pad_token(),
            sos_token: default_sos_token(),
            eos_token: default_eos_token(),
            unk_token: default_unk_token(),
        }
    }
}

/// What to do when a token has no vocabulary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTokenPolicy {
    /// Map the token to the unknown id.
    #[default]
    Substitute,
    /// Fail the build with [`MtPrepError::UnknownToken`].
    Reject,
}

/// Vocabulary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabConfig {
    /// Maximum source vocabulary size, reserved tokens included.
    #[serde(default = "default_vocab_size")]
    pub source_size: usize,

    /// Maximum target vocabulary size, reserved tokens included.
    #[serde(default = "default_vocab_size")]
    pub target_size: usize,

    /// Lookup policy for tokens missing from the vocabulary.
    #[serde(default)]
    pub unknown_policy: UnknownTokenPolicy,
}

impl VocabConfig {
    fn validate(&self) -> Result<()> {
        for (side, size) in [("source", self.source_size), ("target", self.target_size)] {
            if size < SpecialTokensConfig::RESERVED {
                return Err(MtPrepError::Config(format!(
                    "{} vocabulary size {} is smaller than the {} reserved tokens",
                    side,
                    size,
                    SpecialTokensConfig::RESERVED
                )));
            }
        }
        Ok(())
    }
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            source_size: default_vocab_size(),
            target_size: default_vocab_size(),
            unknown_policy: UnknownTokenPolicy::default(),
        }
    }
}

/// Sequence length limits. A sample is kept only when both lengths are
/// strictly below their limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthConfig {
    /// Exclusive upper bound on source length.
    #[serde(default = "default_maxlen_in")]
    pub maxlen_in: usize,

    /// Exclusive upper bound on target length, sentinels included.
    #[serde(default = "default_maxlen_out")]
    pub maxlen_out: usize,
}

impl LengthConfig {
    /// Whether a pair of raw lengths passes the filter.
    #[must_use]
    pub fn accepts(&self, source_len: usize, target_len: usize) -> bool {
        source_len < self.maxlen_in && target_len < self.maxlen_out
    }

    fn validate(&self) -> Result<()> {
        if self.maxlen_in == 0 || self.maxlen_out == 0 {
            return Err(MtPrepError::Config(
                "maxlen_in and maxlen_out must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            maxlen_in: default_maxlen_in(),
            maxlen_out: default_maxlen_out(),
        }
    }
}

/// Batch assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Samples per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Target padding value excluded from the loss.
    #[serde(default = "default_ignore_id")]
    pub ignore_id: i64,

    /// Shuffle sample order each epoch.
    #[serde(default = "default_true")]
    pub shuffle: bool,

    /// Random seed for shuffling.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Drop the last incomplete batch.
    #[serde(default)]
    pub drop_last: bool,
}

impl BatchConfig {
    fn validate(&self, special: &SpecialTokensConfig) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MtPrepError::Config("batch_size must be positive".into()));
        }
        if self.ignore_id == i64::from(special.pad_id) {
            return Err(MtPrepError::Config(format!(
                "ignore_id {} collides with pad_id",
                self.ignore_id
            )));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            ignore_id: default_ignore_id(),
            shuffle: true,
            seed: default_seed(),
            drop_last: false,
        }
    }
}

/// Tokenizer selection for one language side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Lowercased word tokenization with per-token normalization.
    Word,
    /// Unicode word segmentation, one segment per CJK ideograph.
    Segment,
    /// Dictionary-based Chinese word segmentation.
    Jieba,
    /// HuggingFace `tokenizer.json` file.
    Pretrained {
        /// Path to the tokenizer file.
        path: PathBuf,
        /// The model's unknown token, when it cannot be read from the model.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unk_token: Option<String>,
    },
}

/// Tokenizers for both sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizersConfig {
    /// Source-language tokenizer.
    #[serde(default = "default_source_tokenizer")]
    pub source: TokenizerKind,
    /// Target-language tokenizer.
    #[serde(default = "default_target_tokenizer")]
    pub target: TokenizerKind,
}

impl Default for TokenizersConfig {
    fn default() -> Self {
        Self {
            source: default_source_tokenizer(),
            target: default_target_tokenizer(),
        }
    }
}

/// One named split backed by a pair of line-aligned files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFiles {
    /// Split name, e.g. `train`.
    pub name: String,
    /// Source-language file.
    pub source: PathBuf,
    /// Target-language file.
    pub target: PathBuf,
}

/// Corpus inputs and artifact paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Splits to encode, in order.
    #[serde(default = "default_splits")]
    pub splits: Vec<SplitFiles>,

    /// Split whose text is counted to build the vocabularies.
    #[serde(default = "default_vocab_split")]
    pub vocab_split: String,

    /// Vocabulary artifact path.
    #[serde(default = "default_vocab_file")]
    pub vocab_file: PathBuf,

    /// Sample artifact path.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl CorpusConfig {
    /// Look up a split by name.
    pub fn split(&self, name: &str) -> Option<&SplitFiles> {
        self.splits.iter().find(|s| s.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.split(&self.vocab_split).is_none() {
            return Err(MtPrepError::Config(format!(
                "vocab_split '{}' is not among the configured splits",
                self.vocab_split
            )));
        }
        for (i, split) in self.splits.iter().enumerate() {
            if self.splits[..i].iter().any(|s| s.name == split.name) {
                return Err(MtPrepError::Config(format!(
                    "split '{}' is configured twice",
                    split.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            splits: default_splits(),
            vocab_split: default_vocab_split(),
            vocab_file: default_vocab_file(),
            data_file: default_data_file(),
        }
    }
}

// Default value functions
fn default_pad_id() -> u32 {
    0
}
fn default_sos_id() -> u32 {
    1
}
fn default_eos_id() -> u32 {
    2
}
fn default_unk_id() -> u32 {
    3
}
fn default_pad_token() -> String {
    "<pad>".into()
}
fn default_sos_token() -> String {
    "<sos>".into()
}
fn default_eos_token() -> String {
    "<eos>".into()
}
fn default_unk_token() -> String {
    "<unk>".into()
}
fn default_vocab_size() -> usize {
    5000
}
fn default_maxlen_in() -> usize {
    50
}
fn default_maxlen_out() -> usize {
    100
}
fn default_batch_size() -> usize {
    32
}
fn default_ignore_id() -> i64 {
    -1
}
fn default_true() -> bool {
    true
}
fn default_seed() -> u64 {
    42
}
fn default_source_tokenizer() -> TokenizerKind {
    TokenizerKind::Word
}
fn default_target_tokenizer() -> TokenizerKind {
    TokenizerKind::Jieba
}
fn default_splits() -> Vec<SplitFiles> {
    vec![
        SplitFiles {
            name: "train".into(),
            source: "data/train.en".into(),
            target: "data/train.zh".into(),
        },
        SplitFiles {
            name: "valid".into(),
            source: "data/valid.en".into(),
            target: "data/valid.zh".into(),
        },
    ]
}
fn default_vocab_split() -> String {
    "train".into()
}
fn default_vocab_file() -> PathBuf {
    "data/vocab.json".into()
}
fn default_data_file() -> PathBuf {
    "data/data.json".into()
}
