//! Tokenizer integration.
//!
//! Four [`TextTokenizer`] implementations are provided:
//!
//! - [`WordTokenizer`] lowercases, splits at Unicode word boundaries and
//!   normalizes each token to plain ASCII letters, digits and `.!?'`
//! - [`SegmentTokenizer`] applies Unicode word segmentation as-is, which
//!   yields one segment per CJK ideograph
//! - [`JiebaTokenizer`] segments Chinese into dictionary words
//! - [`PretrainedTokenizer`] wraps a HuggingFace `tokenizer.json`

use jieba_rs::Jieba;
use mtprep_core::{MtPrepError, Result, SpecialTokensConfig, TextTokenizer, TokenizerKind};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokenizers::models::ModelWrapper;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Create the tokenizer a config entry names.
///
/// A pretrained tokenizer reports its own unknown token as the reserved
/// unknown string from `special`.
pub fn build_tokenizer(
    kind: &TokenizerKind,
    special: &SpecialTokensConfig,
) -> Result<Box<dyn TextTokenizer>> {
    Ok(match kind {
        TokenizerKind::Word => Box::new(WordTokenizer::new()),
        TokenizerKind::Segment => Box::new(SegmentTokenizer::new()),
        TokenizerKind::Jieba => Box::new(JiebaTokenizer::new()),
        TokenizerKind::Pretrained { path, unk_token } => {
            let tokenizer = PretrainedTokenizer::from_file(path, special)?;
            Box::new(match unk_token {
                Some(unk) => tokenizer.with_model_unk(unk.clone()),
                None => tokenizer,
            })
        }
    })
}

/// Strip accents and drop characters outside `[a-z0-9.!?']`.
///
/// Expects lowercased input.
pub fn normalize_token(token: &str) -> String {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    let re = DISALLOWED.get_or_init(|| Regex::new(r"[^a-z0-9.!?']+").expect("Invalid regex pattern"));

    let ascii: String = token.nfd().filter(|c| !is_combining_mark(*c)).collect();
    re.replace_all(&ascii, "").into_owned()
}

/// Word tokenizer with per-token normalization, for alphabetic languages.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        Self
    }
}

impl TextTokenizer for WordTokenizer {
    fn name(&self) -> &str {
        "word"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let lowered = text.trim().to_lowercase();
        Ok(lowered
            .split_word_bounds()
            .filter(|s| !s.chars().all(char::is_whitespace))
            .map(normalize_token)
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Segmentation-based tokenizer for unspaced scripts.
#[derive(Debug, Clone, Default)]
pub struct SegmentTokenizer;

impl SegmentTokenizer {
    /// Create a new segment tokenizer.
    pub fn new() -> Self {
        Self
    }
}

impl TextTokenizer for SegmentTokenizer {
    fn name(&self) -> &str {
        "segment"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text
            .trim()
            .split_word_bounds()
            .filter(|s| !s.chars().all(char::is_whitespace))
            .map(str::to_owned)
            .collect())
    }
}

/// Chinese word segmentation with the bundled jieba dictionary.
///
/// Uses the HMM for words missing from the dictionary. Whitespace segments
/// are dropped.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    /// Load the default dictionary.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTokenizer for JiebaTokenizer {
    fn name(&self) -> &str {
        "jieba"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .jieba
            .cut(text.trim(), true)
            .into_iter()
            .filter(|s| !s.chars().all(char::is_whitespace))
            .map(str::to_owned)
            .collect())
    }
}

/// Wrapper around the tokenizers library.
///
/// The model's unknown token is rewritten to the reserved unknown string,
/// so it is never counted as an ordinary vocabulary entry.
pub struct PretrainedTokenizer {
    inner: tokenizers::Tokenizer,
    model_unk: Option<String>,
    reserved_unk: String,
}

impl PretrainedTokenizer {
    /// Load a tokenizer from a local file.
    pub fn from_file<P: AsRef<Path>>(path: P, special: &SpecialTokensConfig) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| MtPrepError::Tokenizer(format!("{}: {}", path.display(), e)))?;
        Ok(Self::wrap(inner, special))
    }

    /// Load a tokenizer from bytes.
    pub fn from_bytes(bytes: &[u8], special: &SpecialTokensConfig) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| MtPrepError::Tokenizer(e.to_string()))?;
        Ok(Self::wrap(inner, special))
    }

    fn wrap(inner: tokenizers::Tokenizer, special: &SpecialTokensConfig) -> Self {
        // Unigram keeps only an unk id, so it needs `unk_token` in the config.
        let model_unk = match inner.get_model() {
            ModelWrapper::WordLevel(model) => Some(model.unk_token.clone()),
            ModelWrapper::WordPiece(model) => Some(model.unk_token.clone()),
            ModelWrapper::BPE(model) => model.unk_token.clone(),
            ModelWrapper::Unigram(_) => None,
        };
        Self {
            inner,
            model_unk,
            reserved_unk: special.unk_token.clone(),
        }
    }

    /// Override the model's unknown token.
    pub fn with_model_unk(mut self, unk: impl Into<String>) -> Self {
        self.model_unk = Some(unk.into());
        self
    }
}

impl TextTokenizer for PretrainedTokenizer {
    fn name(&self) -> &str {
        "pretrained"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .inner
            .encode(text.trim(), false)
            .map_err(|e| MtPrepError::Tokenizer(e.to_string()))?;
        Ok(encoding
            .get_tokens()
            .iter()
            .map(|token| match &self.model_unk {
                Some(unk) if token == unk => self.reserved_unk.clone(),
                _ => token.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("café"), "cafe");
        assert_eq!(normalize_token("naïve"), "naive");
        assert_eq!(normalize_token(","), "");
        assert_eq!(normalize_token("don't"), "don't");
        assert_eq!(normalize_token("?"), "?");
    }

    #[test]
    fn test_word_tokenizer() {
        let tok = WordTokenizer::new();
        let tokens = tok.tokenize("  Hello, World! It's 2017.  ").unwrap();
        assert_eq!(tokens, vec!["hello", "world", "!", "it's", "2017", "."]);
    }

    #[test]
    fn test_word_tokenizer_empty_line() {
        let tok = WordTokenizer::new();
        assert!(tok.tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_segment_tokenizer_cjk() {
        let tok = SegmentTokenizer::new();
        let tokens = tok.tokenize("我爱北京。").unwrap();
        assert_eq!(tokens, vec!["我", "爱", "北", "京", "。"]);
    }

    #[test]
    fn test_segment_tokenizer_mixed() {
        let tok = SegmentTokenizer::new();
        let tokens = tok.tokenize("GPU 很快").unwrap();
        assert_eq!(tokens, vec!["GPU", "很", "快"]);
    }

    #[test]
    fn test_jieba_keeps_compounds() {
        let tok = JiebaTokenizer::new();
        let tokens = tok.tokenize("我来到北京清华大学").unwrap();
        assert!(tokens.iter().any(|t| t == "北京"));
        assert!(tokens.iter().any(|t| t == "清华大学"));
        assert_eq!(tokens.concat(), "我来到北京清华大学");
    }

    #[test]
    fn test_jieba_drops_whitespace() {
        let tok = JiebaTokenizer::new();
        let tokens = tok.tokenize("  北京 欢迎你  ").unwrap();
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
        assert_eq!(tokens.first().map(String::as_str), Some("北京"));
    }

    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[UNK]": 0, "hello": 1, "world": 2},
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn test_pretrained_maps_model_unk_to_reserved() {
        let special = SpecialTokensConfig::default();
        let tok = PretrainedTokenizer::from_bytes(WORD_LEVEL.as_bytes(), &special).unwrap();
        let tokens = tok.tokenize(" hello there world ").unwrap();
        assert_eq!(tokens, vec!["hello", "<unk>", "world"]);
    }

    #[test]
    fn test_pretrained_tokens_count_as_reserved_unk() {
        use crate::vocab::{TokenCounter, Vocabulary};

        let special = SpecialTokensConfig::default();
        let tok = PretrainedTokenizer::from_bytes(WORD_LEVEL.as_bytes(), &special).unwrap();
        let tokens = tok.tokenize("hello there again world").unwrap();

        let mut counter = TokenCounter::new();
        counter.update(&tokens);
        let vocab = Vocabulary::from_counts(&counter, 10, &special).unwrap();
        assert_eq!(vocab.get_id("[UNK]"), None);
        assert_eq!(vocab.len(), 6);

        let (ids, _) = vocab.encode(&tokens);
        assert_eq!(ids[1], special.unk_id);
        assert_eq!(ids[2], special.unk_id);
    }

    #[test]
    fn test_build_tokenizer_by_kind() {
        let special = SpecialTokensConfig::default();
        let name = |kind: TokenizerKind| build_tokenizer(&kind, &special).unwrap().name().to_owned();
        assert_eq!(name(TokenizerKind::Word), "word");
        assert_eq!(name(TokenizerKind::Segment), "segment");
        assert_eq!(name(TokenizerKind::Jieba), "jieba");

        let missing = build_tokenizer(
            &TokenizerKind::Pretrained {
                path: "does/not/exist.json".into(),
                unk_token: None,
            },
            &special,
        );
        assert!(matches!(missing, Err(MtPrepError::Tokenizer(_))));
    }

    #[test]
    fn test_build_pretrained_with_configured_unk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL).unwrap();

        let tok = build_tokenizer(
            &TokenizerKind::Pretrained {
                path: path.clone(),
                unk_token: Some("world".into()),
            },
            &SpecialTokensConfig::default(),
        )
        .unwrap();
        assert_eq!(tok.tokenize("hello world").unwrap(), vec!["hello", "<unk>"]);
    }
}
