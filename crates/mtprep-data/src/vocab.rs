//! Vocabulary storage, counting, and lookup.
//!
//! A [`Vocabulary`] is one bidirectional token <-> id map. Ids are dense, so
//! the reverse direction is a plain vector indexed by id and the two
//! directions cannot drift apart.

use ahash::AHashMap;
use mtprep_core::{MtPrepError, Result, SpecialTokensConfig};
use std::collections::HashMap;

/// Token frequency counter.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    counts: AHashMap<String, u64>,
    total: u64,
}

impl TokenCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token of one tokenized line.
    pub fn update<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref();
            match self.counts.get_mut(token) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(token.to_owned(), 1);
                }
            }
            self.total += 1;
        }
    }

    /// Frequency of a token.
    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total token occurrences.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The `n` most frequent tokens, descending by count.
    ///
    /// Equal counts are ordered by ascending token bytes, so the result does
    /// not depend on hash iteration order.
    pub fn most_common(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(token, &count)| (token.as_str(), count))
            .collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

/// Bidirectional token <-> id mapping for one language side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    token_to_id: AHashMap<String, u32>,
    id_to_token: Vec<String>,
    unk_id: u32,
}

impl Vocabulary {
    /// Create a vocabulary holding only the reserved tokens.
    pub fn with_reserved(special: &SpecialTokensConfig) -> Self {
        let mut vocab = Self {
            token_to_id: AHashMap::with_capacity(SpecialTokensConfig::RESERVED),
            id_to_token: Vec::with_capacity(SpecialTokensConfig::RESERVED),
            unk_id: special.unk_id,
        };
        // `reserved()` is ordered by id and ids are 0..4, so push order equals id.
        for (_, token) in special.reserved() {
            vocab.push(token);
        }
        vocab
    }

    /// Build a vocabulary of at most `cap` entries from token counts.
    ///
    /// Reserved tokens take ids `0..4`; the `cap - 4` most frequent ordinary
    /// tokens follow in descending-frequency order. Counted occurrences of
    /// the reserved strings are ignored.
    pub fn from_counts(
        counter: &TokenCounter,
        cap: usize,
        special: &SpecialTokensConfig,
    ) -> Result<Self> {
        if cap < SpecialTokensConfig::RESERVED {
            return Err(MtPrepError::Config(format!(
                "vocabulary size {} is smaller than the {} reserved tokens",
                cap,
                SpecialTokensConfig::RESERVED
            )));
        }

        let mut vocab = Self::with_reserved(special);
        let slots = cap - SpecialTokensConfig::RESERVED;
        // Take extra candidates in case reserved strings were counted.
        let candidates = counter.most_common(slots + SpecialTokensConfig::RESERVED);
        for (token, _) in candidates
            .into_iter()
            .filter(|(token, _)| !special.is_reserved_token(token))
            .take(slots)
        {
            vocab.push(token);
        }
        Ok(vocab)
    }

    /// Rebuild a vocabulary from its two persisted directions.
    ///
    /// Fails unless the maps are mutual inverses over the dense range
    /// `0..len` and the reserved ids hold the reserved strings.
    pub fn from_maps(
        token_to_id: HashMap<String, u32>,
        id_to_token: HashMap<u32, String>,
        special: &SpecialTokensConfig,
    ) -> Result<Self> {
        if token_to_id.len() != id_to_token.len() {
            return Err(MtPrepError::VocabularyInconsistent(format!(
                "forward map has {} entries, reverse map has {}",
                token_to_id.len(),
                id_to_token.len()
            )));
        }

        let mut dense = Vec::with_capacity(id_to_token.len());
        for id in 0..id_to_token.len() as u32 {
            let token = id_to_token.get(&id).ok_or_else(|| {
                MtPrepError::VocabularyInconsistent(format!("id {} is missing", id))
            })?;
            if token_to_id.get(token) != Some(&id) {
                return Err(MtPrepError::VocabularyInconsistent(format!(
                    "token {:?} maps to {:?}, expected {}",
                    token,
                    token_to_id.get(token),
                    id
                )));
            }
            dense.push(token.clone());
        }

        let vocab = Self {
            token_to_id: token_to_id.into_iter().collect(),
            id_to_token: dense,
            unk_id: special.unk_id,
        };
        vocab.check_consistency(special)?;
        Ok(vocab)
    }

    fn push(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as u32;
        self.id_to_token.push(token.to_owned());
        self.token_to_id.insert(token.to_owned(), id);
        id
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Get the ID for a token, falling back to the unknown id.
    #[inline]
    pub fn id_or_unk(&self, token: &str) -> u32 {
        self.get_id(token).unwrap_or(self.unk_id)
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Map tokens to ids, substituting the unknown id.
    ///
    /// Returns the ids and the number of substitutions.
    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> (Vec<u32>, usize) {
        let mut unknown = 0;
        let ids = tokens
            .iter()
            .map(|t| {
                self.get_id(t.as_ref()).unwrap_or_else(|| {
                    unknown += 1;
                    self.unk_id
                })
            })
            .collect();
        (ids, unknown)
    }

    /// Map ids back to token strings. Ids outside the vocabulary render as
    /// the unknown token.
    pub fn decode(&self, ids: &[u32]) -> Vec<&str> {
        let unk = self.get_token(self.unk_id).unwrap_or_default();
        ids.iter()
            .map(|&id| self.get_token(id).unwrap_or(unk))
            .collect()
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Iterate `(id, token)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (id as u32, token.as_str()))
    }

    /// Verify both directions agree and the reserved ids are in place.
    pub fn check_consistency(&self, special: &SpecialTokensConfig) -> Result<()> {
        if self.token_to_id.len() != self.id_to_token.len() {
            return Err(MtPrepError::VocabularyInconsistent(format!(
                "{} tokens but {} ids",
                self.token_to_id.len(),
                self.id_to_token.len()
            )));
        }
        for (id, token) in self.iter() {
            if self.token_to_id.get(token) != Some(&id) {
                return Err(MtPrepError::VocabularyInconsistent(format!(
                    "token {:?} does not map back to id {}",
                    token, id
                )));
            }
        }
        for (id, token) in special.reserved() {
            if self.get_token(id) != Some(token) {
                return Err(MtPrepError::VocabularyInconsistent(format!(
                    "reserved id {} should hold {:?}, found {:?}",
                    id,
                    token,
                    self.get_token(id)
                )));
            }
        }
        Ok(())
    }

    /// Forward map as a standard `HashMap` for persistence.
    pub fn to_token_map(&self) -> HashMap<String, u32> {
        self.iter().map(|(id, t)| (t.to_owned(), id)).collect()
    }

    /// Reverse map as a standard `HashMap` for persistence.
    pub fn to_id_map(&self) -> HashMap<u32, String> {
        self.iter().map(|(id, t)| (id, t.to_owned())).collect()
    }
}
