//! Persisted vocabulary artifact.
//!
//! The on-disk form keeps both directions of both vocabularies as four JSON
//! maps. Loading validates that each pair of maps describes the same
//! vocabulary.

use crate::vocab::Vocabulary;
use mtprep_core::{MtPrepError, Result, Side, SpecialTokensConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serialized vocabulary pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabArtifact {
    /// Source token -> id.
    pub src_token_to_id: HashMap<String, u32>,
    /// Source id -> token.
    pub src_id_to_token: HashMap<u32, String>,
    /// Target token -> id.
    pub tgt_token_to_id: HashMap<String, u32>,
    /// Target id -> token.
    pub tgt_id_to_token: HashMap<u32, String>,
}

/// Source and target vocabularies built from the same corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabPair {
    /// Source-language vocabulary.
    pub source: Vocabulary,
    /// Target-language vocabulary.
    pub target: Vocabulary,
}

impl VocabPair {
    /// Vocabulary for one side.
    pub fn side(&self, side: Side) -> &Vocabulary {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Convert to the serialized form.
    pub fn to_artifact(&self) -> VocabArtifact {
        VocabArtifact {
            src_token_to_id: self.source.to_token_map(),
            src_id_to_token: self.source.to_id_map(),
            tgt_token_to_id: self.target.to_token_map(),
            tgt_id_to_token: self.target.to_id_map(),
        }
    }

    /// Rebuild from the serialized form.
    pub fn from_artifact(artifact: VocabArtifact, special: &SpecialTokensConfig) -> Result<Self> {
        let source =
            Vocabulary::from_maps(artifact.src_token_to_id, artifact.src_id_to_token, special)
                .map_err(|e| side_context(Side::Source, e))?;
        let target =
            Vocabulary::from_maps(artifact.tgt_token_to_id, artifact.tgt_id_to_token, special)
                .map_err(|e| side_context(Side::Target, e))?;
        Ok(Self { source, target })
    }

    /// Write the vocabulary artifact as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MtPrepError::io_at(parent, e))?;
        }
        let file = File::create(path).map_err(|e| MtPrepError::io_at(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.to_artifact()).map_err(|e| {
            MtPrepError::Serialization(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tracing::info!(
            path = %path.display(),
            source = self.source.len(),
            target = self.target.len(),
            "Saved vocabularies"
        );
        Ok(())
    }

    /// Read and validate a vocabulary artifact.
    pub fn load<P: AsRef<Path>>(path: P, special: &SpecialTokensConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MtPrepError::io_at(path, e))?;
        let artifact: VocabArtifact = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                MtPrepError::Serialization(format!("Failed to read {}: {}", path.display(), e))
            })?;
        Self::from_artifact(artifact, special)
    }
}

fn side_context(side: Side, err: MtPrepError) -> MtPrepError {
    match err {
        MtPrepError::VocabularyInconsistent(msg) => {
            MtPrepError::VocabularyInconsistent(format!("{} vocabulary: {}", side, msg))
        }
        other => other,
    }
}
