//! Line-aligned parallel corpus files.

use mtprep_core::{MtPrepError, Result, SplitFiles};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Read a UTF-8 text file as trimmed lines.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MtPrepError::io_at(path, e))?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| {
            MtPrepError::Io(std::io::Error::new(
                e.kind(),
                format!("{} line {}: {}", path.display(), line_num + 1, e),
            ))
        })?;
        lines.push(line.trim().to_owned());
    }
    Ok(lines)
}

/// A pair of line-aligned files held in memory.
#[derive(Debug, Clone)]
pub struct ParallelCorpus {
    source_path: PathBuf,
    target_path: PathBuf,
    source: Vec<String>,
    target: Vec<String>,
}

impl ParallelCorpus {
    /// Load both sides and check they have the same number of lines.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(source: P, target: Q) -> Result<Self> {
        let source_path = source.as_ref().to_path_buf();
        let target_path = target.as_ref().to_path_buf();
        tracing::debug!(
            source = %source_path.display(),
            target = %target_path.display(),
            "Reading parallel corpus"
        );

        let source = read_lines(&source_path)?;
        let target = read_lines(&target_path)?;
        Self::from_lines(source_path, target_path, source, target)
    }

    /// Load the files of a configured split.
    pub fn load_split(files: &SplitFiles) -> Result<Self> {
        Self::load(&files.source, &files.target)
    }

    /// Build from lines already in memory.
    pub fn from_lines(
        source_path: PathBuf,
        target_path: PathBuf,
        source: Vec<String>,
        target: Vec<String>,
    ) -> Result<Self> {
        if source.len() != target.len() {
            return Err(MtPrepError::CorpusMismatch {
                source_path,
                target_path,
                source_lines: source.len(),
                target_lines: target.len(),
            });
        }
        Ok(Self {
            source_path,
            target_path,
            source,
            target,
        })
    }

    /// Number of line pairs.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if the corpus has no lines.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source-language lines.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Target-language lines.
    pub fn target(&self) -> &[String] {
        &self.target
    }

    /// Iterate `(source_line, target_line)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.source
            .iter()
            .zip(self.target.iter())
            .map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Source file path.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Target file path.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}
