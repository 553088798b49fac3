//! Dataset indexing, loading and batch collation
//!
//! The index builder turns a corpus on disk into a [`SplitIndex`] of
//! [`Sample`]s. At training time [`TextMelDataset`] pairs each sample with
//! its mel features and [`TextMelCollate`] pads them into batch tensors.

mod collate;
mod index;
mod loader;
mod manifest;

pub use collate::{Batch, TextMelCollate, TextMelPair};
pub use index::{IndexBuilder, SpeakerExtractor, SpeakerPattern, SpeakerTable, Transcripts};
pub(crate) use index::sorted_wavs;
pub use loader::{Batches, SampleErrorPolicy, TextMelDataset};
pub use manifest::{manifest_name, write_manifest};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One utterance: where its audio lives and its encoded transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub audiopath: PathBuf,
    pub text: Vec<i64>,
}

/// Samples per split, each split in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitIndex {
    splits: BTreeMap<String, Vec<Sample>>,
}

impl SplitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the samples of a split, replacing any previous ones
    pub fn insert(&mut self, split: impl Into<String>, samples: Vec<Sample>) {
        self.splits.insert(split.into(), samples);
    }

    pub fn get(&self, split: &str) -> Option<&[Sample]> {
        self.splits.get(split).map(Vec::as_slice)
    }

    /// Samples of a split, or an error naming the splits that exist
    pub fn split(&self, split: &str) -> Result<&[Sample]> {
        self.get(split).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "split {:?} not in index (have: {})",
                split,
                self.split_names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn split_names(&self) -> impl Iterator<Item = &str> {
        self.splits.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.splits.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total samples across splits
    pub fn total(&self) -> usize {
        self.splits.values().map(Vec::len).sum()
    }

    /// Load an index from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the index as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
