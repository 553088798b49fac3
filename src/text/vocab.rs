//! Symbol vocabulary
//!
//! Maps transcript symbols to dense integer ids. Index 0 is the padding id
//! used by batch collation and index 1 stands in for symbols the vocabulary
//! does not know. Every other symbol gets the next id in first-seen order.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Padding symbol, always index 0
pub const PAD_TOKEN: &str = "<pad>";
/// Unknown symbol, always index 1
pub const UNK_TOKEN: &str = "<unk>";
/// Index of [`PAD_TOKEN`]
pub const PAD_ID: i64 = 0;
/// Index of [`UNK_TOKEN`]
pub const UNK_ID: i64 = 1;

/// Two-way symbol/index mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    token_to_index: BTreeMap<String, i64>,
    index_to_token: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let mut vocab = Self {
            token_to_index: BTreeMap::new(),
            index_to_token: Vec::new(),
        };
        vocab.push(PAD_TOKEN);
        vocab.push(UNK_TOKEN);
        vocab
    }
}

impl Vocabulary {
    /// Vocabulary holding only the reserved symbols
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, token: &str) -> i64 {
        let id = self.index_to_token.len() as i64;
        self.index_to_token.push(token.to_string());
        self.token_to_index.insert(token.to_string(), id);
        id
    }

    /// Number of symbols, reserved ones included
    pub fn len(&self) -> usize {
        self.index_to_token.len()
    }

    /// Always false; the reserved symbols are present
    pub fn is_empty(&self) -> bool {
        self.index_to_token.is_empty()
    }

    /// Index of a symbol, if known
    pub fn get(&self, token: &str) -> Option<i64> {
        self.token_to_index.get(token).copied()
    }

    /// Index of a symbol, [`UNK_ID`] if unknown
    pub fn index_of(&self, token: &str) -> i64 {
        self.get(token).unwrap_or(UNK_ID)
    }

    /// Symbol at an index
    pub fn token(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.index_to_token.get(i))
            .map(String::as_str)
    }

    /// Symbols in index order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.index_to_token.iter().map(String::as_str)
    }

    /// Map symbols to indices without growing the vocabulary
    pub fn encode<'a, I>(&self, symbols: I) -> Vec<i64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        symbols.into_iter().map(|s| self.index_of(s)).collect()
    }

    /// Map indices back to symbols, dropping padding
    ///
    /// Indices outside the vocabulary decode as [`UNK_TOKEN`].
    pub fn decode(&self, indices: &[i64]) -> Vec<&str> {
        indices
            .iter()
            .filter(|&&i| i != PAD_ID)
            .map(|&i| self.token(i).unwrap_or(UNK_TOKEN))
            .collect()
    }

    /// Decode indices and concatenate the symbols
    pub fn decode_to_string(&self, indices: &[i64]) -> String {
        self.decode(indices).concat()
    }

    /// Check the two directions agree and the reserved symbols are in place
    pub fn validate(&self) -> Result<()> {
        if self.token_to_index.len() != self.index_to_token.len() {
            return Err(Error::InvalidFormat(format!(
                "vocabulary has {} tokens but {} indices",
                self.token_to_index.len(),
                self.index_to_token.len()
            )));
        }
        for (i, token) in self.index_to_token.iter().enumerate() {
            if self.token_to_index.get(token) != Some(&(i as i64)) {
                return Err(Error::InvalidFormat(format!(
                    "vocabulary token {:?} at index {} is not mapped back to it",
                    token, i
                )));
            }
        }
        if self.token(PAD_ID) != Some(PAD_TOKEN) || self.token(UNK_ID) != Some(UNK_TOKEN) {
            return Err(Error::InvalidFormat(format!(
                "vocabulary must start with {} and {}",
                PAD_TOKEN, UNK_TOKEN
            )));
        }
        Ok(())
    }

    /// Load a vocabulary from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let vocab: Vocabulary = serde_json::from_str(&content)?;
        vocab.validate()?;
        Ok(vocab)
    }

    /// Save the vocabulary as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Accumulates a vocabulary while transcripts are tokenized
///
/// A growing builder assigns the next index to every new symbol; a frozen
/// one maps unseen symbols to [`UNK_ID`].
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    vocab: Vocabulary,
    growing: bool,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VocabularyBuilder {
    /// Growing builder starting from the reserved symbols
    pub fn new() -> Self {
        Self {
            vocab: Vocabulary::new(),
            growing: true,
        }
    }

    /// Frozen builder over an existing vocabulary
    pub fn frozen(vocab: Vocabulary) -> Self {
        Self {
            vocab,
            growing: false,
        }
    }

    /// Whether unseen symbols are added
    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Index for a symbol, inserting it when growing
    pub fn index_for(&mut self, token: &str) -> i64 {
        match self.vocab.get(token) {
            Some(id) => id,
            None if self.growing => self.vocab.push(token),
            None => UNK_ID,
        }
    }

    /// Map symbols to indices
    pub fn encode<'a, I>(&mut self, symbols: I) -> Vec<i64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        symbols.into_iter().map(|s| self.index_for(s)).collect()
    }

    /// Current state of the vocabulary
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Finish building
    pub fn finish(self) -> Vocabulary {
        self.vocab
    }
}
