//! Sample index construction
//!
//! Walks `<root>/<split>/<speaker>/<utterance>.wav`, keeps the utterances
//! whose speaker carries the requested attribute and that have a transcript,
//! and encodes each transcript against a vocabulary that is threaded through
//! the whole build.

use crate::config::Config;
use crate::text::{process_text, strip_whitespace, TextMode, TextNormalizer, Vocabulary, VocabularyBuilder};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::{Sample, SplitIndex};

/// Utterance id to transcript text
#[derive(Debug, Clone, Default)]
pub struct Transcripts {
    entries: HashMap<String, String>,
}

impl Transcripts {
    /// Load `<utterance_id> <text tokens...>` lines
    ///
    /// The tokens after the id are concatenated with whitespace removed.
    /// Blank lines are ignored; an id without text is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse transcript text; `source` is only used in error messages
    pub fn parse(content: &str, source: &Path) -> Result<Self> {
        let mut entries = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (id, text) = line
                .split_once(char::is_whitespace)
                .map(|(id, rest)| (id, strip_whitespace(rest)))
                .unwrap_or((line, String::new()));
            if text.is_empty() {
                return Err(Error::Malformed {
                    path: source.to_path_buf(),
                    line: lineno + 1,
                    reason: format!("utterance {} has no text", id),
                });
            }
            entries.insert(id.to_string(), text);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, utterance_id: &str) -> Option<&str> {
        self.entries.get(utterance_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Speaker id to attribute (gender)
#[derive(Debug, Clone, Default)]
pub struct SpeakerTable {
    attributes: HashMap<String, String>,
}

impl SpeakerTable {
    /// Load `<numeric_id> <attribute>` lines, keying each speaker as `prefix + id`
    pub fn load<P: AsRef<Path>>(path: P, prefix: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, prefix, path)
    }

    /// Parse speaker table text; `source` is only used in error messages
    pub fn parse(content: &str, prefix: &str, source: &Path) -> Result<Self> {
        let mut attributes = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let (id, attribute) = match (fields.next(), fields.next()) {
                (None, _) => continue,
                (Some(id), Some(attribute)) => (id, attribute),
                (Some(id), None) => {
                    return Err(Error::Malformed {
                        path: source.to_path_buf(),
                        line: lineno + 1,
                        reason: format!("speaker {} has no attribute", id),
                    })
                }
            };
            attributes.insert(format!("{}{}", prefix, id), attribute.to_string());
        }
        Ok(Self { attributes })
    }

    pub fn attribute(&self, speaker: &str) -> Option<&str> {
        self.attributes.get(speaker).map(String::as_str)
    }

    /// Speakers with the given attribute, sorted
    pub fn speakers_with(&self, attribute: &str) -> Vec<&str> {
        let mut speakers: Vec<&str> = self
            .attributes
            .iter()
            .filter(|(_, a)| a.as_str() == attribute)
            .map(|(s, _)| s.as_str())
            .collect();
        speakers.sort_unstable();
        speakers
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Where the speaker id sits in an audio path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SpeakerPattern {
    /// Name of the directory holding the file
    #[default]
    ParentDir,
    /// N-th component of the path relative to the audio root
    Component(usize),
    /// Regex over the full path; the `speaker` group, else group 1
    Regex(String),
}

impl SpeakerPattern {
    /// Compile into an extractor
    pub fn compile(&self) -> Result<SpeakerExtractor> {
        let kind = match self {
            SpeakerPattern::ParentDir => ExtractorKind::ParentDir,
            SpeakerPattern::Component(n) => ExtractorKind::Component(*n),
            SpeakerPattern::Regex(pattern) => {
                let regex = Regex::new(pattern)?;
                if regex.captures_len() < 2 {
                    return Err(Error::Config(format!(
                        "speaker regex {:?} has no capture group",
                        pattern
                    )));
                }
                ExtractorKind::Regex(regex)
            }
        };
        Ok(SpeakerExtractor { kind })
    }

    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }
}

#[derive(Debug, Clone)]
enum ExtractorKind {
    ParentDir,
    Component(usize),
    Regex(Regex),
}

/// Compiled [`SpeakerPattern`]
#[derive(Debug, Clone)]
pub struct SpeakerExtractor {
    kind: ExtractorKind,
}

impl SpeakerExtractor {
    /// Speaker id of `path`, a file under `root`
    pub fn extract(&self, path: &Path, root: &Path) -> Option<String> {
        match &self.kind {
            ExtractorKind::ParentDir => path
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned()),
            ExtractorKind::Component(n) => path
                .strip_prefix(root)
                .ok()?
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .nth(*n)
                .map(|part| part.to_string_lossy().into_owned()),
            ExtractorKind::Regex(regex) => {
                let text = path.to_string_lossy();
                let caps = regex.captures(&text)?;
                caps.name("speaker")
                    .or_else(|| caps.get(1))
                    .map(|m| m.as_str().to_string())
            }
        }
    }
}

/// Sorted subdirectories of a directory
pub(crate) fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Sorted `.wav` files directly inside a directory
pub(crate) fn sorted_wavs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(".wav"))
            .unwrap_or(false);
        if is_wav && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Utterance id of an audio file: its name up to the first '.'
fn utterance_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    name.split('.').next().map(str::to_string)
}

/// Builds a [`SplitIndex`] and the vocabulary it was encoded with
#[derive(Debug)]
pub struct IndexBuilder {
    wav_folder: PathBuf,
    transcripts: Transcripts,
    speakers: SpeakerTable,
    extractor: SpeakerExtractor,
    normalizer: TextNormalizer,
    vocab: VocabularyBuilder,
}

impl IndexBuilder {
    pub fn new(
        wav_folder: impl Into<PathBuf>,
        transcripts: Transcripts,
        speakers: SpeakerTable,
        pattern: &SpeakerPattern,
        mode: TextMode,
        vocab: VocabularyBuilder,
    ) -> Result<Self> {
        Ok(Self {
            wav_folder: wav_folder.into(),
            transcripts,
            speakers,
            extractor: pattern.compile()?,
            normalizer: TextNormalizer::new(mode),
            vocab,
        })
    }

    /// Load the transcript and speaker tables named by the configuration
    pub fn from_config(config: &Config, vocab: VocabularyBuilder) -> Result<Self> {
        let transcripts = Transcripts::load(&config.paths.transcript_file)?;
        let speakers = SpeakerTable::load(&config.paths.speaker_info, &config.text.speaker_prefix)?;
        log::info!(
            "Loaded {} transcripts and {} speakers",
            transcripts.len(),
            speakers.len()
        );
        Self::new(
            &config.paths.wav_folder,
            transcripts,
            speakers,
            &config.text.speaker_pattern,
            config.text.mode,
            vocab,
        )
    }

    /// Vocabulary accumulated so far
    pub fn vocabulary(&self) -> &Vocabulary {
        self.vocab.vocabulary()
    }

    /// Index one split
    ///
    /// With `attribute` set, only speakers carrying it are kept and every
    /// speaker must be in the table. Files without a transcript are skipped.
    pub fn build_split(&mut self, split: &str, attribute: Option<&str>) -> Result<Vec<Sample>> {
        log::info!("getting {} data...", split);

        let folder = self.wav_folder.join(split);
        if !folder.is_dir() {
            return Err(Error::FileNotFound(folder.display().to_string()));
        }

        let mut samples = Vec::new();
        let mut untranscribed = 0usize;

        for dir in sorted_dirs(&folder)? {
            for audiopath in sorted_wavs(&dir)? {
                if let Some(wanted) = attribute {
                    let speaker = self
                        .extractor
                        .extract(&audiopath, &self.wav_folder)
                        .ok_or_else(|| {
                            Error::InvalidFormat(format!(
                                "no speaker id in path {}",
                                audiopath.display()
                            ))
                        })?;
                    let found = self.speakers.attribute(&speaker).ok_or_else(|| {
                        Error::UnknownSpeaker {
                            speaker: speaker.clone(),
                            path: audiopath.clone(),
                        }
                    })?;
                    if found != wanted {
                        continue;
                    }
                }

                let Some(key) = utterance_id(&audiopath) else {
                    continue;
                };
                let Some(text) = self.transcripts.get(&key) else {
                    untranscribed += 1;
                    log::debug!("no transcript for {}", audiopath.display());
                    continue;
                };

                let text = process_text(text, &self.normalizer, &mut self.vocab);
                samples.push(Sample { audiopath, text });
            }
        }

        if untranscribed > 0 {
            log::info!("split: {}, skipped {} files without transcript", split, untranscribed);
        }
        log::info!("split: {}, num_files: {}", split, samples.len());
        Ok(samples)
    }

    /// Index every split in order and hand back the vocabulary
    pub fn build(mut self, splits: &[String], attribute: Option<&str>) -> Result<(SplitIndex, Vocabulary)> {
        let mut index = SplitIndex::new();
        for split in splits {
            let samples = self.build_split(split, attribute)?;
            index.insert(split.clone(), samples);
        }
        Ok((index, self.vocab.finish()))
    }
}
