//! Configuration management for melprep

use crate::audio::AudioConfig;
use crate::dataset::SpeakerPattern;
use crate::text::TextMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for melprep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and output locations
    pub paths: PathsConfig,
    /// Feature extraction parameters
    pub audio: AudioConfig,
    /// Transcript and speaker handling
    pub text: TextConfig,
    /// Training-time loading and batching
    pub training: TrainingConfig,
}

/// Filesystem layout of a corpus and the files produced from it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Audio root, laid out as `<root>/<split>/<speaker>/<utterance>.wav`
    pub wav_folder: PathBuf,
    /// Transcript file, one `<utterance_id> <text...>` per line
    pub transcript_file: PathBuf,
    /// Speaker table, one `<numeric_id> <attribute>` per line
    pub speaker_info: PathBuf,
    /// Persisted sample index
    pub data_file: PathBuf,
    /// Persisted vocabulary
    pub vocab_file: PathBuf,
    /// Directory for `path|text` manifests; none are written when unset
    pub manifest_dir: Option<PathBuf>,
}

/// Transcript and speaker handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// How transcript text is turned into symbols
    pub mode: TextMode,
    /// Prefix joined to the numeric id from the speaker table
    pub speaker_prefix: String,
    /// Where the speaker id sits in an audio path
    pub speaker_pattern: SpeakerPattern,
    /// Splits to index, in processing order
    pub splits: Vec<String>,
}

/// Training-time loading and batching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Decoder frames per step; padded target length is a multiple of this
    pub frames_per_step: usize,
    /// Samples per batch
    pub batch_size: usize,
    /// Seed for shuffling a split
    pub shuffle_seed: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            wav_folder: PathBuf::from("data/data_aishell/wav"),
            transcript_file: PathBuf::from(
                "data/data_aishell/transcript/aishell_transcript_v0.8.txt",
            ),
            speaker_info: PathBuf::from("data/resource_aishell/speaker.info"),
            data_file: PathBuf::from("data/samples.json"),
            vocab_file: PathBuf::from("data/vocab.json"),
            manifest_dir: None,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            mode: TextMode::Pinyin,
            speaker_prefix: "S".into(),
            speaker_pattern: SpeakerPattern::default(),
            splits: vec!["train".into(), "dev".into(), "test".into()],
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            frames_per_step: 1,
            batch_size: 32,
            shuffle_seed: 1234,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration and save to file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(Error::Config("Sample rate must be > 0".into()));
        }
        if audio.n_fft == 0 {
            return Err(Error::Config("n_fft must be > 0".into()));
        }
        if audio.hop_length == 0 {
            return Err(Error::Config("hop_length must be > 0".into()));
        }
        if audio.win_length == 0 || audio.win_length > audio.n_fft {
            return Err(Error::Config("win_length must be in (0, n_fft]".into()));
        }
        if audio.n_mels == 0 {
            return Err(Error::Config("n_mels must be > 0".into()));
        }
        if audio.fmax <= audio.fmin {
            return Err(Error::Config("fmax must be greater than fmin".into()));
        }
        if audio.fmax > audio.sample_rate as f32 / 2.0 {
            return Err(Error::Config(format!(
                "fmax {} exceeds the Nyquist frequency of {} Hz",
                audio.fmax, audio.sample_rate
            )));
        }

        if self.text.splits.is_empty() {
            return Err(Error::Config("At least one split is required".into()));
        }
        self.text.speaker_pattern.validate()?;

        if self.training.frames_per_step == 0 {
            return Err(Error::Config("frames_per_step must be > 0".into()));
        }
        if self.training.batch_size == 0 {
            return Err(Error::Config("batch_size must be > 0".into()));
        }

        Ok(())
    }
}
