//! melprep - Text/mel-spectrogram dataset preparation in Rust
//!
//! Prepares paired transcript/audio corpora for training a
//! text-to-mel-spectrogram model.
//!
//! # Features
//! - Sample index building from `<root>/<split>/<speaker>/<utt>.wav` trees,
//!   filtered by speaker attribute
//! - Literal or pinyin transcript symbols with a deterministic vocabulary
//! - Tacotron-style log-mel extraction with a strict sample-rate check
//! - Batch collation into padded text, mel and stop-gate tensors
//!
//! # Example
//! ```no_run
//! use melprep::dataset::{SampleErrorPolicy, TextMelCollate, TextMelDataset};
//! use melprep::Config;
//!
//! let config = Config::load("config.yaml").unwrap();
//! let dataset = TextMelDataset::open("train", &config).unwrap();
//! let collate = TextMelCollate::new(config.training.frames_per_step).unwrap();
//!
//! for batch in dataset.batches(config.training.batch_size, &collate, SampleErrorPolicy::Skip) {
//!     let batch = batch.unwrap();
//!     println!("{:?}", batch.mel_padded.shape());
//! }
//! ```

// Allow traditional for loops - often clearer for audio DSP code
#![allow(clippy::needless_range_loop)]

pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod text;

pub use config::Config;
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default sample rate for audio processing
pub const SAMPLE_RATE: u32 = 22050;

/// Default number of mel filterbank channels
pub const N_MELS: usize = 80;

/// Default FFT size
pub const N_FFT: usize = 1024;

/// Default hop length for STFT
pub const HOP_LENGTH: usize = 256;

/// Default window size
pub const WIN_LENGTH: usize = 1024;
