//! Audio processing module for melprep
//!
//! Provides WAV I/O, Tacotron-style mel-spectrogram extraction, resampling
//! and the small DSP helpers the preprocessing passes need.

mod dsp;
mod io;
pub mod mel;
mod resample;

pub use dsp::{dynamic_range_compression, trim_silence};
pub use io::{load_audio, save_audio, save_samples, AudioData};
pub use mel::{MelFilterbank, TacotronStft};
pub use resample::resample;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate every waveform must already have
    pub sample_rate: u32,
    /// FFT size (filter length)
    pub n_fft: usize,
    /// Hop length for STFT
    pub hop_length: usize,
    /// Window length
    pub win_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Minimum frequency
    pub fmin: f32,
    /// Maximum frequency
    pub fmax: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::SAMPLE_RATE,
            n_fft: crate::N_FFT,
            hop_length: crate::HOP_LENGTH,
            win_length: crate::WIN_LENGTH,
            n_mels: crate::N_MELS,
            fmin: 0.0,
            fmax: 8000.0,
        }
    }
}

/// Compute mel spectrogram from audio file
///
/// The file is not resampled: a sample rate other than the configured one
/// is reported as [`crate::Error::SampleRateMismatch`]. Every failure comes
/// back wrapped in [`crate::Error::Sample`] with the path.
pub fn compute_mel_from_file<P: AsRef<Path>>(
    path: P,
    stft: &TacotronStft,
) -> Result<ndarray::Array2<f32>> {
    let path = path.as_ref();
    load_audio(path, None)
        .and_then(|audio| stft.extract(&audio))
        .map_err(|e| crate::Error::for_sample(path, e))
}
