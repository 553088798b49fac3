//! Mel-spectrogram computation
//!
//! Tacotron-style feature extraction: reflect-padded magnitude STFT, a
//! Slaney-normalized mel filterbank and log dynamic range compression.

use crate::{Error, Result};
use ndarray::Array2;
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use super::dsp::dynamic_range_compression;
use super::{AudioConfig, AudioData};

/// Mel filterbank for converting linear spectrogram to mel scale
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    /// Filterbank matrix (n_mels x n_fft/2+1)
    pub filters: Array2<f32>,
    /// Sample rate
    pub sample_rate: u32,
    /// Number of mel bands
    pub n_mels: usize,
    /// FFT size
    pub n_fft: usize,
}

impl MelFilterbank {
    /// Create mel filterbank
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f32, fmax: f32) -> Self {
        let filters = create_mel_filterbank(sample_rate, n_fft, n_mels, fmin, fmax);
        Self {
            filters,
            sample_rate,
            n_mels,
            n_fft,
        }
    }

    /// Apply filterbank to a (n_fft/2+1, time_frames) spectrogram
    pub fn apply(&self, spectrogram: &Array2<f32>) -> Array2<f32> {
        self.filters.dot(spectrogram)
    }
}

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Convert frequency to the Slaney mel scale (linear below 1 kHz, log above)
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert Slaney mel to frequency
pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Create an area-normalized triangular mel filterbank
fn create_mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
) -> Array2<f32> {
    let n_freqs = n_fft / 2 + 1;

    let fft_freqs: Vec<f32> = (0..n_freqs)
        .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let hz_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();

    let mut filters = Array2::zeros((n_mels, n_freqs));

    for m in 0..n_mels {
        let (left, center, right) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
        let enorm = 2.0 / (right - left);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - left) / (center - left);
            let upper = (right - freq) / (right - center);
            let weight = lower.min(upper).max(0.0);
            filters[[m, k]] = weight * enorm;
        }
    }

    filters
}

/// Compute periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / size as f32).cos()))
        .collect()
}

/// Reflect-pad a signal by `pad` samples on both sides
///
/// Positions that would reflect past the far end of a very short signal
/// are zero-filled.
fn reflect_pad(signal: &[f32], pad: usize) -> Vec<f32> {
    let len = signal.len() as isize;
    let reflect = |i: isize| -> f32 {
        let j = if i < 0 {
            -i
        } else if i >= len {
            2 * (len - 1) - i
        } else {
            i
        };
        if (0..len).contains(&j) {
            signal[j as usize]
        } else {
            0.0
        }
    };

    (-(pad as isize)..len + pad as isize).map(reflect).collect()
}

/// Tacotron STFT front end
///
/// Holds the precomputed window, FFT plan and mel filterbank so that
/// extracting features for many utterances only pays for the transforms.
pub struct TacotronStft {
    config: AudioConfig,
    window: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    mel_basis: MelFilterbank,
}

impl fmt::Debug for TacotronStft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacotronStft")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TacotronStft {
    /// Create the front end for a configuration
    pub fn new(config: &AudioConfig) -> Result<Self> {
        if config.win_length == 0 || config.win_length > config.n_fft {
            return Err(Error::Config(format!(
                "win_length {} must be in (0, n_fft={}]",
                config.win_length, config.n_fft
            )));
        }
        if config.hop_length == 0 {
            return Err(Error::Config("hop_length must be > 0".into()));
        }

        // Window of win_length, zero-padded to n_fft around the center
        let offset = (config.n_fft - config.win_length) / 2;
        let mut window = vec![0.0f32; config.n_fft];
        window[offset..offset + config.win_length].copy_from_slice(&hann_window(config.win_length));

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        let mel_basis = MelFilterbank::new(
            config.sample_rate,
            config.n_fft,
            config.n_mels,
            config.fmin,
            config.fmax,
        );

        Ok(Self {
            config: config.clone(),
            window,
            fft,
            mel_basis,
        })
    }

    /// Configured target sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Number of mel channels produced
    pub fn n_mels(&self) -> usize {
        self.config.n_mels
    }

    /// Extract log-mel features, shape (n_mels, frames)
    ///
    /// Audio at any rate other than the configured one is rejected; it is
    /// never resampled here.
    pub fn extract(&self, audio: &AudioData) -> Result<Array2<f32>> {
        if audio.sample_rate != self.config.sample_rate {
            return Err(Error::SampleRateMismatch {
                actual: audio.sample_rate,
                expected: self.config.sample_rate,
            });
        }
        self.mel_spectrogram(&audio.samples)
    }

    /// Log-mel spectrogram of raw samples assumed to be at the configured rate
    pub fn mel_spectrogram(&self, signal: &[f32]) -> Result<Array2<f32>> {
        let magnitudes = self.magnitude_stft(signal)?;
        let mel = self.mel_basis.apply(&magnitudes);
        Ok(mel.mapv(dynamic_range_compression))
    }

    /// Magnitude STFT, shape (n_fft/2+1, frames)
    pub fn magnitude_stft(&self, signal: &[f32]) -> Result<Array2<f32>> {
        if signal.is_empty() {
            return Err(Error::Audio("Empty signal".into()));
        }

        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let padded = reflect_pad(signal, n_fft / 2);

        let num_frames = (padded.len() - n_fft) / hop + 1;
        let n_freqs = n_fft / 2 + 1;

        let mut output = Array2::zeros((n_freqs, num_frames));
        let mut input_buffer = self.fft.make_input_vec();
        let mut spectrum = vec![Complex::new(0.0f32, 0.0f32); n_freqs];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop;
            for (i, slot) in input_buffer.iter_mut().enumerate() {
                *slot = padded[start + i] * self.window[i];
            }

            self.fft
                .process(&mut input_buffer, &mut spectrum)
                .map_err(|e| Error::Audio(format!("FFT failed: {}", e)))?;

            for (freq_idx, val) in spectrum.iter().enumerate() {
                output[[freq_idx, frame_idx]] = val.norm();
            }
        }

        Ok(output)
    }
}
