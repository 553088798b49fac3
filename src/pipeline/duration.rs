//! Total speech duration of a folder of recordings

use crate::audio::{load_audio, trim_silence};
use crate::dataset::sorted_wavs;
use crate::{Error, Result};
use rayon::prelude::*;
use std::path::Path;

/// Options for [`total_duration`]
#[derive(Debug, Clone, Copy)]
pub struct DurationOptions {
    /// Rate every file is resampled to before measuring
    pub sample_rate: u32,
    /// Frames quieter than this many dB below the loudest are trimmed from the ends
    pub top_db: f32,
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for DurationOptions {
    fn default() -> Self {
        Self {
            sample_rate: crate::SAMPLE_RATE,
            top_db: 60.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// Result of [`total_duration`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationReport {
    pub files: usize,
    /// Trimmed duration in seconds
    pub seconds: f64,
}

impl DurationReport {
    pub fn hours(&self) -> f64 {
        self.seconds / 3600.0
    }
}

/// Sum the trimmed duration of every `.wav` directly inside `folder`
pub fn total_duration(folder: &Path, options: &DurationOptions) -> Result<DurationReport> {
    if !folder.is_dir() {
        return Err(Error::FileNotFound(folder.display().to_string()));
    }
    let files = sorted_wavs(folder)?;

    let durations: Vec<f64> = files
        .par_iter()
        .map(|path| -> Result<f64> {
            let audio = load_audio(path, Some(options.sample_rate))?;
            let voiced = trim_silence(
                &audio.samples,
                options.top_db,
                options.frame_length,
                options.hop_length,
            );
            Ok(voiced.len() as f64 / options.sample_rate as f64)
        })
        .collect::<Result<_>>()?;

    let report = DurationReport {
        files: files.len(),
        seconds: durations.iter().sum(),
    };
    log::info!("{:.4} hours over {} files", report.hours(), report.files);
    Ok(report)
}
