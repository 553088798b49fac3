//! Audio resampling using rubato

use crate::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use super::AudioData;

const CHUNK_SIZE: usize = 1024;

/// Resample audio to target sample rate
///
/// Used where a pass measures audio at a common rate (total corpus
/// duration); feature extraction itself never resamples.
pub fn resample(audio: &AudioData, target_sr: u32) -> Result<AudioData> {
    if audio.sample_rate == target_sr || audio.is_empty() {
        return Ok(AudioData::new(audio.samples.clone(), target_sr));
    }

    let ratio = target_sr as f64 / audio.sample_rate as f64;
    let expected_len = (audio.samples.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, CHUNK_SIZE, 1)
        .map_err(|e| Error::Audio(format!("Failed to create resampler: {}", e)))?;

    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);
    let mut chunks = audio.samples.chunks_exact(CHUNK_SIZE);

    for chunk in &mut chunks {
        let resampled = resampler
            .process(&[chunk][..], None)
            .map_err(|e| Error::Audio(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let resampled = resampler
            .process_partial(Some(&[remainder][..]), None)
            .map_err(|e| Error::Audio(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);
    }

    // Drain samples still held back by the interpolator
    if output.len() < expected_len {
        let resampled = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| Error::Audio(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);
    }

    output.truncate(expected_len);
    Ok(AudioData::new(output, target_sr))
}
