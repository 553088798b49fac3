//! Digital Signal Processing utilities

/// Dynamic range compression (log compression)
///
/// Used for mel spectrogram normalization
pub fn dynamic_range_compression(x: f32) -> f32 {
    let clip_val = 1e-5;
    (x.max(clip_val)).ln()
}

/// Frame-wise mean square energy over a zero-padded, centered framing
fn frame_power(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let pad = frame_length / 2;
    let padded_len = signal.len() + 2 * pad;
    if padded_len < frame_length {
        return vec![];
    }
    let num_frames = (padded_len - frame_length) / hop_length + 1;

    (0..num_frames)
        .map(|f| {
            let start = (f * hop_length) as isize - pad as isize;
            let sum: f32 = (start..start + frame_length as isize)
                .filter(|&i| i >= 0 && (i as usize) < signal.len())
                .map(|i| signal[i as usize].powi(2))
                .sum();
            sum / frame_length as f32
        })
        .collect()
}

/// Trim leading and trailing silence
///
/// A frame is silent when its power is more than `top_db` below the loudest
/// frame. Returns the slice between the first and last non-silent frame,
/// which is empty for an all-silent signal.
pub fn trim_silence(signal: &[f32], top_db: f32, frame_length: usize, hop_length: usize) -> &[f32] {
    let power = frame_power(signal, frame_length, hop_length);
    let max_power = power.iter().cloned().fold(0.0f32, f32::max);
    if max_power <= 0.0 {
        return &signal[..0];
    }

    let threshold = max_power * 10f32.powf(-top_db / 10.0);
    let non_silent = |p: &f32| *p > threshold;

    let first = power.iter().position(non_silent);
    let last = power.iter().rposition(non_silent);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * hop_length).min(signal.len());
            let end = ((last + 1) * hop_length).min(signal.len());
            &signal[start..end]
        }
        _ => &signal[..0],
    }
}
