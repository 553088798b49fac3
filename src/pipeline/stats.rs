//! Length statistics for a split

use crate::dataset::TextMelDataset;
use crate::Result;

/// Mean text and feature sizes of a split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitStats {
    pub samples: usize,
    /// Mean transcript length in symbols
    pub mean_text_len: f64,
    /// Mean mel feature count (`n_mels * frames`)
    pub mean_mel_size: f64,
}

/// Extract every sample of a dataset and average its sizes
///
/// Any sample that fails to load aborts the pass.
pub fn split_stats(dataset: &TextMelDataset) -> Result<SplitStats> {
    let mut text_total = 0usize;
    let mut mel_total = 0usize;

    for i in 0..dataset.len() {
        let (text, mel) = dataset.get(i)?;
        text_total += text.len();
        mel_total += mel.len();
        if (i + 1) % 1000 == 0 {
            log::info!("{}/{} samples", i + 1, dataset.len());
        }
    }

    let n = dataset.len().max(1) as f64;
    Ok(SplitStats {
        samples: dataset.len(),
        mean_text_len: text_total as f64 / n,
        mean_mel_size: mel_total as f64 / n,
    })
}
