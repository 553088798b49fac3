//! Batch collation
//!
//! Zero-pads a list of (token sequence, mel matrix) pairs into fixed-shape
//! tensors. Rows are sorted by text length, longest first, so a recurrent
//! encoder can pack them without reordering; every output tensor uses that
//! same row order.

use crate::{Error, Result};
use ndarray::{s, Array1, Array2, Array3, ArrayView1};

/// Encoded transcript and its (n_mels, frames) features
pub type TextMelPair = (Vec<i64>, Array2<f32>);

/// Padded model inputs and targets for one training step
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// (N, max_input_len), zero-padded
    pub text_padded: Array2<i64>,
    /// Text length per row, descending
    pub input_lengths: Array1<i64>,
    /// (N, n_mels, max_target_len), zero-padded
    pub mel_padded: Array3<f32>,
    /// (N, max_target_len); 1 from the last real frame onward
    pub gate_padded: Array2<f32>,
    /// Real frame count per row
    pub output_lengths: Array1<i64>,
}

impl Batch {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.text_padded.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_input_len(&self) -> usize {
        self.text_padded.ncols()
    }

    pub fn max_target_len(&self) -> usize {
        self.gate_padded.ncols()
    }

    pub fn n_mels(&self) -> usize {
        self.mel_padded.shape()[1]
    }
}

/// Zero-pads model inputs and targets based on number of frames per step
#[derive(Debug, Clone, Copy)]
pub struct TextMelCollate {
    n_frames_per_step: usize,
}

impl TextMelCollate {
    pub fn new(n_frames_per_step: usize) -> Result<Self> {
        if n_frames_per_step == 0 {
            return Err(Error::Config("frames_per_step must be > 0".into()));
        }
        Ok(Self { n_frames_per_step })
    }

    pub fn n_frames_per_step(&self) -> usize {
        self.n_frames_per_step
    }

    /// Round a frame count up to a whole number of decoder steps
    pub fn padded_target_len(&self, frames: usize) -> usize {
        frames.div_ceil(self.n_frames_per_step) * self.n_frames_per_step
    }

    /// Collate a training batch
    pub fn collate(&self, batch: &[TextMelPair]) -> Result<Batch> {
        if batch.is_empty() {
            return Err(Error::InvalidFormat("cannot collate an empty batch".into()));
        }
        let n = batch.len();

        // Stable: equal lengths keep their input order
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| batch[b].0.len().cmp(&batch[a].0.len()));

        let max_input_len = batch[order[0]].0.len();
        let mut text_padded = Array2::<i64>::zeros((n, max_input_len));
        let mut input_lengths = Array1::<i64>::zeros(n);
        for (row, &idx) in order.iter().enumerate() {
            let text = &batch[idx].0;
            text_padded
                .slice_mut(s![row, ..text.len()])
                .assign(&ArrayView1::from(text.as_slice()));
            input_lengths[row] = text.len() as i64;
        }

        let num_mels = batch[0].1.nrows();
        for (i, (_, mel)) in batch.iter().enumerate() {
            if mel.nrows() != num_mels {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} mel channels", num_mels),
                    actual: format!("{} in batch item {}", mel.nrows(), i),
                });
            }
            if mel.ncols() == 0 {
                return Err(Error::InvalidFormat(format!(
                    "batch item {} has no mel frames",
                    i
                )));
            }
        }

        let max_frames = batch.iter().map(|(_, mel)| mel.ncols()).max().unwrap_or(0);
        let max_target_len = self.padded_target_len(max_frames);

        let mut mel_padded = Array3::<f32>::zeros((n, num_mels, max_target_len));
        let mut gate_padded = Array2::<f32>::zeros((n, max_target_len));
        let mut output_lengths = Array1::<i64>::zeros(n);
        for (row, &idx) in order.iter().enumerate() {
            let mel = &batch[idx].1;
            let frames = mel.ncols();
            mel_padded.slice_mut(s![row, .., ..frames]).assign(mel);
            gate_padded.slice_mut(s![row, frames - 1..]).fill(1.0);
            output_lengths[row] = frames as i64;
        }

        Ok(Batch {
            text_padded,
            input_lengths,
            mel_padded,
            gate_padded,
            output_lengths,
        })
    }
}
