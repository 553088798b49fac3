//! Training-time view of one split
//!
//! Loads the persisted index, shuffles the split once with a fixed seed and
//! extracts mel features on demand.

use crate::audio::{compute_mel_from_file, AudioConfig, TacotronStft};
use crate::config::Config;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use super::{Batch, Sample, SplitIndex, TextMelCollate, TextMelPair};

/// What a batch iterator does when one sample fails to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleErrorPolicy {
    /// Stop and return the error
    #[default]
    Abort,
    /// Log the error and leave the sample out of its batch
    Skip,
}

/// Text/mel pairs for one split
#[derive(Debug)]
pub struct TextMelDataset {
    split: String,
    samples: Vec<Sample>,
    stft: TacotronStft,
}

impl TextMelDataset {
    /// Open a split of the index named by the configuration
    pub fn open(split: &str, config: &Config) -> Result<Self> {
        let index = SplitIndex::load(&config.paths.data_file)?;
        let samples = index.split(split)?.to_vec();
        Self::from_samples(split, samples, &config.audio, Some(config.training.shuffle_seed))
    }

    /// Build from samples; `shuffle_seed` shuffles them deterministically
    pub fn from_samples(
        split: &str,
        mut samples: Vec<Sample>,
        audio: &AudioConfig,
        shuffle_seed: Option<u64>,
    ) -> Result<Self> {
        log::info!("loading {} {} samples...", samples.len(), split);

        if let Some(seed) = shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            samples.shuffle(&mut rng);
        }

        Ok(Self {
            split: split.to_string(),
            samples,
            stft: TacotronStft::new(audio)?,
        })
    }

    pub fn split(&self) -> &str {
        &self.split
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Token sequence and mel features of the i-th sample
    pub fn get(&self, index: usize) -> Result<TextMelPair> {
        let sample = self.samples.get(index).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "index {} out of range for {} samples",
                index,
                self.samples.len()
            ))
        })?;
        let mel = compute_mel_from_file(&sample.audiopath, &self.stft)?;
        Ok((sample.text.clone(), mel))
    }

    /// Collated batches in dataset order
    pub fn batches<'a>(
        &'a self,
        batch_size: usize,
        collate: &'a TextMelCollate,
        policy: SampleErrorPolicy,
    ) -> Batches<'a> {
        Batches {
            dataset: self,
            collate,
            batch_size: batch_size.max(1),
            policy,
            position: 0,
        }
    }
}

/// Iterator over collated batches of a [`TextMelDataset`]
///
/// Samples within a batch are loaded in parallel.
pub struct Batches<'a> {
    dataset: &'a TextMelDataset,
    collate: &'a TextMelCollate,
    batch_size: usize,
    policy: SampleErrorPolicy,
    position: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.dataset.len() {
            let start = self.position;
            let end = (start + self.batch_size).min(self.dataset.len());
            self.position = end;

            let loaded: Vec<Result<TextMelPair>> =
                (start..end).into_par_iter().map(|i| self.dataset.get(i)).collect();

            let mut pairs = Vec::with_capacity(loaded.len());
            for result in loaded {
                match (result, self.policy) {
                    (Ok(pair), _) => pairs.push(pair),
                    (Err(e), SampleErrorPolicy::Abort) => {
                        self.position = self.dataset.len();
                        return Some(Err(e));
                    }
                    (Err(e), SampleErrorPolicy::Skip) => {
                        log::warn!("skipping sample: {}", e);
                    }
                }
            }

            if !pairs.is_empty() {
                return Some(self.collate.collate(&pairs));
            }
        }
        None
    }
}
