//! Copy a handful of recordings out of the corpus for listening checks

use crate::config::Config;
use crate::dataset::{sorted_wavs, SpeakerTable, SplitIndex};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Copy `count` randomly chosen samples of `split` to `<out_dir>/<i>.wav`
pub fn collect_random(
    config: &Config,
    split: &str,
    count: usize,
    out_dir: &Path,
    seed: u64,
) -> Result<Vec<PathBuf>> {
    let index = SplitIndex::load(&config.paths.data_file)?;
    let samples = index.split(split)?;
    if count > samples.len() {
        return Err(Error::InvalidFormat(format!(
            "asked for {} samples but split {} has {}",
            count,
            split,
            samples.len()
        )));
    }

    std::fs::create_dir_all(out_dir)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut copied = Vec::with_capacity(count);
    for (i, sample) in samples.choose_multiple(&mut rng, count).enumerate() {
        log::info!("{}", sample.audiopath.display());
        let target = out_dir.join(format!("{}.wav", i));
        std::fs::copy(&sample.audiopath, &target)?;
        copied.push(target);
    }
    Ok(copied)
}

/// Copy the first recording of every speaker with `attribute` to `<out_dir>/<speaker>.wav`
///
/// Speakers are looked up in `<wav_folder>/train`; those without a folder
/// there are passed over.
pub fn collect_speakers(config: &Config, attribute: &str, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let table = SpeakerTable::load(&config.paths.speaker_info, &config.text.speaker_prefix)?;
    let train = config.paths.wav_folder.join("train");

    std::fs::create_dir_all(out_dir)?;

    let mut copied = Vec::new();
    for speaker in table.speakers_with(attribute) {
        let folder = train.join(speaker);
        if !folder.is_dir() {
            continue;
        }
        let Some(first) = sorted_wavs(&folder)?.into_iter().next() else {
            continue;
        };
        log::info!("{}", first.display());
        let target = out_dir.join(format!("{}.wav", speaker));
        std::fs::copy(&first, &target)?;
        copied.push(target);
    }
    Ok(copied)
}
