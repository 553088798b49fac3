//! Corpus indexing pass

use crate::config::Config;
use crate::dataset::{manifest_name, write_manifest, IndexBuilder, SplitIndex};
use crate::text::{Vocabulary, VocabularyBuilder};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::ensure_parent;

/// Options for [`preprocess`]
#[derive(Debug, Clone, Default)]
pub struct PreprocessOptions {
    /// Keep only speakers with this attribute (e.g. `M`)
    pub gender: Option<String>,
    /// Encode against this vocabulary instead of building one
    pub vocabulary: Option<Vocabulary>,
}

/// What [`preprocess`] produced
#[derive(Debug)]
pub struct PreprocessReport {
    pub index: SplitIndex,
    pub vocabulary: Vocabulary,
    /// Manifest files written, if any
    pub manifests: Vec<PathBuf>,
    /// Wall-clock time in seconds
    pub processing_time: f32,
}

/// Build the sample index and vocabulary and persist them
///
/// Nothing is written unless every split indexes cleanly. Outputs are first
/// written to `<name>.partial` siblings and renamed into place only once all
/// of them have been written; a failed write removes the staged files.
pub fn preprocess(config: &Config, options: &PreprocessOptions) -> Result<PreprocessReport> {
    let start = Instant::now();

    let vocab = match &options.vocabulary {
        Some(v) => VocabularyBuilder::frozen(v.clone()),
        None => VocabularyBuilder::new(),
    };
    if let Some(gender) = &options.gender {
        log::info!("gender: {}", gender);
    }

    let builder = IndexBuilder::from_config(config, vocab)?;
    let (index, vocabulary) = builder.build(&config.text.splits, options.gender.as_deref())?;

    let mut staged = Vec::new();
    let manifests = match stage_outputs(config, &index, &vocabulary, &mut staged) {
        Ok(manifests) => manifests,
        Err(e) => {
            discard(&staged);
            return Err(e);
        }
    };
    for (partial, target) in &staged {
        std::fs::rename(partial, target)?;
    }

    for (split, samples) in index.iter() {
        log::info!("num_{}: {}", split, samples.len());
    }
    log::info!("vocabulary size: {}", vocabulary.len());

    Ok(PreprocessReport {
        index,
        vocabulary,
        manifests,
        processing_time: start.elapsed().as_secs_f32(),
    })
}

/// `<path>.partial`, the file an output is written to before it is committed
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write every output to its partial path, recording `(partial, target)` pairs
fn stage_outputs(
    config: &Config,
    index: &SplitIndex,
    vocabulary: &Vocabulary,
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<Vec<PathBuf>> {
    let data_file = &config.paths.data_file;
    ensure_parent(data_file)?;
    staged.push((partial_path(data_file), data_file.clone()));
    index.save(partial_path(data_file))?;

    let vocab_file = &config.paths.vocab_file;
    ensure_parent(vocab_file)?;
    staged.push((partial_path(vocab_file), vocab_file.clone()));
    vocabulary.save(partial_path(vocab_file))?;

    let mut manifests = Vec::new();
    if let Some(dir) = &config.paths.manifest_dir {
        std::fs::create_dir_all(dir)?;
        for (split, samples) in index.iter() {
            let path = dir.join(manifest_name(split));
            staged.push((partial_path(&path), path.clone()));
            write_manifest(partial_path(&path), samples, vocabulary)?;
            manifests.push(path);
        }
    }
    Ok(manifests)
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (partial, _) in staged {
        if partial.exists() {
            if let Err(e) = std::fs::remove_file(partial) {
                log::warn!("could not remove {}: {}", partial.display(), e);
            }
        }
    }
}
