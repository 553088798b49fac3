//! Preprocessing passes
//!
//! Each pass is one linear walk over the corpus or the persisted index and
//! backs one subcommand of the `melprep` binary.

mod collect;
mod duration;
mod preprocess;
mod stats;

pub use collect::{collect_random, collect_speakers};
pub use duration::{total_duration, DurationOptions, DurationReport};
pub use preprocess::{preprocess, PreprocessOptions, PreprocessReport};
pub use stats::{split_stats, SplitStats};

use crate::Result;
use std::path::Path;

/// Create the parent directory of an output file if needed
pub(crate) fn ensure_parent<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
