//! Line-oriented `audio_path|text` manifests for downstream tooling

use crate::text::Vocabulary;
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::Sample;

/// Manifest file name for a split; `dev` is published as `validation`
pub fn manifest_name(split: &str) -> String {
    match split {
        "dev" => "validation.txt".to_string(),
        other => format!("{}.txt", other),
    }
}

/// Write one `audio_path|text` line per sample, text decoded through `vocab`
pub fn write_manifest<P: AsRef<Path>>(path: P, samples: &[Sample], vocab: &Vocabulary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for sample in samples {
        writeln!(
            writer,
            "{}|{}",
            sample.audiopath.display(),
            vocab.decode_to_string(&sample.text)
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::VocabularyBuilder;
    use std::path::PathBuf;

    #[test]
    fn test_manifest_names() {
        assert_eq!(manifest_name("train"), "train.txt");
        assert_eq!(manifest_name("dev"), "validation.txt");
        assert_eq!(manifest_name("test"), "test.txt");
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");

        let mut builder = VocabularyBuilder::new();
        let samples = vec![
            Sample {
                audiopath: PathBuf::from("wav/S1/a.wav"),
                text: builder.encode(["n", "i", "3"]),
            },
            Sample {
                audiopath: PathBuf::from("wav/S1/b.wav"),
                text: builder.encode(["h", "i"]),
            },
        ];
        write_manifest(&path, &samples, &builder.finish()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "wav/S1/a.wav|ni3\nwav/S1/b.wav|hi\n");
    }
}
