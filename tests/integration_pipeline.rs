//! Pipeline Integration Tests for melprep
//!
//! These tests build a small corpus on disk and run it through the passes:
//! corpus → sample index + vocabulary → mel extraction → padded batches.

use melprep::audio::save_samples;
use melprep::dataset::{
    IndexBuilder, SampleErrorPolicy, SpeakerPattern, SplitIndex, TextMelCollate, TextMelDataset,
};
use melprep::pipeline::{self, DurationOptions, PreprocessOptions};
use melprep::text::{TextMode, Vocabulary, VocabularyBuilder, UNK_ID};
use melprep::{Config, Error, SAMPLE_RATE};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Fixture corpus
// ============================================================================

/// Speakers: S0001 (M), S0002 (F), S0003 (M)
/// train: S0001 x2, S0002 x1, S0003 x1 (one untranscribed)
/// dev:   S0001 x1, S0002 x1
/// test:  S0003 x1
struct Corpus {
    _dir: TempDir,
    root: PathBuf,
    config: Config,
}

fn tone(seconds: f32, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sample_rate as f32).sin() * 0.5)
        .collect()
}

fn write_wav(path: &Path, seconds: f32, sample_rate: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    save_samples(path, &tone(seconds, sample_rate), sample_rate).unwrap();
}

fn build_corpus(mode: TextMode) -> Corpus {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let wav = root.join("wav");

    let files = [
        ("train", "S0001", "U0001", 0.10),
        ("train", "S0001", "U0002", 0.20),
        ("train", "S0002", "U0003", 0.10),
        ("train", "S0003", "U0004", 0.15),
        ("train", "S0003", "U0099", 0.10),
        ("dev", "S0001", "U0005", 0.10),
        ("dev", "S0002", "U0006", 0.10),
        ("test", "S0003", "U0007", 0.10),
    ];
    for (split, speaker, utt, secs) in files {
        write_wav(&wav.join(split).join(speaker).join(format!("{}.wav", utt)), secs, SAMPLE_RATE);
    }

    std::fs::write(
        root.join("transcript.txt"),
        "U0001 中国\nU0002 你 好\nU0003 世界\nU0004 中 国 人\nU0005 好\nU0006 人\nU0007 你好 中国\n",
    )
    .unwrap();
    std::fs::write(root.join("speaker.info"), "0001 M\n0002 F\n0003 M\n").unwrap();

    let mut config = Config::default();
    config.paths.wav_folder = wav;
    config.paths.transcript_file = root.join("transcript.txt");
    config.paths.speaker_info = root.join("speaker.info");
    config.paths.data_file = root.join("out/samples.json");
    config.paths.vocab_file = root.join("out/vocab.json");
    config.text.mode = mode;

    Corpus {
        _dir: dir,
        root,
        config,
    }
}

fn male_only() -> PreprocessOptions {
    PreprocessOptions {
        gender: Some("M".into()),
        vocabulary: None,
    }
}

fn file_names(index: &SplitIndex, split: &str) -> Vec<String> {
    index
        .get(split)
        .unwrap()
        .iter()
        .map(|s| s.audiopath.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

// ============================================================================
// Index building
// ============================================================================

#[test]
fn test_preprocess_filters_by_gender() {
    let corpus = build_corpus(TextMode::Literal);
    let report = pipeline::preprocess(&corpus.config, &male_only()).unwrap();

    assert_eq!(file_names(&report.index, "train"), vec!["U0001.wav", "U0002.wav", "U0004.wav"]);
    assert_eq!(file_names(&report.index, "dev"), vec!["U0005.wav"]);
    assert_eq!(file_names(&report.index, "test"), vec!["U0007.wav"]);

    // Untranscribed U0099 is silently left out
    assert_eq!(report.index.total(), 5);
}

#[test]
fn test_preprocess_all_speakers() {
    let corpus = build_corpus(TextMode::Literal);
    let report = pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();
    assert_eq!(report.index.get("train").unwrap().len(), 4);
    assert_eq!(report.index.get("dev").unwrap().len(), 2);
}

#[test]
fn test_literal_vocabulary_order() {
    let corpus = build_corpus(TextMode::Literal);
    let report = pipeline::preprocess(&corpus.config, &male_only()).unwrap();
    let vocab = &report.vocabulary;

    // Discovery order: U0001 中国, U0002 你好, U0004 中国人, ...
    assert_eq!(vocab.get("中"), Some(2));
    assert_eq!(vocab.get("国"), Some(3));
    assert_eq!(vocab.get("你"), Some(4));
    assert_eq!(vocab.get("好"), Some(5));
    assert_eq!(vocab.get("人"), Some(6));
    // Only in the female speaker's transcripts
    assert_eq!(vocab.get("世"), None);

    let first = &report.index.get("train").unwrap()[0];
    assert_eq!(first.text, vec![2, 3]);
    assert_eq!(vocab.decode_to_string(&first.text), "中国");

    for token in vocab.tokens() {
        assert_eq!(vocab.token(vocab.get(token).unwrap()), Some(token));
    }
}

#[test]
fn test_pinyin_transcripts() {
    let corpus = build_corpus(TextMode::Pinyin);
    let report = pipeline::preprocess(&corpus.config, &male_only()).unwrap();

    let first = &report.index.get("train").unwrap()[0];
    assert_eq!(report.vocabulary.decode_to_string(&first.text), "zhong1 guo2");
}

#[test]
fn test_preprocess_persists_outputs() {
    let mut corpus = build_corpus(TextMode::Literal);
    corpus.config.paths.manifest_dir = Some(corpus.root.join("manifests"));
    let report = pipeline::preprocess(&corpus.config, &male_only()).unwrap();

    let index = SplitIndex::load(&corpus.config.paths.data_file).unwrap();
    assert_eq!(index, report.index);
    let vocab = Vocabulary::load(&corpus.config.paths.vocab_file).unwrap();
    assert_eq!(vocab, report.vocabulary);

    let train = std::fs::read_to_string(corpus.root.join("manifests/train.txt")).unwrap();
    let first_line = train.lines().next().unwrap();
    assert!(first_line.ends_with("U0001.wav|中国"), "{}", first_line);
    assert!(corpus.root.join("manifests/validation.txt").exists());
    assert_eq!(report.manifests.len(), 3);
}

#[test]
fn test_vocabulary_is_independent_of_creation_order() {
    let a = build_corpus(TextMode::Literal);
    let first = pipeline::preprocess(&a.config, &male_only()).unwrap();

    // Same corpus, files created in reverse order
    let b = build_corpus(TextMode::Literal);
    let train = b.config.paths.wav_folder.join("train");
    std::fs::remove_dir_all(&train).unwrap();
    for (speaker, utt, secs) in [
        ("S0003", "U0099", 0.10),
        ("S0003", "U0004", 0.15),
        ("S0002", "U0003", 0.10),
        ("S0001", "U0002", 0.20),
        ("S0001", "U0001", 0.10),
    ] {
        write_wav(&train.join(speaker).join(format!("{}.wav", utt)), secs, SAMPLE_RATE);
    }
    let second = pipeline::preprocess(&b.config, &male_only()).unwrap();

    assert_eq!(first.vocabulary, second.vocabulary);
    let texts = |r: &pipeline::PreprocessReport| -> Vec<Vec<i64>> {
        r.index.get("train").unwrap().iter().map(|s| s.text.clone()).collect()
    };
    assert_eq!(texts(&first), texts(&second));
}

#[test]
fn test_frozen_vocabulary_substitutes_unknown() {
    let corpus = build_corpus(TextMode::Literal);
    let mut seed = VocabularyBuilder::new();
    seed.encode(["中", "国"]);

    let options = PreprocessOptions {
        gender: Some("M".into()),
        vocabulary: Some(seed.finish()),
    };
    let report = pipeline::preprocess(&corpus.config, &options).unwrap();

    let train = report.index.get("train").unwrap();
    assert_eq!(train[0].text, vec![2, 3]);
    // 你好 is unknown to the frozen vocabulary
    assert_eq!(train[1].text, vec![UNK_ID, UNK_ID]);
    // 中国人: the unknown symbol doesn't stop the rest
    assert_eq!(train[2].text, vec![2, 3, UNK_ID]);
    assert_eq!(report.vocabulary.len(), 4);
}

#[test]
fn test_unknown_speaker_aborts() {
    let corpus = build_corpus(TextMode::Literal);
    std::fs::write(&corpus.config.paths.speaker_info, "0001 M\n0002 F\n").unwrap();

    let err = pipeline::preprocess(&corpus.config, &male_only()).unwrap_err();
    assert!(matches!(err, Error::UnknownSpeaker { ref speaker, .. } if speaker == "S0003"));
    assert!(!corpus.config.paths.data_file.exists());
}

#[test]
fn test_malformed_transcript_aborts() {
    let corpus = build_corpus(TextMode::Literal);
    std::fs::write(&corpus.config.paths.transcript_file, "U0001 中国\nU0002\n").unwrap();

    let err = pipeline::preprocess(&corpus.config, &male_only()).unwrap_err();
    assert!(matches!(err, Error::Malformed { line: 2, .. }));
}

#[test]
fn test_missing_split_directory_aborts() {
    let corpus = build_corpus(TextMode::Literal);
    std::fs::remove_dir_all(corpus.config.paths.wav_folder.join("test")).unwrap();

    let err = pipeline::preprocess(&corpus.config, &male_only()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
}

#[test]
fn test_missing_transcript_file_aborts() {
    let corpus = build_corpus(TextMode::Literal);
    std::fs::remove_file(&corpus.config.paths.transcript_file).unwrap();

    let err = pipeline::preprocess(&corpus.config, &male_only()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert!(!corpus.config.paths.data_file.exists());
}

#[test]
fn test_missing_speaker_table_aborts() {
    let corpus = build_corpus(TextMode::Literal);
    std::fs::remove_file(&corpus.config.paths.speaker_info).unwrap();

    let err = pipeline::preprocess(&corpus.config, &male_only()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert!(!corpus.config.paths.data_file.exists());
}

#[test]
fn test_failed_write_leaves_no_index() {
    let mut corpus = build_corpus(TextMode::Literal);
    // The vocabulary's parent is a regular file, so its directory can't be created
    let blocker = corpus.root.join("blocker");
    std::fs::write(&blocker, "").unwrap();
    corpus.config.paths.vocab_file = blocker.join("vocab.json");

    assert!(pipeline::preprocess(&corpus.config, &male_only()).is_err());
    assert!(!corpus.config.paths.data_file.exists());
    let out = corpus.config.paths.data_file.parent().unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(out).unwrap().collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}

#[test]
fn test_component_speaker_pattern() {
    let mut corpus = build_corpus(TextMode::Literal);
    // <wav_folder>/<split>/<speaker>/<utt>.wav: the speaker is component 1
    corpus.config.text.speaker_pattern = SpeakerPattern::Component(1);

    let builder = IndexBuilder::from_config(&corpus.config, VocabularyBuilder::new()).unwrap();
    let (index, _) = builder.build(&corpus.config.text.splits, Some("M")).unwrap();

    assert_eq!(file_names(&index, "train"), vec!["U0001.wav", "U0002.wav", "U0004.wav"]);
    assert_eq!(file_names(&index, "dev"), vec!["U0005.wav"]);
    assert_eq!(file_names(&index, "test"), vec!["U0007.wav"]);
}

#[test]
fn test_regex_speaker_pattern() {
    let mut corpus = build_corpus(TextMode::Literal);
    // Speaker folders carry a prefix the table doesn't know about
    for split in ["train", "dev", "test"] {
        let folder = corpus.config.paths.wav_folder.join(split);
        for speaker in ["S0001", "S0002", "S0003"] {
            let from = folder.join(speaker);
            if from.is_dir() {
                std::fs::rename(&from, folder.join(format!("spk_{}", speaker))).unwrap();
            }
        }
    }

    let builder = IndexBuilder::from_config(&corpus.config, VocabularyBuilder::new()).unwrap();
    let err = builder.build(&corpus.config.text.splits, Some("M")).unwrap_err();
    assert!(matches!(err, Error::UnknownSpeaker { ref speaker, .. } if speaker == "spk_S0001"));

    corpus.config.text.speaker_pattern = SpeakerPattern::Regex(r"spk_(?P<speaker>S\d{4})".into());
    let builder = IndexBuilder::from_config(&corpus.config, VocabularyBuilder::new()).unwrap();
    let (index, vocab) = builder.build(&corpus.config.text.splits, Some("M")).unwrap();

    assert_eq!(file_names(&index, "train"), vec!["U0001.wav", "U0002.wav", "U0004.wav"]);
    assert_eq!(file_names(&index, "dev"), vec!["U0005.wav"]);
    assert_eq!(index.total(), 5);
    assert_eq!(vocab.get("世"), None);
}

// ============================================================================
// Loading and batching
// ============================================================================

#[test]
fn test_dataset_batches() {
    let corpus = build_corpus(TextMode::Literal);
    pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();

    let dataset = TextMelDataset::open("train", &corpus.config).unwrap();
    assert_eq!(dataset.len(), 4);

    let collate = TextMelCollate::new(2).unwrap();
    let batches: Vec<_> = dataset
        .batches(3, &collate, SampleErrorPolicy::Abort)
        .collect::<melprep::Result<_>>()
        .unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(batches[1].len(), 1);

    for batch in &batches {
        assert_eq!(batch.n_mels(), 80);
        assert_eq!(batch.max_target_len() % 2, 0);
        let lengths = batch.input_lengths.to_vec();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        for row in 0..batch.len() {
            let frames = batch.output_lengths[row] as usize;
            assert_eq!(batch.gate_padded[[row, frames - 1]], 1.0);
            if frames >= 2 {
                assert_eq!(batch.gate_padded[[row, frames - 2]], 0.0);
            }
        }
    }
}

#[test]
fn test_frame_count_follows_hop() {
    let corpus = build_corpus(TextMode::Literal);
    pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();

    let dataset = TextMelDataset::open("dev", &corpus.config).unwrap();
    let (_, mel) = dataset.get(0).unwrap();
    let samples = (0.10 * SAMPLE_RATE as f32) as usize;
    assert_eq!(mel.shape(), &[80, samples / 256 + 1]);
}

#[test]
fn test_sample_rate_mismatch_policy() {
    let corpus = build_corpus(TextMode::Literal);
    // Re-record one dev file at the wrong rate
    write_wav(
        &corpus.config.paths.wav_folder.join("dev/S0002/U0006.wav"),
        0.10,
        16000,
    );
    pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();

    let mut config = corpus.config.clone();
    config.training.shuffle_seed = 7;
    let dataset = TextMelDataset::open("dev", &config).unwrap();
    let collate = TextMelCollate::new(1).unwrap();

    let aborted: Vec<_> = dataset.batches(2, &collate, SampleErrorPolicy::Abort).collect();
    assert_eq!(aborted.len(), 1);
    let err = aborted.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_sample_rate_mismatch(), "{}", err);

    let skipped: Vec<_> = dataset
        .batches(2, &collate, SampleErrorPolicy::Skip)
        .collect::<melprep::Result<_>>()
        .unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].len(), 1);
}

#[test]
fn test_split_stats() {
    let corpus = build_corpus(TextMode::Literal);
    pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();

    let dataset = TextMelDataset::open("dev", &corpus.config).unwrap();
    let stats = pipeline::split_stats(&dataset).unwrap();
    assert_eq!(stats.samples, 2);
    assert!((stats.mean_text_len - 1.0).abs() < 1e-9);
    let frames = (0.10 * SAMPLE_RATE as f32) as usize / 256 + 1;
    assert!((stats.mean_mel_size - (80 * frames) as f64).abs() < 1e-9);
}

// ============================================================================
// Auxiliary passes
// ============================================================================

#[test]
fn test_collect_random() {
    let corpus = build_corpus(TextMode::Literal);
    pipeline::preprocess(&corpus.config, &PreprocessOptions::default()).unwrap();

    let out = corpus.root.join("audios");
    let copied = pipeline::collect_random(&corpus.config, "train", 3, &out, 1234).unwrap();
    assert_eq!(copied.len(), 3);
    for i in 0..3 {
        assert!(out.join(format!("{}.wav", i)).exists());
    }

    assert!(pipeline::collect_random(&corpus.config, "train", 10, &out, 1234).is_err());
}

#[test]
fn test_collect_speakers() {
    let corpus = build_corpus(TextMode::Literal);
    let out = corpus.root.join("speakers");

    let copied = pipeline::collect_speakers(&corpus.config, "M", &out).unwrap();
    assert_eq!(copied, vec![out.join("S0001.wav"), out.join("S0003.wav")]);
}

#[test]
fn test_total_duration() {
    let dir = tempfile::tempdir().unwrap();
    let mut signal = vec![0.0f32; 11025];
    signal.extend(tone(1.0, SAMPLE_RATE));
    signal.extend(vec![0.0f32; 11025]);
    save_samples(dir.path().join("a.wav"), &signal, SAMPLE_RATE).unwrap();
    save_samples(dir.path().join("b.wav"), &tone(0.5, SAMPLE_RATE), SAMPLE_RATE).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();

    let report = pipeline::total_duration(dir.path(), &DurationOptions::default()).unwrap();
    assert_eq!(report.files, 2);
    // ~1.5s of tone plus at most a few frames of context per file
    assert!(report.seconds > 1.45 && report.seconds < 1.8, "{}", report.seconds);
    assert!((report.hours() - report.seconds / 3600.0).abs() < 1e-12);
}
