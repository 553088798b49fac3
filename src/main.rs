//! melprep CLI - dataset preparation for text-to-mel training
//!
//! Command-line interface over the preprocessing passes

use clap::{Parser, Subcommand, ValueEnum};
use melprep::{
    dataset::TextMelDataset,
    pipeline::{self, DurationOptions, PreprocessOptions},
    text::Vocabulary,
    Config, Result,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "melprep",
    about = "Prepare text/mel-spectrogram datasets for speech synthesis training",
    version,
    author
)]
struct Cli {
    /// Configuration file path (YAML); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TextModeArg {
    Pinyin,
    Literal,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the corpus and build the vocabulary
    Preprocess {
        /// Keep only speakers with this attribute
        #[arg(short, long, default_value = "M")]
        gender: String,

        /// Keep every speaker regardless of attribute
        #[arg(long, conflicts_with = "gender")]
        all_speakers: bool,

        /// Encode against an existing vocabulary instead of building one
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Override the transcript mode
        #[arg(long, value_enum)]
        mode: Option<TextModeArg>,

        /// Also write `path|text` manifests into this directory
        #[arg(long)]
        manifest_dir: Option<PathBuf>,
    },

    /// Copy random samples of a split for listening
    Collect {
        #[arg(short, long, default_value = "train")]
        split: String,

        #[arg(short = 'n', long, default_value = "20")]
        count: usize,

        #[arg(short, long, default_value = "audios")]
        output: PathBuf,

        #[arg(long, default_value = "1234")]
        seed: u64,
    },

    /// Copy the first recording of each speaker with an attribute
    CollectSpeakers {
        #[arg(short, long, default_value = "M")]
        gender: String,

        #[arg(short, long, default_value = "audios")]
        output: PathBuf,
    },

    /// Total trimmed duration of a folder of WAV files
    Duration {
        folder: PathBuf,

        /// Rate files are resampled to before measuring
        #[arg(long, default_value = "22050")]
        sample_rate: u32,

        /// Silence threshold below peak, in dB
        #[arg(long, default_value = "60")]
        top_db: f32,
    },

    /// Mean text length and mel size over a split
    Stats {
        #[arg(short, long, default_value = "dev")]
        split: String,
    },

    /// Generate default configuration file
    InitConfig {
        /// Output path for config file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Show information about the system
    Info,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Preprocess {
            gender,
            all_speakers,
            vocab,
            mode,
            manifest_dir,
        } => {
            if let Some(mode) = mode {
                config.text.mode = match mode {
                    TextModeArg::Pinyin => melprep::text::TextMode::Pinyin,
                    TextModeArg::Literal => melprep::text::TextMode::Literal,
                };
            }
            if manifest_dir.is_some() {
                config.paths.manifest_dir = manifest_dir;
            }

            let options = PreprocessOptions {
                gender: (!all_speakers).then_some(gender),
                vocabulary: vocab.map(Vocabulary::load).transpose()?,
            };

            let report = pipeline::preprocess(&config, &options)?;

            for (split, samples) in report.index.iter() {
                println!("num_{}: {}", split, samples.len());
            }
            println!("vocabulary: {} symbols", report.vocabulary.len());
            println!("Processing time: {:.2}s", report.processing_time);
            println!("✓ Index saved to: {}", config.paths.data_file.display());
        }

        Commands::Collect {
            split,
            count,
            output,
            seed,
        } => {
            let copied = pipeline::collect_random(&config, &split, count, &output, seed)?;
            println!("✓ Copied {} files to: {}", copied.len(), output.display());
        }

        Commands::CollectSpeakers { gender, output } => {
            let copied = pipeline::collect_speakers(&config, &gender, &output)?;
            println!("✓ Copied {} files to: {}", copied.len(), output.display());
        }

        Commands::Duration {
            folder,
            sample_rate,
            top_db,
        } => {
            let options = DurationOptions {
                sample_rate,
                top_db,
                ..Default::default()
            };
            let report = pipeline::total_duration(&folder, &options)?;
            println!("{:.4} hours", report.hours());
        }

        Commands::Stats { split } => {
            let dataset = TextMelDataset::open(&split, &config)?;
            let vocab = Vocabulary::load(&config.paths.vocab_file)?;

            if let Some(sample) = dataset.samples().first() {
                println!("text: {:?}", sample.text);
                println!("text: {}", vocab.decode_to_string(&sample.text));
            }

            let stats = pipeline::split_stats(&dataset)?;
            println!("len({}_dataset): {}", split, stats.samples);
            println!("mean text length: {:.2}", stats.mean_text_len);
            println!("mean mel size: {:.2}", stats.mean_mel_size);
        }

        Commands::InitConfig { output } => {
            log::info!("Creating default configuration...");

            let config = Config::default();
            config.save(&output)?;

            println!("✓ Configuration saved to: {}", output.display());
        }

        Commands::Info => {
            println!("melprep - Text/mel dataset preparation");
            println!("======================================");
            println!("Version: {}", melprep::VERSION);
            println!("Platform: {}", std::env::consts::OS);
            println!("Architecture: {}", std::env::consts::ARCH);
            println!();
            println!("Sample Rate: {} Hz", config.audio.sample_rate);
            println!("Mel Bands: {}", config.audio.n_mels);
            println!("FFT Size: {}", config.audio.n_fft);
            println!("Hop Length: {}", config.audio.hop_length);
            println!("Win Length: {}", config.audio.win_length);
            println!("Frames per step: {}", config.training.frames_per_step);
            println!();
            println!("CPU Cores: {}", num_cpus::get());
            println!("Physical Cores: {}", num_cpus::get_physical());
        }
    }

    Ok(())
}
