//! autoreg CLI - Command-line interface for autoregressive waveform generation
//!
//! This binary provides commands for generating audio from a trained WaveRNN
//! model and for extracting silence masks from training recordings.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use autoreg_cli::commands;

/// autoreg - Autoregressive Waveform Generation
#[derive(Parser)]
#[command(name = "autoreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Emit diagnostic logs to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate waveforms from a trained model
    Generate {
        /// Path to the config file (JSON)
        #[arg(short, long)]
        config: String,

        /// Path to the model artifact (JSON)
        #[arg(short, long)]
        model: String,

        /// Output WAV path; batches append `_<index>` to the file stem
        #[arg(short, long)]
        output: String,

        /// Length of each utterance in seconds
        #[arg(short, long, default_value_t = 1.0)]
        time_length: f64,

        /// Sampling policy (random, maximum)
        #[arg(short, long, default_value = "random", value_parser = ["random", "maximum"])]
        policy: String,

        /// Number of utterances to generate
        #[arg(short, long, default_value_t = 1)]
        num_generate: usize,

        /// Base seed for random sampling
        #[arg(short, long, default_value_t = 0)]
        seed: u32,

        /// Compute device (cpu, gpu:N)
        #[arg(short, long, default_value = "cpu")]
        device: String,

        /// Local conditioning frames (JSON array of arrays), shared by every utterance
        #[arg(long)]
        local: Option<String>,
    },

    /// Write a randomly initialized model artifact for a config
    InitModel {
        /// Path to the config file (JSON)
        #[arg(short, long)]
        config: String,

        /// Output model artifact path
        #[arg(short, long)]
        output: String,

        /// Seed for weight initialization
        #[arg(short, long, default_value_t = 0)]
        seed: u32,
    },

    /// Compute per-file silence masks for a set of WAV files
    ExtractSilence {
        /// Glob selecting the input WAV files
        #[arg(long = "input_glob", visible_alias = "input-glob")]
        input_glob: String,

        /// Directory receiving the masks and arguments.json
        #[arg(long = "output_directory", visible_alias = "output-directory")]
        output_directory: String,

        /// Rate every input is resampled to before analysis
        #[arg(long = "sampling_rate", visible_alias = "sampling-rate")]
        sampling_rate: u32,

        /// Threshold in dB below the loudest frame that counts as silence
        #[arg(long = "silence_top_db", visible_alias = "silence-top-db", default_value_t = 60.0)]
        silence_top_db: f64,

        /// Number of decoding workers (default: available parallelism)
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn init_tracing(verbose: bool) {
    if !verbose {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            model,
            output,
            time_length,
            policy,
            num_generate,
            seed,
            device,
            local,
        } => commands::generate::run(&commands::generate::GenerateArgs {
            config_path: config,
            model_path: model,
            output,
            time_length,
            policy,
            num_generate,
            seed,
            device,
            local_path: local,
        }),
        Commands::InitModel {
            config,
            output,
            seed,
        } => commands::init_model::run(&config, &output, seed),
        Commands::ExtractSilence {
            input_glob,
            output_directory,
            sampling_rate,
            silence_top_db,
            threads,
        } => commands::extract_silence::run(
            &input_glob,
            &output_directory,
            sampling_rate,
            silence_top_db,
            threads,
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate_defaults() {
        let cli = Cli::try_parse_from([
            "autoreg",
            "generate",
            "--config",
            "config.json",
            "--model",
            "model.json",
            "--output",
            "out.wav",
        ])
        .unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Generate {
                config,
                time_length,
                policy,
                num_generate,
                seed,
                device,
                local,
                ..
            } => {
                assert_eq!(config, "config.json");
                assert_eq!(time_length, 1.0);
                assert_eq!(policy, "random");
                assert_eq!(num_generate, 1);
                assert_eq!(seed, 0);
                assert_eq!(device, "cpu");
                assert!(local.is_none());
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        let result = Cli::try_parse_from([
            "autoreg", "generate", "-c", "c.json", "-m", "m.json", "-o", "o.wav", "--policy",
            "mix",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_extract_silence_flags() {
        let cli = Cli::try_parse_from([
            "autoreg",
            "--verbose",
            "extract-silence",
            "--input_glob",
            "data/*.wav",
            "--output_directory",
            "masks",
            "--sampling_rate",
            "24000",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::ExtractSilence {
                input_glob,
                output_directory,
                sampling_rate,
                silence_top_db,
                threads,
            } => {
                assert_eq!(input_glob, "data/*.wav");
                assert_eq!(output_directory, "masks");
                assert_eq!(sampling_rate, 24000);
                assert_eq!(silence_top_db, 60.0);
                assert!(threads.is_none());
            }
            _ => panic!("expected extract-silence command"),
        }
    }

    #[test]
    fn test_cli_extract_silence_requires_rate() {
        let result = Cli::try_parse_from([
            "autoreg",
            "extract-silence",
            "--input_glob",
            "*.wav",
            "--output_directory",
            "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_init_model() {
        let cli = Cli::try_parse_from([
            "autoreg", "init-model", "-c", "config.json", "-o", "model.json", "-s", "9",
        ])
        .unwrap();
        match cli.command {
            Commands::InitModel {
                config,
                output,
                seed,
            } => {
                assert_eq!(config, "config.json");
                assert_eq!(output, "model.json");
                assert_eq!(seed, 9);
            }
            _ => panic!("expected init-model command"),
        }
    }
}
