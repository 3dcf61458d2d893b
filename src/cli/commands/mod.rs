//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed arguments
//! and returns an `anyhow::Result<()>`.

mod info;
mod play;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::player::RepeatMode;

pub use info::{cmd_config, cmd_info};
pub use play::{ConsoleUi, cmd_play};

/// Cadence CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Play files or directories with the headless backend
    Play {
        /// Files or directories (defaults to the configured library paths)
        paths: Vec<PathBuf>,
        /// Shuffle the queue before starting
        #[arg(short, long)]
        shuffle: bool,
        /// What to do at the end of each track
        #[arg(short, long, value_enum)]
        repeat: Option<RepeatArg>,
        /// Starting volume (0.0 - 1.0)
        #[arg(long)]
        volume: Option<f64>,
    },
    /// Show tags and duration of an audio file
    Info {
        /// Path to the audio file
        path: PathBuf,
    },
    /// Show the config file location
    Config {
        /// Write a default config file
        #[arg(long)]
        init: bool,
        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

/// Repeat mode as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatArg {
    One,
    All,
    None,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::One => RepeatMode::RepeatOne,
            RepeatArg::All => RepeatMode::RepeatAll,
            RepeatArg::None => RepeatMode::NoRepeat,
        }
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config_file = cli.config.clone().or_else(config::config_path);

    match &cli.command {
        Commands::Play {
            paths,
            shuffle,
            repeat,
            volume,
        } => {
            let mut config = load_config(cli)?;
            if let Some(repeat) = repeat {
                config.playback.repeat_mode = (*repeat).into();
            }
            if volume.is_some() {
                config.playback.initial_volume = *volume;
            }
            cmd_play(&config, paths, *shuffle)
        }
        Commands::Info { path } => cmd_info(path),
        Commands::Config { init, force } => cmd_config(config_file.as_deref(), *init, *force),
    }
}

/// An explicit `--config` must load; the default location falls back to
/// defaults.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Ok(config::load_from(path)?),
        None => Ok(config::load()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_command() {
        let cli = Cli::try_parse_from([
            "cadence", "play", "a.mp3", "music/", "--shuffle", "--repeat", "one",
        ])
        .unwrap();
        match cli.command {
            Commands::Play {
                paths,
                shuffle,
                repeat,
                volume,
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.mp3"), PathBuf::from("music/")]);
                assert!(shuffle);
                assert_eq!(repeat, Some(RepeatArg::One));
                assert!(volume.is_none());
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_parse_global_config_flag() {
        let cli = Cli::try_parse_from(["cadence", "config", "--init", "--config", "/tmp/c.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Config { init: true, force: false }));
    }

    #[test]
    fn test_repeat_arg_maps_to_mode() {
        assert_eq!(RepeatMode::from(RepeatArg::None), RepeatMode::NoRepeat);
        assert_eq!(RepeatMode::from(RepeatArg::All), RepeatMode::RepeatAll);
    }
}
