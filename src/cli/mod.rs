//! Command-line interface for cadence.
//!
//! This module provides CLI commands for playing files with the headless
//! backend, inspecting audio files and managing the config file.

mod commands;

pub use commands::{Cli, Commands, ConsoleUi, RepeatArg, run_command};
