//! Cadence - the playback control core of a desktop music player.
//!
//! The [`player`] module holds the controller, its backend contract and the
//! collaborator interfaces. [`metadata`], [`scanner`] and [`config`] are the
//! file-facing helpers the CLI wires around it.

pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod player;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
