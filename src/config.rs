//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\cadence\config.toml
//! - macOS: ~/Library/Application Support/cadence/config.toml
//! - Linux: ~/.config/cadence/config.toml
//!
//! The config file is human-readable and editable. Every section is
//! optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::player::{
    ClockConfig, ControllerConfig, KeyAction, Keymap, RepeatMode, default_bindings,
};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback policy
    pub playback: PlaybackConfig,

    /// Spectrum sampling
    pub visualizer: VisualizerConfig,

    /// Key name → action
    pub shortcuts: BTreeMap<String, KeyAction>,

    /// Library settings
    pub library: LibraryConfig,
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// What happens at the end of a track
    pub repeat_mode: RepeatMode,

    /// Seconds added or removed per seek key press
    pub seek_step_secs: u64,

    /// Volume change per volume key press
    pub volume_step: f64,

    /// Position polling period in milliseconds
    pub tick_period_ms: u64,

    /// Volume at startup (unset = keep the engine's volume)
    pub initial_volume: Option<f64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatMode::default(),
            seek_step_secs: 5,
            volume_step: 0.05,
            tick_period_ms: 50,
            initial_volume: None,
        }
    }
}

/// Visualizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Sample the spectrum while playing
    pub enabled: bool,

    /// Number of spectrum bands
    pub bands: usize,

    /// Spectrum floor in dB
    pub threshold: i32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bands: 128,
            threshold: -80,
        }
    }
}

/// Library management settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directories scanned when `play` is given no paths
    pub paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            visualizer: VisualizerConfig::default(),
            shortcuts: default_bindings(),
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    /// Controller settings derived from this config.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            tick_period: Duration::from_millis(self.playback.tick_period_ms.max(1)),
            seek_step: Duration::from_secs(self.playback.seek_step_secs),
            volume_step: self.playback.volume_step,
            repeat_mode: self.playback.repeat_mode,
            initial_volume: self.playback.initial_volume,
            visualizer: self.visualizer.enabled,
        }
    }

    /// Headless backend settings derived from this config.
    pub fn clock_config(&self) -> ClockConfig {
        ClockConfig {
            bands: self.visualizer.bands,
            threshold: self.visualizer.threshold,
            ..ClockConfig::default()
        }
    }

    pub fn keymap(&self) -> Keymap {
        Keymap::from_bindings(self.shortcuts.clone())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cadence"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from `path`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to `path`.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[playback]"));
        assert!(toml.contains("[visualizer]"));
        assert!(toml.contains("[shortcuts]"));
        assert!(toml.contains("[library]"));
        assert!(toml.contains("repeat_mode = \"repeat-all\""));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.playback.repeat_mode = RepeatMode::RepeatOne;
        config.playback.initial_volume = Some(0.75);
        config.library.paths.push(PathBuf::from("/music"));

        save_to(&config, &path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[playback]
repeat_mode = "no-repeat"
seek_step_secs = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.playback.repeat_mode, RepeatMode::NoRepeat);
        assert_eq!(config.playback.seek_step_secs, 10);

        // Other fields use defaults
        assert_eq!(config.playback.tick_period_ms, 50);
        assert_eq!(config.visualizer.threshold, -80);
        assert_eq!(config.shortcuts, default_bindings());
        assert!(config.library.paths.is_empty());
    }

    #[test]
    fn test_controller_config_conversion() {
        let mut config = Config::default();
        config.playback.tick_period_ms = 0;
        config.visualizer.enabled = true;

        let controller = config.controller_config();
        assert_eq!(controller.tick_period, Duration::from_millis(1));
        assert_eq!(controller.seek_step, Duration::from_secs(5));
        assert!(controller.visualizer);
        assert_eq!(config.clock_config().bands, 128);
    }

    #[test]
    fn test_custom_shortcuts() {
        let config: Config = toml::from_str("[shortcuts]\nk = \"play-pause\"\n").unwrap();
        let keymap = config.keymap();
        assert_eq!(keymap.lookup("K"), Some(KeyAction::PlayPause));
        assert_eq!(keymap.lookup("space"), None);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback\nrepeat_mode = 3").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
    }
}
