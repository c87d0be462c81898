//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.nextread/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::book::DEFAULT_GENRE;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NextReadConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_total_pages: Option<u32>,
    pub default_genre: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

/// Page count assumed when a book with no known length is started.
pub const DEFAULT_TOTAL_PAGES: u32 = 300;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub default_total_pages: u32,
    pub default_genre: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.nextread`.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".nextread"))
}

/// Returns the path to `~/.nextread/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    home_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.nextread/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `NextReadConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<NextReadConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(NextReadConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(NextReadConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<NextReadConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: NextReadConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# NextRead Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_total_pages = 300          # page count used when starting a book of unknown length
# default_genre = "General"          # genre for books added without one

# [storage]
# data_dir = "/home/me/.nextread"    # Or set NEXTREAD_DATA_DIR, or pass --data-dir
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_data_dir` comes from the `--data-dir` flag (None = not specified).
pub fn resolve(config: &NextReadConfig, cli_data_dir: Option<&Path>) -> ResolvedConfig {
    // Data dir: CLI → env → config → ~/.nextread → ./.nextread
    let data_dir = cli_data_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("NEXTREAD_DATA_DIR").ok().map(PathBuf::from))
        .or_else(|| config.storage.data_dir.as_ref().map(PathBuf::from))
        .or_else(home_dir)
        .unwrap_or_else(|| PathBuf::from(".nextread"));

    let default_genre = config
        .general
        .default_genre
        .clone()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GENRE.to_string());

    ResolvedConfig {
        data_dir,
        default_total_pages: config
            .general
            .default_total_pages
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_TOTAL_PAGES),
        default_genre,
    }
}
