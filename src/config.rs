use crate::domain::Identifier;
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Represents the complete configuration for pkg-release.
///
/// Contains the locations of the persisted files, pre-release defaults and logging options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub prerelease: PrereleaseConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".release/prerelease.json")
}

fn default_history_file() -> PathBuf {
    PathBuf::from(".release/history.json")
}

fn default_stage() -> String {
    "beta".to_string()
}

fn default_tag_pattern() -> String {
    "{package}@{version}".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locations of the pre-release state file and the release ledger,
/// relative to the repository root unless absolute.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            state_file: default_state_file(),
            history_file: default_history_file(),
        }
    }
}

/// Pre-release behaviour
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrereleaseConfig {
    /// Stage used when a caller does not name one
    #[serde(default = "default_stage")]
    pub default_stage: String,
}

impl Default for PrereleaseConfig {
    fn default() -> Self {
        PrereleaseConfig {
            default_stage: default_stage(),
        }
    }
}

/// Release behaviour
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Tag name template; `{package}` and `{version}` are substituted
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_pattern: default_tag_pattern(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
    /// One of off, error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

/// Concrete file locations for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePaths {
    pub state_file: PathBuf,
    pub history_file: PathBuf,
}

impl Config {
    /// Join the configured paths onto `root`
    pub fn resolve(&self, root: &Path) -> ReleasePaths {
        ReleasePaths {
            state_file: root.join(&self.paths.state_file),
            history_file: root.join(&self.paths.history_file),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log.level)
            .map_err(|_| ReleaseError::config(format!("Invalid log level: '{}'", self.log.level)))
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        match Identifier::parse(&self.prerelease.default_stage) {
            Ok(Identifier::AlphaNumeric(_)) => {}
            _ => {
                return Err(ReleaseError::config(format!(
                    "Invalid default pre-release stage: '{}'",
                    self.prerelease.default_stage
                )))
            }
        }

        if !self.release.tag_pattern.contains("{version}") {
            return Err(ReleaseError::config(format!(
                "Tag pattern must contain {{version}} placeholder: '{}'",
                self.release.tag_pattern
            )));
        }

        self.log_level()?;
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `pkg-release/release.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join("pkg-release").join(CONFIG_FILE_NAME);
        if user_path.exists() {
            user_path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| ReleaseError::io(&path, e))?;
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}
