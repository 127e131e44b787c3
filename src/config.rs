//! Configuration file handling
//!
//! Settings are read from `config.toml` in the platform config directory
//! (e.g. `~/.config/cardwise/config.toml`). A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::DEFAULT_DECK_COLOR;

const APP_DIR: &str = "cardwise";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine data directory")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the database lives (default: platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Database file name inside `data_dir`
    pub database_file: String,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Color for decks created without one
    pub default_deck_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "cardwise.db".to_string(),
            log_level: "warn".to_string(),
            default_deck_color: DEFAULT_DECK_COLOR.to_string(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// An explicit path must exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join(APP_DIR))
                .ok_or(ConfigError::DataDirNotFound),
        }
    }

    /// Full path of the database file
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.database_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            data_dir = "/tmp/cards"
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/cards")));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.database_file, "cardwise.db");
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/cards/cardwise.db")
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "database_file = \"review.db\"\ndefault_deck_color = \"#f59e0b\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.database_file, "review.db");
        assert_eq!(config.default_deck_color, "#f59e0b");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(temp.path().join("nope.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "log_level = [").unwrap();

        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
