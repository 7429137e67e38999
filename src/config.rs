use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{MemoError, Result, Validator, MAX_BODY_LEN, MAX_TITLE_LEN};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the note collection
    pub notes_path: PathBuf,

    /// Directory where search exports are written
    pub export_dir: PathBuf,

    /// Maximum title length in characters
    pub max_title_len: usize,

    /// Maximum body length in characters
    pub max_body_len: usize,

    /// Width of the body excerpt shown with search results
    pub snippet_width: usize,

    /// Default number of rows in the stats breakdown (0 means all)
    pub stats_limit: usize,

    /// Display width of the title column in listings
    pub list_title_width: usize,

    /// Address the web UI binds to
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        let notes_path = ProjectDirs::from("", "", "jsonmemo")
            .map(|dirs| dirs.data_dir().join("notes.json"))
            .unwrap_or_else(|| PathBuf::from("data").join("notes.json"));

        Config {
            notes_path,
            export_dir: PathBuf::from("."),
            max_title_len: MAX_TITLE_LEN,
            max_body_len: MAX_BODY_LEN,
            snippet_width: 80,
            stats_limit: 10,
            list_title_width: 22,
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Config {
    /// Reads a JSON config file; fields it omits keep their defaults.
    /// Without a path the defaults are returned as-is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        debug!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| MemoError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|e| MemoError::ConfigError {
            message: format!("cannot parse {}: {}", path.display(), e),
        })?;

        if config.max_title_len == 0 || config.max_body_len == 0 {
            return Err(MemoError::ConfigError {
                message: "length limits must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.max_title_len, self.max_body_len)
    }
}
