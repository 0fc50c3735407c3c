//! High-score persistence
//!
//! One integer, one fixed file. The engine never sees this; the play loop
//! loads it at startup and saves whenever the best score improves.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "high_score.json";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// Reads and writes the persistent best score
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `$HOME/.local/share/snake-tui/high_score.json`,
    /// or the working directory when `HOME` is unset
    pub fn default_path() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => Path::new(&home)
                .join(".local/share/snake-tui")
                .join(FILE_NAME),
            None => PathBuf::from(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved best score. A missing or unreadable file is not an
    /// error: the game starts with a best of zero.
    pub fn load(&self) -> u32 {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(err) => {
                log::warn!("could not read {}: {err}", self.path.display());
                return 0;
            }
        };

        match serde_json::from_str::<HighScoreRecord>(&json) {
            Ok(record) => record.high_score,
            Err(err) => {
                log::warn!("ignoring malformed {}: {err}", self.path.display());
                0
            }
        }
    }

    /// Persist a new best score, creating parent directories as needed
    pub fn save(&self, high_score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(&HighScoreRecord { high_score })
            .context("Failed to serialize high score")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        log::debug!("saved high score {high_score} to {}", self.path.display());
        Ok(())
    }
}
