use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gridblast_engine::HighScoreStore;
use serde::{Deserialize, Serialize};

use crate::util;

/// On-disk form of the high score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    pub high_score: u64,
    /// When the high score was last raised (ISO 8601 format)
    pub updated_at: Option<DateTime<Utc>>,
}

/// [`HighScoreStore`] backed by a JSON file.
///
/// Updates are kept in memory until [`Self::save`] is called.
#[derive(Debug, Clone)]
pub struct HighScoreFile {
    path: PathBuf,
    record: HighScoreRecord,
    dirty: bool,
}

impl HighScoreFile {
    /// Loads the high score from `path`, starting from zero if the file does
    /// not exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let record = if path.exists() {
            let record: HighScoreRecord = util::read_json_file("high score", path)?;
            eprintln!("Loaded high score {} from {}", record.high_score, path.display());
            record
        } else {
            HighScoreRecord::default()
        };
        Ok(Self {
            path: path.to_owned(),
            record,
            dirty: false,
        })
    }

    /// Writes the file if the high score changed since it was loaded.
    pub fn save(&mut self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        util::write_json_file(&self.record, &self.path)?;
        eprintln!(
            "Saved high score {} to {}",
            self.record.high_score,
            self.path.display()
        );
        self.dirty = false;
        Ok(())
    }
}

impl HighScoreStore for HighScoreFile {
    fn high_score(&self) -> u64 {
        self.record.high_score
    }

    fn set_high_score(&mut self, score: u64) {
        self.record.high_score = score;
        self.record.updated_at = Some(Utc::now());
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("gridblast-test-{}", process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_starts_at_zero() {
        let path = temp_path("missing/high_score.json");
        let file = HighScoreFile::load(&path).unwrap();
        assert_eq!(file.high_score(), 0);
        assert_eq!(file.record.updated_at, None);
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("reload/high_score.json");
        let mut file = HighScoreFile::load(&path).unwrap();
        file.set_high_score(1234);
        file.save().unwrap();

        let reloaded = HighScoreFile::load(&path).unwrap();
        assert_eq!(reloaded.high_score(), 1234);
        assert!(reloaded.record.updated_at.is_some());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unchanged_file_is_not_written() {
        let path = temp_path("unchanged/high_score.json");
        let mut file = HighScoreFile::load(&path).unwrap();
        file.save().unwrap();
        assert!(!path.exists());
    }
}
