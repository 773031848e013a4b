//! Save-data persistence port
//!
//! The core never touches saved progress. A session records the result of every
//! finished game through a [`SaveStore`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Per-level progress, indexed by level number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default)]
    pub unlocked: Vec<bool>,
    #[serde(default)]
    pub high_scores: Vec<u32>,
    #[serde(default)]
    pub stars: Vec<u32>,
}

impl SaveData {
    /// The first level is always unlocked
    pub fn is_unlocked(&self, level: usize) -> bool {
        level == 0 || self.unlocked.get(level).copied().unwrap_or(false)
    }

    pub fn high_score(&self, level: usize) -> u32 {
        self.high_scores.get(level).copied().unwrap_or(0)
    }

    pub fn stars_for(&self, level: usize) -> u32 {
        self.stars.get(level).copied().unwrap_or(0)
    }

    /// Keep the best score and stars for `level`; a win unlocks the next level.
    /// Returns true if anything changed.
    pub fn record(&mut self, level: usize, score: u32, stars: u32, won: bool) -> bool {
        let mut changed = false;
        if score > self.high_score(level) {
            set_at(&mut self.high_scores, level, score);
            changed = true;
        }
        if stars > self.stars_for(level) {
            set_at(&mut self.stars, level, stars);
            changed = true;
        }
        if !self.is_unlocked(level) {
            set_at(&mut self.unlocked, level, true);
            changed = true;
        }
        if won && !self.is_unlocked(level + 1) {
            set_at(&mut self.unlocked, level + 1, true);
            changed = true;
        }
        changed
    }
}

fn set_at<T: Default + Clone>(v: &mut Vec<T>, index: usize, value: T) {
    if v.len() <= index {
        v.resize(index + 1, T::default());
    }
    v[index] = value;
}

pub trait SaveStore {
    fn load(&mut self) -> Result<SaveData>;
    fn save(&mut self, data: &SaveData) -> Result<()>;
}

/// Keeps progress for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: SaveData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }
}

impl SaveStore for MemoryStore {
    fn load(&mut self) -> Result<SaveData> {
        Ok(self.data.clone())
    }

    fn save(&mut self, data: &SaveData) -> Result<()> {
        self.data = data.clone();
        Ok(())
    }
}

/// One JSON document on disk. A missing file loads as empty progress.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for JsonFileStore {
    fn load(&mut self) -> Result<SaveData> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SaveData::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read save file {}", self.path.display()))
            }
        };
        serde_json::from_str(&text)
            .with_context(|| format!("corrupt save file {}", self.path.display()))
    }

    fn save(&mut self, data: &SaveData) -> Result<()> {
        let json = serde_json::to_vec_pretty(data).context("failed to encode save data")?;
        // Write a sibling file, then rename it over the target.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dotmatch-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_record_keeps_best() {
        let mut data = SaveData::default();
        assert!(data.is_unlocked(0));
        assert!(!data.is_unlocked(1));

        assert!(data.record(0, 1200, 2, false));
        assert_eq!(data.high_score(0), 1200);
        assert_eq!(data.stars_for(0), 2);
        assert!(!data.is_unlocked(1));

        assert!(!data.record(0, 900, 1, false));
        assert_eq!(data.high_score(0), 1200);

        assert!(data.record(0, 100, 0, true));
        assert!(data.is_unlocked(1));
        assert_eq!(data.high_score(2), 0);
    }

    #[test]
    fn test_record_unlocks_played_level() {
        let mut data = SaveData::default();
        data.record(3, 0, 0, false);
        assert!(data.is_unlocked(3));
        assert_eq!(data.unlocked.len(), 4);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        let mut data = store.load().unwrap();
        data.record(0, 50, 1, true);
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);
        assert_eq!(store.data().high_score(0), 50);
    }

    #[test]
    fn test_json_file_store() {
        let path = temp_path("save");
        let _ = fs::remove_file(&path);
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.load().unwrap(), SaveData::default());

        let mut data = SaveData::default();
        data.record(1, 777, 3, true);
        store.save(&data).unwrap();

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), data);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(format!("{:#}", err).contains("corrupt save file"));
        let _ = fs::remove_file(&path);
    }
}
