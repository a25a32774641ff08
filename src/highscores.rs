//! Best-score persistence
//!
//! One best score per skin and difficulty tier, addressed by a key such as
//! `pancake_best_normal` (see `Theme::best_key`). Backends: in-memory, a JSON
//! file on native targets and LocalStorage in the browser.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Storage for the best score under each key
pub trait BestScoreStore {
    fn best_score(&self, key: &str) -> u32;
    fn set_best_score(&mut self, key: &str, score: u32);
}

/// Best scores by storage key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScores {
    pub entries: BTreeMap<String, u32>,
}

impl BestScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BestScoreStore for BestScores {
    fn best_score(&self, key: &str) -> u32 {
        self.entries.get(key).copied().unwrap_or(0)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        self.entries.insert(key.to_string(), score);
    }
}

/// Errors from file-backed storage
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "storage io error: {err}"),
            StoreError::Json(err) => write!(f, "storage format error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json(err)
    }
}

/// Best scores mirrored to a JSON file after every write
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    scores: BestScores,
}

impl FileStore {
    /// Open a store, starting fresh when the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let scores = match Self::read(&path) {
            Ok(scores) => {
                log::info!("Loaded best scores from {}", path.display());
                scores
            }
            Err(StoreError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No best scores found, starting fresh");
                BestScores::new()
            }
            Err(err) => {
                log::warn!("Ignoring best scores at {}: {err}", path.display());
                BestScores::new()
            }
        };
        Self { path, scores }
    }

    fn read(path: &Path) -> Result<BestScores, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.scores)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn scores(&self) -> &BestScores {
        &self.scores
    }
}

impl BestScoreStore for FileStore {
    fn best_score(&self, key: &str) -> u32 {
        self.scores.best_score(key)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        self.scores.set_best_score(key, score);
        match self.save() {
            Ok(()) => log::info!("Best score saved ({key} = {score})"),
            Err(err) => log::warn!("Failed to save best score: {err}"),
        }
    }
}

/// Browser LocalStorage, one item per key
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStorageStore {
    fn best_score(&self, key: &str) -> u32 {
        Self::storage()
            .and_then(|s| s.get_item(key).ok().flatten())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, &score.to_string()).is_err() {
                log::warn!("Failed to save best score ({key})");
            }
        }
    }
}
