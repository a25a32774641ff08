//! Player preferences
//!
//! Persisted separately from best scores: LocalStorage in the browser, a JSON
//! file on native builds.

use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use crate::difficulty::Difficulty;
#[cfg(not(target_arch = "wasm32"))]
use crate::highscores::StoreError;
use crate::theme::ThemeKind;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tier preselected on the start screen
    pub difficulty: Difficulty,
    pub theme: ThemeKind,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
    /// Play the background loop while a session is live
    pub bgm: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            theme: ThemeKind::Pancake,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.6,
            muted: false,
            bgm: true,
        }
    }
}

impl Settings {
    /// Effective sound effect gain (respects mute)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Effective music gain (respects mute and the bgm toggle)
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted || !self.bgm {
            0.0
        } else {
            (self.master_volume * self.music_volume).clamp(0.0, 1.0)
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "pancake_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &Path) -> Self {
        match Self::read_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(StoreError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Ignoring settings at {}: {err}", path.display());
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read_from(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save settings as JSON
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_silences_everything() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert_eq!(settings.effective_music_volume(), 0.0);
    }

    #[test]
    fn test_bgm_toggle_only_affects_music() {
        let settings = Settings {
            bgm: false,
            ..Settings::default()
        };
        assert!(settings.effective_sfx_volume() > 0.0);
        assert_eq!(settings.effective_music_volume(), 0.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"hard"}"#).expect("parse");
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.theme, ThemeKind::Pancake);
        assert!(settings.bgm);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("pancake-settings-{}.json", std::process::id()));
        let settings = Settings {
            theme: ThemeKind::Unko,
            muted: true,
            ..Settings::default()
        };
        settings.save_to(&path).expect("save");
        assert_eq!(Settings::load_from(&path), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let path = std::env::temp_dir()
            .join(format!("pancake-settings-missing-{}", std::process::id()))
            .join("settings.json");
        let err = Settings::default().save_to(&path).expect_err("parent does not exist");
        assert!(matches!(err, StoreError::Io(_)));
        // Nothing was written, so loading falls back to defaults
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
