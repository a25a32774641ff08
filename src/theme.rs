//! Presentation skins
//!
//! Both skins run the same engine. A theme swaps labels, colours, the sound
//! recipes and music track handed to the audio layer, the collision box of a
//! dropped item and the key prefix its best scores are stored under.

use serde::{Deserialize, Serialize};

use crate::audio::Note::*;
use crate::audio::{Arpeggio, BgmTrack, Note, NoiseBurst, SoundPalette, Tone, Waveform};
use crate::difficulty::Difficulty;
use crate::sim::physics::ItemShape;

/// Available skins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Pancake,
    Unko,
}

impl ThemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeKind::Pancake => "pancake",
            ThemeKind::Unko => "unko",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pancake" => Some(ThemeKind::Pancake),
            "unko" => Some(ThemeKind::Unko),
            _ => None,
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            ThemeKind::Pancake => Theme {
                kind: *self,
                title: "パンケーキタワー",
                item_label: "pancake",
                adversary_label: "ojisan",
                unit: "枚",
                palette: Palette {
                    background: 0xF5A623,
                    item_fill: 0xE8A838,
                    item_outline: 0xC4852A,
                    item_inner: 0xC47A20,
                    plate: 0xFAFAFA,
                    carrier: 0x3A3A3A,
                },
                sounds: PANCAKE_SOUNDS,
                music: PANCAKE_BGM,
                // Flat disc: full-height box with soft corners
                item_shape: ItemShape {
                    half_width: 55.0,
                    half_height: 12.0,
                    chamfer_per_size: 12.0 * 0.6,
                    max_chamfer: 6.0,
                },
                storage_prefix: "pancake_best_",
                difficulty_labels: DIFFICULTY_LABELS,
            },
            ThemeKind::Unko => Theme {
                kind: *self,
                title: "うんこタワー",
                item_label: "unko",
                adversary_label: "ojisan",
                unit: "個",
                palette: Palette {
                    background: 0x9FD3E6,
                    item_fill: 0x8B5A2B,
                    item_outline: 0x5C3A1A,
                    item_inner: 0x6F4521,
                    plate: 0xFFFFFF,
                    carrier: 0x4A4A4A,
                },
                sounds: UNKO_SOUNDS,
                music: UNKO_BGM,
                // Drawn round (35 x 30 radii) but collides as a wide flat box
                item_shape: ItemShape {
                    half_width: 35.0,
                    half_height: 30.0 * 0.6,
                    chamfer_per_size: 30.0 * 0.3,
                    max_chamfer: 5.0,
                },
                storage_prefix: "unko_best_",
                difficulty_labels: DIFFICULTY_LABELS,
            },
        }
    }
}

const DIFFICULTY_LABELS: [&str; 3] = ["かんたん", "ふつう", "むずかしい"];

const PANCAKE_SOUNDS: SoundPalette = SoundPalette {
    drop: Tone {
        wave: Waveform::Sine,
        start_hz: 600.0,
        ramps: &[(200.0, 0.15)],
        level: 0.3,
        length: 0.2,
    },
    land: NoiseBurst {
        length: 0.12,
        decay_power: 6,
        cutoff_hz: 300.0,
        level: 0.5,
    },
    score: Tone {
        wave: Waveform::Sine,
        start_hz: 800.0,
        ramps: &[(1200.0, 0.08)],
        level: 0.2,
        length: 0.12,
    },
    game_over: Arpeggio {
        wave: Waveform::Triangle,
        notes: &[400.0, 350.0, 300.0, 200.0],
        spacing: 0.18,
        level: 0.25,
        fade: 0.18,
        length: 0.2,
    },
};

const UNKO_SOUNDS: SoundPalette = SoundPalette {
    drop: Tone {
        wave: Waveform::Sine,
        start_hz: 300.0,
        ramps: &[(80.0, 0.2)],
        level: 0.3,
        length: 0.25,
    },
    // Splat
    land: NoiseBurst {
        length: 0.15,
        decay_power: 4,
        cutoff_hz: 400.0,
        level: 0.5,
    },
    // Bloop up then down
    score: Tone {
        wave: Waveform::Square,
        start_hz: 150.0,
        ramps: &[(300.0, 0.05), (100.0, 0.1)],
        level: 0.15,
        length: 0.12,
    },
    game_over: Arpeggio {
        wave: Waveform::Sawtooth,
        notes: &[200.0, 180.0, 150.0, 100.0],
        spacing: 0.2,
        level: 0.2,
        fade: 0.2,
        length: 0.22,
    },
};

const PANCAKE_MELODY: [Note; 32] = [
    E4, G4, A4, G4, E4, G4, C5, A4, //
    G4, A4, C5, D5, C5, A4, G4, E4, //
    D4, E4, G4, A4, G4, E4, D4, C4, //
    D4, G4, E4, G4, A4, G4, E4, G4,
];

const PANCAKE_BASS: [Note; 32] = [
    C4, C4, C4, C4, A4, A4, A4, A4, //
    G4, G4, G4, G4, C4, C4, C4, C4, //
    D4, D4, D4, D4, E4, E4, E4, E4, //
    D4, D4, D4, D4, G4, G4, G4, G4,
];

const PANCAKE_BGM: BgmTrack = BgmTrack {
    bpm: 140.0,
    melody: &PANCAKE_MELODY,
    bass: &PANCAKE_BASS,
    melody_level: 0.06,
    bass_level: 0.05,
};

const UNKO_MELODY: [Note; 32] = [
    C4, E4, G4, E4, C4, E4, G4, C5, //
    B4, G4, E4, G4, B4, G4, E4, C4, //
    F4, A4, C5, A4, F4, A4, C5, A4, //
    G4, E4, C4, E4, G4, E4, D4, C4,
];

const UNKO_BASS: [Note; 32] = [
    C4, C4, C4, C4, C4, C4, C4, C4, //
    G4, G4, G4, G4, G4, G4, G4, G4, //
    F4, F4, F4, F4, F4, F4, F4, F4, //
    G4, G4, G4, G4, G4, G4, G4, G4,
];

const UNKO_BGM: BgmTrack = BgmTrack {
    bpm: 150.0,
    melody: &UNKO_MELODY,
    bass: &UNKO_BASS,
    melody_level: 0.05,
    bass_level: 0.04,
};

/// Colours as 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: u32,
    pub item_fill: u32,
    pub item_outline: u32,
    pub item_inner: u32,
    pub plate: u32,
    pub carrier: u32,
}

/// Presentation configuration for one skin
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub kind: ThemeKind,
    pub title: &'static str,
    pub item_label: &'static str,
    pub adversary_label: &'static str,
    /// Counter word shown after scores
    pub unit: &'static str,
    pub palette: Palette,
    pub sounds: SoundPalette,
    pub music: BgmTrack,
    pub item_shape: ItemShape,
    /// Best scores live under `<prefix><tier>`
    pub storage_prefix: &'static str,
    /// Indexed Easy, Normal, Hard
    difficulty_labels: [&'static str; 3],
}

impl Theme {
    pub fn difficulty_label(&self, difficulty: Difficulty) -> &'static str {
        match difficulty {
            Difficulty::Easy => self.difficulty_labels[0],
            Difficulty::Normal => self.difficulty_labels[1],
            Difficulty::Hard => self.difficulty_labels[2],
        }
    }

    /// Storage key of the best score for one tier, e.g. `unko_best_hard`
    pub fn best_key(&self, difficulty: Difficulty) -> String {
        format!("{}{}", self.storage_prefix, difficulty.as_str())
    }

    /// "BEST: 12枚 (ふつう)" line; empty until a best exists
    pub fn best_label(&self, best: u32, difficulty: Difficulty) -> String {
        if best == 0 {
            return String::new();
        }
        format!(
            "BEST: {}{} ({})",
            best,
            self.unit,
            self.difficulty_label(difficulty)
        )
    }
}

impl Default for Theme {
    fn default() -> Self {
        ThemeKind::default().theme()
    }
}
