//! Pancake Tower - a physics stacking game
//!
//! Core modules:
//! - `sim`: Game core (stack, carrier, stability judge, adversaries, score, session)
//! - `difficulty`: Immutable difficulty tiers
//! - `theme`: Skins (labels, palette, sounds, music, item shape, storage keys)
//! - `highscores`: Best-score persistence per skin and difficulty
//! - `settings`: Player preferences
//! - `audio`: Event-driven sound effects and background music
//! - `platform`: Browser/native platform abstraction

pub mod audio;
pub mod difficulty;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod theme;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use difficulty::{Difficulty, DifficultyProfile};
pub use highscores::{BestScoreStore, BestScores};
pub use settings::Settings;
pub use sim::{FrameView, GameOverReport, Session, SessionPhase};
pub use theme::{Theme, ThemeKind};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (60 Hz)
    pub const TICK_HZ: u32 = 60;
    /// Physics step per tick in milliseconds
    pub const TICK_MS: f32 = 1000.0 / TICK_HZ as f32;

    /// Playfield dimensions (screen space, y grows downward)
    pub const PLAYFIELD_WIDTH: f32 = 420.0;
    pub const PLAYFIELD_HEIGHT: f32 = 700.0;

    /// Plate (landing surface)
    pub const PLATE_Y: f32 = PLAYFIELD_HEIGHT - 50.0;
    pub const PLATE_BASE_WIDTH: f32 = 140.0;
    /// Collision floor is narrower than the drawn plate
    pub const FLOOR_WIDTH_RATIO: f32 = 0.85;
    pub const FLOOR_THICKNESS: f32 = 8.0;
    pub const WALL_THICKNESS: f32 = 20.0;

    /// Carrier (pan) row; items are released from here
    pub const CARRIER_Y: f32 = 80.0;
    /// Carrier turns around this far from either edge
    pub const CARRIER_EDGE_MARGIN: f32 = 80.0;

    /// Minimum wall time between accepted drops
    pub const DROP_COOLDOWN_MS: u64 = 400;
    /// Landed items are not judged until this long after landing
    pub const SETTLE_GRACE_MS: u64 = 800;
    /// Items this far below the playfield are off-stage
    pub const OFF_STAGE_MARGIN: f32 = 50.0;
    /// Delay between game over and the result screen
    pub const GAME_OVER_DISPLAY_DELAY_MS: u64 = 800;

    /// Residual motion kept when an item lands
    pub const LANDING_LINEAR_DAMP: f32 = 0.1;
    pub const LANDING_ANGULAR_DAMP: f32 = 0.05;
}

/// Fold a rotation angle into `[0, π]`, reflecting anything past π back toward 0.
#[inline]
pub fn normalize_tilt(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let folded = (angle % TAU).abs();
    if folded > PI { TAU - folded } else { folded }
}

/// Lower edge below which an item counts as off-stage
#[inline]
pub fn off_stage_y() -> f32 {
    consts::PLAYFIELD_HEIGHT + consts::OFF_STAGE_MARGIN
}
