//! Difficulty tiers
//!
//! Each tier is a fixed record selected before a session starts. Nothing
//! mutates a profile at runtime; speed and size curves are pure functions of
//! the profile and the current score.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::PLATE_BASE_WIDTH;

/// Named difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Stable key used for storage and the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Tuning record for this tier
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                tilt_threshold: 1.0, // ~57 degrees
                base_pan_speed: 0.8,
                pan_speed_inc: 0.02,
                max_pan_speed: 2.2,
                friction: 1.5,
                friction_static: 3.0,
                size_variance: 0.10,
                size_base: 0.95,
                plate_width: 1.5,
                gravity: 0.8,
            },
            Difficulty::Normal => DifficultyProfile {
                tilt_threshold: 0.75, // ~43 degrees
                base_pan_speed: 1.3,
                pan_speed_inc: 0.03,
                max_pan_speed: 3.5,
                friction: 1.2,
                friction_static: 2.0,
                size_variance: 0.15,
                size_base: 0.90,
                plate_width: 1.2,
                gravity: 1.0,
            },
            Difficulty::Hard => DifficultyProfile {
                tilt_threshold: 0.55, // ~31 degrees
                base_pan_speed: 2.0,
                pan_speed_inc: 0.06,
                max_pan_speed: 5.0,
                friction: 0.8,
                friction_static: 1.2,
                size_variance: 0.30,
                size_base: 0.80,
                plate_width: 0.85,
                gravity: 1.4,
            },
        }
    }
}

/// Numeric tuning for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Normalized tilt (radians) at which a settled item topples the tower
    pub tilt_threshold: f32,
    /// Carrier speed at score 0 (px/tick)
    pub base_pan_speed: f32,
    /// Carrier speed added per point
    pub pan_speed_inc: f32,
    /// Carrier speed cap
    pub max_pan_speed: f32,
    pub friction: f32,
    pub friction_static: f32,
    /// Width of the size-factor window above `size_base`
    pub size_variance: f32,
    pub size_base: f32,
    /// Plate width multiplier
    pub plate_width: f32,
    /// Gravity multiplier
    pub gravity: f32,
}

impl DifficultyProfile {
    /// Carrier speed for a score; recomputed every tick, never compounded
    pub fn pan_speed(&self, score: u32) -> f32 {
        (self.base_pan_speed + score as f32 * self.pan_speed_inc).min(self.max_pan_speed)
    }

    /// Draw a size factor in `[size_base, size_base + size_variance)`
    pub fn sample_size<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.size_base + rng.random::<f32>() * self.size_variance
    }

    /// Drawn plate width in pixels
    pub fn plate_width_px(&self) -> f32 {
        PLATE_BASE_WIDTH * self.plate_width
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Difficulty::default().profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_pan_speed_is_clamped() {
        let profile = Difficulty::Normal.profile();
        assert!((profile.pan_speed(0) - 1.3).abs() < 1e-6);
        assert!((profile.pan_speed(10) - 1.6).abs() < 1e-5);
        assert_eq!(profile.pan_speed(1_000), profile.max_pan_speed);
    }

    #[test]
    fn test_sample_size_stays_in_window() {
        let mut rng = Pcg32::seed_from_u64(7);
        for difficulty in Difficulty::ALL {
            let profile = difficulty.profile();
            for _ in 0..500 {
                let size = profile.sample_size(&mut rng);
                assert!(size >= profile.size_base);
                assert!(size < profile.size_base + profile.size_variance);
            }
        }
    }

    #[test]
    fn test_round_trip_names() {
        for difficulty in Difficulty::ALL {
            assert_eq!(Difficulty::from_str(difficulty.as_str()), Some(difficulty));
        }
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_harder_tiers_are_less_forgiving() {
        let easy = Difficulty::Easy.profile();
        let normal = Difficulty::Normal.profile();
        let hard = Difficulty::Hard.profile();
        assert!(easy.tilt_threshold > normal.tilt_threshold);
        assert!(normal.tilt_threshold > hard.tilt_threshold);
        assert!(easy.plate_width_px() > hard.plate_width_px());
    }
}
