//! Drop controller
//!
//! The carrier (pan) sweeps back and forth above the plate. Drops are admitted
//! only while the session is live, outside the cooldown window and when no
//! earlier item is still in flight.

use rand::Rng;
use serde::Serialize;

use super::stack::StackModel;
use crate::consts::*;
use crate::difficulty::DifficultyProfile;

/// Horizontal sweeper that releases items
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Carrier {
    pub x: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    /// px per tick
    pub speed: f32,
}

impl Carrier {
    pub fn new(profile: &DifficultyProfile) -> Self {
        Self {
            x: PLAYFIELD_WIDTH / 2.0,
            direction: 1.0,
            speed: profile.base_pan_speed,
        }
    }

    /// Advance one tick. Speed is a pure function of score, not accumulated.
    pub fn advance(&mut self, profile: &DifficultyProfile, score: u32) {
        self.speed = profile.pan_speed(score);
        self.x += self.direction * self.speed;
        if self.x > PLAYFIELD_WIDTH - CARRIER_EDGE_MARGIN {
            self.direction = -1.0;
        }
        if self.x < CARRIER_EDGE_MARGIN {
            self.direction = 1.0;
        }
    }
}

/// Why a drop request was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    Inactive,
    Cooldown,
    InFlight,
}

/// Drop admission and size preview
#[derive(Debug, Clone, PartialEq)]
pub struct DropController {
    last_drop_at: Option<u64>,
    /// Size factor of the item waiting in the carrier
    next_size: f32,
}

impl DropController {
    pub fn new<R: Rng + ?Sized>(profile: &DifficultyProfile, rng: &mut R) -> Self {
        Self {
            last_drop_at: None,
            next_size: profile.sample_size(rng),
        }
    }

    pub fn next_size(&self) -> f32 {
        self.next_size
    }

    pub fn last_drop_at(&self) -> Option<u64> {
        self.last_drop_at
    }

    /// Check the timing and in-flight preconditions; session liveness is
    /// checked by the caller.
    pub fn admit(&self, now: u64, stack: &StackModel) -> Result<(), DropRejection> {
        if let Some(last) = self.last_drop_at {
            if now.saturating_sub(last) < DROP_COOLDOWN_MS {
                return Err(DropRejection::Cooldown);
            }
        }
        if stack.in_flight().is_some() {
            return Err(DropRejection::InFlight);
        }
        Ok(())
    }

    /// Commit an admitted drop: returns the size to use and rolls the next preview
    pub fn accept<R: Rng + ?Sized>(&mut self, now: u64, profile: &DifficultyProfile, rng: &mut R) -> f32 {
        self.last_drop_at = Some(now);
        let size = self.next_size;
        self.next_size = profile.sample_size(rng);
        size
    }
}
