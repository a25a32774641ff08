//! Adversary state machine
//!
//! The ojisan walks in from a screen edge, stands by the plate eating from
//! the top of the stack, then walks back out. One wave is in flight at a time:
//! either a single adversary with a quota of 1-2 or a three-strong raid.

use rand::Rng;
use serde::Serialize;

use crate::consts::PLAYFIELD_WIDTH;

/// Walking speed while entering (px/tick)
pub const ADVERSARY_SPEED: f32 = 2.0;
/// Leaving is faster than entering
pub const LEAVING_SPEED_FACTOR: f32 = 1.5;
pub const FIRST_WAVE_DELAY_MS: u64 = 12_000;
pub const WAVE_INTERVAL_MIN_MS: u64 = 8_000;
pub const WAVE_INTERVAL_MAX_MS: u64 = 18_000;
pub const RAID_CHANCE: f64 = 0.12;
pub const RAID_SIZE: usize = 3;
pub const RAID_MIN_LANDED: usize = 4;
pub const SPAWN_MIN_LANDED: usize = 2;
pub const SPAWN_MIN_SCORE: u32 = 3;
/// Ticks between bites
pub const EAT_PERIOD_TICKS: u32 = 40;
/// First bite lands this many ticks into the period
pub const EAT_PHASE_TICKS: u32 = 20;
pub const MOUTH_FRAME_TICKS: u32 = 8;
/// Spawn distance beyond the screen edge
pub const SPAWN_MARGIN: f32 = 50.0;
/// Leaving adversaries are dropped past this distance beyond the edge
pub const PRUNE_MARGIN: f32 = 60.0;
/// Standing distance from the plate center
pub const TARGET_OFFSET: f32 = 35.0;
/// Extra offset for the third raider
pub const RAID_EXTRA_OFFSET: f32 = 40.0;
pub const VARIANT_COUNT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdversaryState {
    Entering,
    Eating,
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adversary {
    pub x: f32,
    pub target_x: f32,
    /// +1 walks right (came from the left), -1 walks left
    pub direction: f32,
    pub state: AdversaryState,
    /// Ticks spent eating
    pub elapsed: u32,
    pub eaten: u32,
    pub quota: u32,
    /// Outfit colour index
    pub variant: u8,
    mouth_frame: u32,
}

impl Adversary {
    pub fn new(from_left: bool, offset: f32, variant: u8) -> Self {
        let (x, target_x, direction) = if from_left {
            (
                -SPAWN_MARGIN - offset,
                PLAYFIELD_WIDTH / 2.0 - TARGET_OFFSET - offset,
                1.0,
            )
        } else {
            (
                PLAYFIELD_WIDTH + SPAWN_MARGIN + offset,
                PLAYFIELD_WIDTH / 2.0 + TARGET_OFFSET + offset,
                -1.0,
            )
        };
        Self {
            x,
            target_x,
            direction,
            state: AdversaryState::Entering,
            elapsed: 0,
            eaten: 0,
            quota: 1,
            variant,
            mouth_frame: 0,
        }
    }

    pub fn mouth_open(&self) -> bool {
        self.state == AdversaryState::Eating && (self.mouth_frame / MOUTH_FRAME_TICKS) % 2 == 0
    }

    /// Advance one tick. Returns true when this adversary takes a bite.
    pub fn update(&mut self) -> bool {
        let mut bite = false;

        if self.state == AdversaryState::Entering {
            self.x += self.direction * ADVERSARY_SPEED;
            let arrived = (self.direction > 0.0 && self.x >= self.target_x)
                || (self.direction < 0.0 && self.x <= self.target_x);
            if arrived {
                self.x = self.target_x;
                self.state = AdversaryState::Eating;
                self.elapsed = 0;
            }
        }

        if self.state == AdversaryState::Eating {
            self.elapsed += 1;
            self.mouth_frame += 1;
            if self.elapsed % EAT_PERIOD_TICKS == EAT_PHASE_TICKS && self.eaten < self.quota {
                self.eaten += 1;
                bite = true;
            }
            if self.eaten >= self.quota && self.elapsed > self.quota * EAT_PERIOD_TICKS + EAT_PHASE_TICKS {
                self.state = AdversaryState::Leaving;
            }
        }

        if self.state == AdversaryState::Leaving {
            self.x -= self.direction * ADVERSARY_SPEED * LEAVING_SPEED_FACTOR;
        }

        bite
    }

    pub fn is_gone(&self) -> bool {
        self.state == AdversaryState::Leaving
            && (self.x < -PRUNE_MARGIN || self.x > PLAYFIELD_WIDTH + PRUNE_MARGIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveKind {
    Single,
    Raid,
}

/// Inputs to the spawn check
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub now: u64,
    pub landed: usize,
    pub score: u32,
}

/// Result of one director tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveTick {
    /// Bites taken this tick across the wave
    pub bites: usize,
    /// The wave just finished walking off
    pub cleared: bool,
}

/// Spawn scheduler plus the active wave
#[derive(Debug, Clone, Default)]
pub struct AdversaryDirector {
    adversaries: Vec<Adversary>,
    next_wave_at: u64,
}

impl AdversaryDirector {
    pub fn new(now: u64) -> Self {
        let mut director = Self::default();
        director.reset(now);
        director
    }

    pub fn reset(&mut self, now: u64) {
        self.adversaries.clear();
        self.next_wave_at = now + FIRST_WAVE_DELAY_MS;
    }

    pub fn adversaries(&self) -> &[Adversary] {
        &self.adversaries
    }

    pub fn next_wave_at(&self) -> u64 {
        self.next_wave_at
    }

    pub fn is_active(&self) -> bool {
        !self.adversaries.is_empty()
    }

    /// Put a specific adversary on screen, bypassing the scheduler (replays, debug)
    pub fn summon(&mut self, adversary: Adversary) {
        self.adversaries.push(adversary);
    }

    /// Spawn a wave if every precondition holds; session liveness is checked
    /// by the caller.
    pub fn try_spawn<R: Rng + ?Sized>(&mut self, ctx: SpawnContext, rng: &mut R) -> Option<WaveKind> {
        if self.is_active()
            || ctx.now < self.next_wave_at
            || ctx.score < SPAWN_MIN_SCORE
            || ctx.landed < SPAWN_MIN_LANDED
        {
            return None;
        }

        let raid_roll = rng.random_bool(RAID_CHANCE);
        if raid_roll && ctx.landed >= RAID_MIN_LANDED {
            let third_from_left = rng.random_bool(0.5);
            self.adversaries.push(Adversary::new(true, 0.0, rng.random_range(0..VARIANT_COUNT)));
            self.adversaries.push(Adversary::new(false, 0.0, rng.random_range(0..VARIANT_COUNT)));
            self.adversaries.push(Adversary::new(
                third_from_left,
                RAID_EXTRA_OFFSET,
                rng.random_range(0..VARIANT_COUNT),
            ));
            log::info!("Raid! {} adversaries incoming", RAID_SIZE);
            Some(WaveKind::Raid)
        } else {
            let from_left = rng.random_bool(0.5);
            let mut adversary = Adversary::new(from_left, 0.0, rng.random_range(0..VARIANT_COUNT));
            adversary.quota = 1 + rng.random_range(0..2u32);
            log::info!(
                "Adversary entering from the {} (quota {})",
                if from_left { "left" } else { "right" },
                adversary.quota
            );
            self.adversaries.push(adversary);
            Some(WaveKind::Single)
        }
    }

    /// Move every adversary, prune the ones that left and schedule the next
    /// wave once the screen is empty again.
    pub fn update<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R) -> WaveTick {
        let mut tick = WaveTick::default();
        for adversary in &mut self.adversaries {
            if adversary.update() {
                tick.bites += 1;
            }
        }

        let before = self.adversaries.len();
        self.adversaries.retain(|a| !a.is_gone());
        if before > 0 && self.adversaries.is_empty() {
            self.next_wave_at = now + rng.random_range(WAVE_INTERVAL_MIN_MS..WAVE_INTERVAL_MAX_MS);
            tick.cleared = true;
            log::debug!("Wave cleared, next eligible at {}", self.next_wave_at);
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ready(now: u64) -> SpawnContext {
        SpawnContext {
            now,
            landed: 6,
            score: 6,
        }
    }

    #[test]
    fn test_single_adversary_lifecycle() {
        let mut adversary = Adversary::new(true, 0.0, 0);
        adversary.quota = 2;
        let mut bites = Vec::new();
        let mut states = vec![adversary.state];
        for tick in 0..1_000u32 {
            if adversary.update() {
                bites.push(tick);
            }
            if states.last() != Some(&adversary.state) {
                states.push(adversary.state);
            }
            if adversary.is_gone() {
                break;
            }
        }
        assert_eq!(
            states,
            vec![AdversaryState::Entering, AdversaryState::Eating, AdversaryState::Leaving]
        );
        assert_eq!(bites.len(), 2);
        assert_eq!(bites[1] - bites[0], EAT_PERIOD_TICKS);
        assert!(adversary.is_gone());
        assert!(adversary.x < -PRUNE_MARGIN);
    }

    #[test]
    fn test_first_bite_at_phase_tick() {
        let mut adversary = Adversary::new(false, 0.0, 1);
        adversary.x = adversary.target_x;
        // Arrival tick counts as the first eating tick
        for _ in 0..EAT_PHASE_TICKS - 1 {
            assert!(!adversary.update());
        }
        assert!(adversary.update());
        assert_eq!(adversary.eaten, 1);
    }

    #[test]
    fn test_spawn_preconditions() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut director = AdversaryDirector::new(0);

        assert_eq!(director.try_spawn(ready(FIRST_WAVE_DELAY_MS - 1), &mut rng), None);
        let low_score = SpawnContext { score: 2, ..ready(FIRST_WAVE_DELAY_MS) };
        assert_eq!(director.try_spawn(low_score, &mut rng), None);
        let thin_stack = SpawnContext { landed: 1, ..ready(FIRST_WAVE_DELAY_MS) };
        assert_eq!(director.try_spawn(thin_stack, &mut rng), None);

        assert!(director.try_spawn(ready(FIRST_WAVE_DELAY_MS), &mut rng).is_some());
        assert!(director.is_active());
        // Single wave in flight
        assert_eq!(director.try_spawn(ready(FIRST_WAVE_DELAY_MS + 1), &mut rng), None);
    }

    #[test]
    fn test_waves_are_one_or_three() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut raids = 0;
        for _ in 0..500 {
            let mut director = AdversaryDirector::new(0);
            let kind = director
                .try_spawn(ready(FIRST_WAVE_DELAY_MS), &mut rng)
                .expect("eligible");
            let count = director.adversaries().len();
            match kind {
                WaveKind::Raid => {
                    raids += 1;
                    assert_eq!(count, RAID_SIZE);
                    assert!(director.adversaries().iter().all(|a| a.quota == 1));
                    assert!(director.adversaries().iter().any(|a| a.direction > 0.0));
                    assert!(director.adversaries().iter().any(|a| a.direction < 0.0));
                }
                WaveKind::Single => {
                    assert_eq!(count, 1);
                    assert!((1..=2).contains(&director.adversaries()[0].quota));
                }
            }
        }
        assert!(raids > 0, "raids should occur at a 12% rate");
    }

    #[test]
    fn test_small_stack_never_raids() {
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..300 {
            let mut director = AdversaryDirector::new(0);
            let ctx = SpawnContext { landed: 3, ..ready(FIRST_WAVE_DELAY_MS) };
            assert_eq!(director.try_spawn(ctx, &mut rng), Some(WaveKind::Single));
        }
    }

    #[test]
    fn test_next_wave_scheduled_after_exit() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut director = AdversaryDirector::new(0);
        director
            .try_spawn(ready(FIRST_WAVE_DELAY_MS), &mut rng)
            .expect("eligible");

        let mut now = FIRST_WAVE_DELAY_MS;
        let mut cleared_at = None;
        for _ in 0..2_000 {
            now += 16;
            if director.update(now, &mut rng).cleared {
                cleared_at = Some(now);
                break;
            }
        }
        let cleared_at = cleared_at.expect("wave should leave");
        assert!(!director.is_active());
        let wait = director.next_wave_at() - cleared_at;
        assert!((WAVE_INTERVAL_MIN_MS..WAVE_INTERVAL_MAX_MS).contains(&wait));
    }
}
