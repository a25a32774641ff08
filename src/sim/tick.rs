//! Fixed timestep session tick
//!
//! One call advances physics by a single step and then runs every rule in a
//! fixed order: landings and scoring, carrier sweep, missed drops, stability,
//! adversary spawn and adversary updates.

use glam::Vec2;

use super::adversary::{SpawnContext, WaveKind};
use super::carrier::DropRejection;
use super::events::GameEvent;
use super::judge::{Verdict, judge, missed_drop};
use super::physics::PhysicsBackend;
use super::state::{Session, SessionPhase};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Release the item in the carrier (click/tap/space)
    pub drop: bool,
    /// Demo mode: drop whenever the carrier passes over the plate
    pub autoplay: bool,
}

impl<P: PhysicsBackend> Session<P> {
    /// Release the next item from the carrier. Returns false when the request
    /// was ignored (not live, cooling down, or an item is still falling).
    pub fn request_drop(&mut self, now: u64) -> bool {
        if self.phase != SessionPhase::Active {
            log::debug!("Drop ignored: {:?}", DropRejection::Inactive);
            return false;
        }
        if let Err(reason) = self.drops.admit(now, &self.stack) {
            log::debug!("Drop ignored: {reason:?}");
            return false;
        }

        let size = self.drops.accept(now, &self.profile, &mut self.rng);
        let item = self.stack.spawn(
            &mut self.world,
            Vec2::new(self.carrier.x, CARRIER_Y),
            size,
            &self.theme.item_shape,
            &self.profile,
            now,
        );
        self.events.push(GameEvent::Dropped { item });
        true
    }

    /// Advance the session by one fixed step at wall time `now`
    pub fn tick(&mut self, input: &TickInput, now: u64) {
        if self.phase != SessionPhase::Active {
            return;
        }

        if input.drop || (input.autoplay && self.autoplay_wants_drop()) {
            self.request_drop(now);
        }

        self.ticks += 1;
        self.world.step(TICK_MS);

        let contacts = self.world.drain_contacts();
        for item in self.stack.on_contacts(&contacts, &mut self.world, now) {
            self.events.push(GameEvent::Landed { item });
            if self.ledger.on_landed(item) {
                self.events.push(GameEvent::Scored {
                    item,
                    score: self.ledger.score(),
                });
            }
        }
        self.stack.sync(&self.world);

        self.carrier.advance(&self.profile, self.ledger.score());

        if let Some(item) = missed_drop(&self.stack) {
            self.stack.remove(&mut self.world, item);
            log::debug!("Item {} missed the stack", item.0);
            self.events.push(GameEvent::Missed { item });
        }

        let verdict = judge(&self.stack, &self.profile, now);
        if verdict.is_failure() {
            self.finish(verdict, now);
            return;
        }

        self.update_adversaries(now);
    }

    fn update_adversaries(&mut self, now: u64) {
        let ctx = SpawnContext {
            now,
            landed: self.stack.landed_count(),
            score: self.ledger.score(),
        };
        if let Some(kind) = self.director.try_spawn(ctx, &mut self.rng) {
            self.events.push(GameEvent::AdversaryAppeared {
                count: self.director.adversaries().len(),
                raid: kind == WaveKind::Raid,
            });
        }

        let wave = self.director.update(now, &mut self.rng);
        for _ in 0..wave.bites {
            // A bite on an empty stack still counts against the quota
            let Some(item) = self.stack.topmost_landed() else {
                log::debug!("Adversary bit an empty plate");
                continue;
            };
            self.stack.remove(&mut self.world, item);
            self.ledger.on_consumed();
            self.events.push(GameEvent::Consumed {
                item,
                score: self.ledger.score(),
            });
        }
        if wave.cleared {
            self.events.push(GameEvent::WaveCleared);
        }
    }

    fn finish(&mut self, verdict: Verdict, now: u64) {
        self.phase = SessionPhase::Terminal;
        self.terminal_at = Some(now);
        let key = self.theme.best_key(self.difficulty);
        self.outcome = self.ledger.record_best(self.store.as_mut(), &key);

        let score = self.ledger.score();
        let new_record = self.outcome.is_some_and(|o| o.improved) && score > 0;
        log::info!(
            "Game over ({verdict:?}): score={score} best={} new_record={new_record}",
            self.outcome.map(|o| o.best).unwrap_or(score)
        );
        self.events.push(GameEvent::GameOver { score, new_record });
    }

    fn autoplay_wants_drop(&self) -> bool {
        self.stack.in_flight().is_none()
            && (self.carrier.x - PLAYFIELD_WIDTH / 2.0).abs() <= self.carrier.speed
    }
}
