//! Session state
//!
//! The session is the single owner of all mutable game state. Components
//! receive borrows from it and report back through return values; only the
//! session mutates across component boundaries.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::adversary::{AdversaryDirector, AdversaryState};
use super::carrier::{Carrier, DropController};
use super::events::{EventBus, GameEvent};
use super::physics::{Arena, PhysicsBackend, RapierWorld, build_arena};
use super::score::{BestOutcome, ScoreLedger};
use super::stack::{ItemId, StackModel};
use crate::consts::GAME_OVER_DISPLAY_DELAY_MS;
use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::highscores::BestScoreStore;
use crate::theme::{Theme, ThemeKind};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// Start screen, nothing simulated
    Idle,
    Active,
    /// Run ended; state is frozen until the next start
    Terminal,
}

/// Result screen contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOverReport {
    pub score: u32,
    pub best: u32,
    pub new_record: bool,
    pub best_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub half_width: f32,
    pub half_height: f32,
    pub size: f32,
    pub landed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdversaryView {
    pub x: f32,
    pub direction: f32,
    pub state: AdversaryState,
    pub mouth_open: bool,
    pub variant: u8,
}

/// Read-only snapshot handed to the renderer each frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub phase: SessionPhase,
    pub difficulty: Difficulty,
    pub theme: ThemeKind,
    pub score: u32,
    pub best: u32,
    pub carrier: Carrier,
    /// Size of the item waiting in the carrier; hidden while one is falling
    pub preview_size: Option<f32>,
    pub plate_width: f32,
    pub items: Vec<ItemView>,
    pub adversaries: Vec<AdversaryView>,
}

/// One game from start to game over, and the restarts after it
pub struct Session<P: PhysicsBackend = RapierWorld> {
    pub(super) world: P,
    pub(super) difficulty: Difficulty,
    pub(super) profile: DifficultyProfile,
    pub(super) theme: Theme,
    pub(super) seed: u64,
    pub(super) rng: Pcg32,
    pub(super) phase: SessionPhase,
    pub(super) stack: StackModel,
    pub(super) carrier: Carrier,
    pub(super) drops: DropController,
    pub(super) director: AdversaryDirector,
    pub(super) ledger: ScoreLedger,
    pub(super) events: EventBus,
    pub(super) store: Box<dyn BestScoreStore>,
    pub(super) arena: Option<Arena>,
    pub(super) terminal_at: Option<u64>,
    pub(super) outcome: Option<BestOutcome>,
    pub(super) ticks: u64,
}

impl<P: PhysicsBackend> Session<P> {
    /// Create an idle session; call `start` to begin playing
    pub fn new(world: P, store: Box<dyn BestScoreStore>, theme: ThemeKind, seed: u64) -> Self {
        let difficulty = Difficulty::default();
        let profile = difficulty.profile();
        let mut rng = Pcg32::seed_from_u64(seed);
        let drops = DropController::new(&profile, &mut rng);
        Self {
            world,
            difficulty,
            profile,
            theme: theme.theme(),
            seed,
            rng,
            phase: SessionPhase::Idle,
            stack: StackModel::new(),
            carrier: Carrier::new(&profile),
            drops,
            director: AdversaryDirector::default(),
            ledger: ScoreLedger::new(),
            events: EventBus::default(),
            store,
            arena: None,
            terminal_at: None,
            outcome: None,
            ticks: 0,
        }
    }

    /// Tear down the previous run and begin a new one
    pub fn start(&mut self, difficulty: Difficulty, now: u64) {
        self.difficulty = difficulty;
        self.profile = difficulty.profile();

        self.world.reset(self.profile.gravity);
        self.arena = Some(build_arena(&mut self.world, &self.profile));

        self.stack.clear();
        self.carrier = Carrier::new(&self.profile);
        self.drops = DropController::new(&self.profile, &mut self.rng);
        self.director.reset(now);
        self.ledger = ScoreLedger::new();
        self.events.clear();
        self.terminal_at = None;
        self.outcome = None;
        self.ticks = 0;
        self.phase = SessionPhase::Active;
        self.events.push(GameEvent::SessionStarted);

        log::info!(
            "Session started: difficulty={} theme={} seed={}",
            difficulty.as_str(),
            self.theme.kind.as_str(),
            self.seed
        );
    }

    /// Start again on the current difficulty
    pub fn retry(&mut self, now: u64) {
        self.start(self.difficulty, now);
    }

    /// Pick the tier for the next start. Ignored mid-run.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.phase == SessionPhase::Active {
            return false;
        }
        self.difficulty = difficulty;
        self.profile = difficulty.profile();
        true
    }

    /// Swap the skin used from the next start. Ignored mid-run, since the
    /// item shape and the best-score key belong to the running session.
    pub fn set_theme(&mut self, theme: ThemeKind) -> bool {
        if self.phase == SessionPhase::Active {
            return false;
        }
        self.theme = theme.theme();
        true
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.ledger.score()
    }

    pub fn best_score(&self) -> u32 {
        self.store.best_score(&self.theme.best_key(self.difficulty))
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn stack(&self) -> &StackModel {
        &self.stack
    }

    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    pub fn director(&self) -> &AdversaryDirector {
        &self.director
    }

    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn world(&self) -> &P {
        &self.world
    }

    /// Direct access to the physics backend (replays, tests)
    pub fn world_mut(&mut self) -> &mut P {
        &mut self.world
    }

    /// Size factor of the next item
    pub fn next_size(&self) -> f32 {
        self.drops.next_size()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Result screen, available once the display delay has passed
    pub fn report(&self, now: u64) -> Option<GameOverReport> {
        let terminal_at = self.terminal_at?;
        if now < terminal_at + GAME_OVER_DISPLAY_DELAY_MS {
            return None;
        }
        let score = self.ledger.score();
        let outcome = self.outcome?;
        Some(GameOverReport {
            score,
            best: outcome.best,
            new_record: outcome.improved && score > 0,
            best_label: self.theme.best_label(outcome.best, self.difficulty),
        })
    }

    /// Line shown on the start screen for the selected tier
    pub fn start_screen_best(&self) -> String {
        self.theme.best_label(self.best_score(), self.difficulty)
    }

    pub fn frame(&self) -> FrameView {
        FrameView {
            phase: self.phase,
            difficulty: self.difficulty,
            theme: self.theme.kind,
            score: self.ledger.score(),
            best: self.best_score(),
            carrier: self.carrier,
            preview_size: self
                .stack
                .in_flight()
                .is_none()
                .then(|| self.drops.next_size()),
            plate_width: self.profile.plate_width_px(),
            items: self
                .stack
                .items()
                .iter()
                .map(|item| ItemView {
                    id: item.id,
                    x: item.position.x,
                    y: item.position.y,
                    angle: item.angle,
                    half_width: item.half_extents.x,
                    half_height: item.half_extents.y,
                    size: item.size,
                    landed: item.has_landed,
                })
                .collect(),
            adversaries: self
                .director
                .adversaries()
                .iter()
                .map(|a| AdversaryView {
                    x: a.x,
                    direction: a.direction,
                    state: a.state,
                    mouth_open: a.mouth_open(),
                    variant: a.variant,
                })
                .collect(),
        }
    }
}
