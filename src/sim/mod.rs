//! Deterministic simulation module
//!
//! All gameplay rules live here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Physics behind the `PhysicsBackend` trait
//! - No rendering or platform dependencies

pub mod adversary;
pub mod carrier;
pub mod events;
pub mod judge;
pub mod physics;
pub mod score;
pub mod stack;
pub mod state;
pub mod tick;

pub use adversary::{Adversary, AdversaryDirector, AdversaryState, WaveKind};
pub use carrier::{Carrier, DropController, DropRejection};
pub use events::{EventBus, GameEvent};
pub use judge::{Verdict, judge, missed_drop};
pub use physics::{ItemShape, PhysicsBackend, RapierWorld, ScriptedWorld};
pub use score::{BestOutcome, ScoreLedger};
pub use stack::{ItemId, StackItem, StackModel};
pub use state::{AdversaryView, FrameView, GameOverReport, ItemView, Session, SessionPhase};
pub use tick::TickInput;
