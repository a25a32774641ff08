//! Discrete gameplay events
//!
//! Emitted by the session during a tick and drained by the presentation
//! layer (audio, HUD). Nothing read back from an event affects game state.

use std::fmt;

use super::stack::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    SessionStarted,
    /// Carrier released an item
    Dropped { item: ItemId },
    /// Item touched something for the first time
    Landed { item: ItemId },
    /// Score went up for a landed item
    Scored { item: ItemId, score: u32 },
    /// In-flight item fell past the playfield without landing (forgiven)
    Missed { item: ItemId },
    /// An adversary wave entered the screen
    AdversaryAppeared { count: usize, raid: bool },
    /// An adversary ate the top of the stack
    Consumed { item: ItemId, score: u32 },
    /// Last adversary of a wave walked off-screen
    WaveCleared,
    GameOver { score: u32, new_record: bool },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::SessionStarted => write!(f, "SessionStarted"),
            GameEvent::Dropped { item } => write!(f, "Dropped item={}", item.0),
            GameEvent::Landed { item } => write!(f, "Landed item={}", item.0),
            GameEvent::Scored { item, score } => write!(f, "Scored item={} score={}", item.0, score),
            GameEvent::Missed { item } => write!(f, "Missed item={}", item.0),
            GameEvent::AdversaryAppeared { count, raid } => {
                write!(f, "AdversaryAppeared count={} raid={}", count, raid)
            }
            GameEvent::Consumed { item, score } => {
                write!(f, "Consumed item={} score={}", item.0, score)
            }
            GameEvent::WaveCleared => write!(f, "WaveCleared"),
            GameEvent::GameOver { score, new_record } => {
                write!(f, "GameOver score={} new_record={}", score, new_record)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<GameEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: GameEvent) {
        log::trace!("{event}");
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
