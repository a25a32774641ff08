//! Browser facade
//!
//! Exposes the session to the page script. The page owns the canvas and DOM
//! events; it forwards clicks to `drop_item`, calls `frame` every animation
//! frame and draws the returned JSON snapshot.

use wasm_bindgen::prelude::*;

use crate::audio::AudioManager;
use crate::difficulty::Difficulty;
use crate::highscores::LocalStorageStore;
use crate::platform::{FrameClock, entropy_seed, now_ms};
use crate::settings::Settings;
use crate::sim::{RapierWorld, Session, SessionPhase, TickInput};
use crate::theme::ThemeKind;

/// Install the panic hook and console logger
#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Pancake Tower starting...");
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session<RapierWorld>,
    settings: Settings,
    audio: AudioManager,
    clock: FrameClock,
    input: TickInput,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let settings = Settings::load();
        let mut session = Session::new(
            RapierWorld::default(),
            Box::new(LocalStorageStore),
            settings.theme,
            entropy_seed(),
        );
        session.select_difficulty(settings.difficulty);
        let audio = AudioManager::new(&settings, session.theme());
        WebGame {
            session,
            settings,
            audio,
            clock: FrameClock::new(),
            input: TickInput::default(),
        }
    }

    /// Start (or restart) on a tier name; unknown names keep the current tier
    pub fn start(&mut self, difficulty: &str) {
        let difficulty = Difficulty::from_str(difficulty).unwrap_or(self.session.difficulty());
        if self.settings.difficulty != difficulty {
            self.settings.difficulty = difficulty;
            self.settings.save();
        }
        self.audio.resume();
        self.session.start(difficulty, now_ms());
        self.clock = FrameClock::new();
        self.flush_events();
    }

    pub fn retry(&mut self) {
        self.audio.resume();
        self.session.retry(now_ms());
        self.clock = FrameClock::new();
        self.flush_events();
    }

    /// Queue a drop for the next tick
    pub fn drop_item(&mut self) {
        self.input.drop = true;
    }

    /// Switch skin on the start or result screen; returns false mid-run
    pub fn set_theme(&mut self, theme: &str) -> bool {
        let Some(kind) = ThemeKind::from_str(theme) else {
            return false;
        };
        if !self.session.set_theme(kind) {
            return false;
        }
        self.audio.set_theme(self.session.theme());
        self.settings.theme = kind;
        self.settings.save();
        true
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.settings.save();
        self.audio.apply_settings(&self.settings);
    }

    /// Run the ticks owed since the last frame and return the snapshot as JSON
    pub fn frame(&mut self) -> String {
        let now = now_ms();
        for _ in 0..self.clock.advance(now) {
            let input = std::mem::take(&mut self.input);
            self.session.tick(&input, now);
        }
        self.flush_events();
        self.audio.update();

        serde_json::to_string(&self.session.frame()).unwrap_or_else(|err| {
            log::error!("Failed to serialize frame: {err}");
            String::from("{}")
        })
    }

    /// Result screen as JSON once the display delay has passed, else empty
    pub fn report(&self) -> String {
        self.session
            .report(now_ms())
            .and_then(|r| serde_json::to_string(&r).ok())
            .unwrap_or_default()
    }

    pub fn is_over(&self) -> bool {
        self.session.phase() == SessionPhase::Terminal
    }

    /// "BEST: ..." line for the start screen
    pub fn best_label(&self) -> String {
        self.session.start_screen_best()
    }

    pub fn title(&self) -> String {
        self.session.theme().title.to_string()
    }
}

impl WebGame {
    fn flush_events(&mut self) {
        for event in self.session.drain_events() {
            self.audio.handle_event(&event);
        }
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
