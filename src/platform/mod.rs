//! Platform abstraction layer
//!
//! Wall-clock source shared by the browser and native builds. Session
//! timestamps are milliseconds; only differences between them matter.

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Seed for a fresh session when none is supplied
pub fn entropy_seed() -> u64 {
    now_ms() ^ 0x9E37_79B9_7F4A_7C15
}

/// Fixed-step clock: turns variable frame deltas into whole ticks
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<u64>,
    accumulator_ms: f32,
}

impl FrameClock {
    /// Frame gaps longer than this are clamped (tab switches, breakpoints)
    const MAX_FRAME_MS: f32 = 100.0;
    /// Maximum ticks per frame to prevent spiral of death
    const MAX_SUBSTEPS: u32 = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixed ticks to run for a frame observed at `now`
    pub fn advance(&mut self, now: u64) -> u32 {
        let dt = match self.last_ms {
            Some(last) => (now.saturating_sub(last) as f32).min(Self::MAX_FRAME_MS),
            None => 0.0,
        };
        self.last_ms = Some(now);
        self.accumulator_ms += dt;

        let mut ticks = 0;
        while self.accumulator_ms >= crate::consts::TICK_MS && ticks < Self::MAX_SUBSTEPS {
            self.accumulator_ms -= crate::consts::TICK_MS;
            ticks += 1;
        }
        if ticks == Self::MAX_SUBSTEPS {
            self.accumulator_ms = 0.0;
        }
        ticks
    }
}
