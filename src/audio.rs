//! Audio system
//!
//! Gameplay events map to short procedurally generated effects plus a looping
//! chiptune BGM. The mapping and the BGM score are plain data so they can be
//! tested natively; synthesis goes through the Web Audio API on wasm.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Item released from the carrier
    Drop,
    /// Item touched the stack - soft thud
    Land,
    /// Score went up
    Score,
    /// Adversary chomp
    Eat,
    AdversaryAppear,
    GameOver,
}

/// A sound effect scheduled relative to the triggering event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub effect: SoundEffect,
    pub delay_ms: u32,
}

impl Cue {
    fn now(effect: SoundEffect) -> Self {
        Self { effect, delay_ms: 0 }
    }
}

/// Gap between the repeated appear sounds of a raid
pub const RAID_CUE_SPACING_MS: u32 = 100;

/// Sounds for one gameplay event
pub fn cues_for(event: &GameEvent) -> Vec<Cue> {
    match event {
        GameEvent::Dropped { .. } => vec![Cue::now(SoundEffect::Drop)],
        GameEvent::Landed { .. } => vec![Cue::now(SoundEffect::Land)],
        GameEvent::Scored { .. } => vec![Cue::now(SoundEffect::Score)],
        GameEvent::Consumed { .. } => vec![Cue::now(SoundEffect::Eat)],
        GameEvent::AdversaryAppeared { raid, .. } => {
            let repeats = if *raid { 3 } else { 1 };
            (0..repeats)
                .map(|i| Cue {
                    effect: SoundEffect::AdversaryAppear,
                    delay_ms: i * RAID_CUE_SPACING_MS,
                })
                .collect()
        }
        GameEvent::GameOver { .. } => vec![Cue::now(SoundEffect::GameOver)],
        GameEvent::SessionStarted | GameEvent::Missed { .. } | GameEvent::WaveCleared => Vec::new(),
    }
}

/// Whether an event starts (`Some(true)`) or stops (`Some(false)`) the BGM
pub fn bgm_transition(event: &GameEvent) -> Option<bool> {
    match event {
        GameEvent::SessionStarted => Some(true),
        GameEvent::GameOver { .. } => Some(false),
        _ => None,
    }
}

// === Sound recipes ===

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Single oscillator with exponential pitch ramps and a fade to silence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    pub start_hz: f32,
    /// `(target_hz, seconds after start)`, applied in order
    pub ramps: &'static [(f32, f64)],
    pub level: f32,
    pub length: f64,
}

/// Decaying white noise through a low-pass filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBurst {
    pub length: f64,
    /// Exponent of the `(1 - t)` amplitude envelope
    pub decay_power: i32,
    pub cutoff_hz: f32,
    pub level: f32,
}

/// Evenly spaced notes on one waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arpeggio {
    pub wave: Waveform,
    pub notes: &'static [f32],
    pub spacing: f64,
    pub level: f32,
    /// Fade time of each note
    pub fade: f64,
    /// Oscillator lifetime of each note
    pub length: f64,
}

/// Per-skin synthesis of the effects that differ between skins. The eat and
/// appear sounds are shared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundPalette {
    pub drop: Tone,
    pub land: NoiseBurst,
    pub score: Tone,
    pub game_over: Arpeggio,
}

// === BGM ===

/// Notes used by the loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    C4,
    D4,
    E4,
    F4,
    G4,
    A4,
    B4,
    C5,
    D5,
    E5,
    G5,
    A5,
}

impl Note {
    pub fn freq(self) -> f32 {
        match self {
            Note::C4 => 261.63,
            Note::D4 => 293.66,
            Note::E4 => 329.63,
            Note::F4 => 349.23,
            Note::G4 => 392.00,
            Note::A4 => 440.00,
            Note::B4 => 493.88,
            Note::C5 => 523.25,
            Note::D5 => 587.33,
            Note::E5 => 659.25,
            Note::G5 => 783.99,
            Note::A5 => 880.00,
        }
    }
}

/// One looping two-voice background track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgmTrack {
    pub bpm: f64,
    pub melody: &'static [Note],
    /// Played an octave down
    pub bass: &'static [Note],
    pub melody_level: f32,
    pub bass_level: f32,
}

impl BgmTrack {
    /// Seconds per beat
    pub fn beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn loop_length(&self) -> f64 {
        self.melody.len() as f64 * self.beat()
    }

    /// Both voices of one full loop starting at `start`
    pub fn schedule(&self, start: f64) -> Vec<BgmNote> {
        let beat = self.beat();
        self.melody
            .iter()
            .zip(self.bass.iter())
            .enumerate()
            .flat_map(|(i, (melody, bass))| {
                let t = start + i as f64 * beat;
                [
                    BgmNote {
                        voice: Voice::Melody,
                        start: t,
                        freq: melody.freq(),
                        length: beat,
                        level: self.melody_level,
                    },
                    BgmNote {
                        voice: Voice::Bass,
                        start: t,
                        freq: bass.freq() * 0.5,
                        length: beat,
                        level: self.bass_level,
                    },
                ]
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Square wave lead
    Melody,
    /// Triangle bass
    Bass,
}

/// One scheduled BGM note, times in seconds on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgmNote {
    pub voice: Voice,
    pub start: f64,
    pub freq: f32,
    pub length: f64,
    pub level: f32,
}

/// Looping background music scheduler
#[derive(Debug, Clone)]
pub struct Bgm {
    track: BgmTrack,
    playing: bool,
    /// Audio-clock time at which the next loop must begin
    next_loop_at: f64,
}

impl Bgm {
    pub fn new(track: BgmTrack) -> Self {
        Self {
            track,
            playing: false,
            next_loop_at: 0.0,
        }
    }

    /// Takes effect from the next loop
    pub fn set_track(&mut self, track: BgmTrack) {
        self.track = track;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn start(&mut self, now: f64) {
        if !self.playing {
            self.playing = true;
            self.next_loop_at = now;
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Notes to queue at audio time `now`. A loop is handed out slightly
    /// before the previous one runs out so playback never gaps.
    pub fn poll(&mut self, now: f64) -> Vec<BgmNote> {
        const LOOKAHEAD: f64 = 0.1;
        if !self.playing || now + LOOKAHEAD < self.next_loop_at {
            return Vec::new();
        }
        let start = self.next_loop_at.max(now);
        self.next_loop_at = start + self.track.loop_length();
        self.track.schedule(start)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use web_sys::{AudioContext, BiquadFilterType, GainNode, OscillatorNode, OscillatorType};

    use super::{
        Arpeggio, Bgm, BgmNote, Cue, NoiseBurst, SoundEffect, SoundPalette, Tone, Voice, Waveform,
        bgm_transition, cues_for,
    };
    use crate::settings::Settings;
    use crate::sim::GameEvent;
    use crate::theme::Theme;

    impl From<Waveform> for OscillatorType {
        fn from(wave: Waveform) -> Self {
            match wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            }
        }
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        sounds: SoundPalette,
        sfx_volume: f32,
        music_volume: f32,
        bgm: Bgm,
        /// Queued BGM oscillators and when they finish
        bgm_nodes: Vec<(OscillatorNode, f64)>,
        /// Noise source for the landing thud
        rng: Pcg32,
    }

    impl AudioManager {
        pub fn new(settings: &Settings, theme: &Theme) -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                sounds: theme.sounds,
                sfx_volume: settings.effective_sfx_volume(),
                music_volume: settings.effective_music_volume(),
                bgm: Bgm::new(theme.music),
                bgm_nodes: Vec::new(),
                rng: Pcg32::seed_from_u64(js_sys::Date::now() as u64),
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.sfx_volume = settings.effective_sfx_volume();
            self.music_volume = settings.effective_music_volume();
            if self.music_volume <= 0.0 {
                self.stop_bgm();
            }
        }

        /// Switch effects and music to another skin
        pub fn set_theme(&mut self, theme: &Theme) {
            self.sounds = theme.sounds;
            self.bgm.set_track(theme.music);
        }

        /// React to one gameplay event
        pub fn handle_event(&mut self, event: &GameEvent) {
            for cue in cues_for(event) {
                self.play(cue);
            }
            match bgm_transition(event) {
                Some(true) => self.start_bgm(),
                Some(false) => self.stop_bgm(),
                None => {}
            }
        }

        /// Call once per frame to keep the BGM loop fed
        pub fn update(&mut self) {
            let Some(ctx) = &self.ctx else { return };
            let notes = self.bgm.poll(ctx.current_time());
            for note in notes {
                self.play_bgm_note(note);
            }
        }

        pub fn start_bgm(&mut self) {
            if self.music_volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            self.bgm.start(ctx.current_time());
            self.update();
        }

        pub fn stop_bgm(&mut self) {
            self.bgm.stop();
            for (node, _) in self.bgm_nodes.drain(..) {
                // Already-finished nodes throw; ignore
                let _ = node.stop();
            }
        }

        pub fn play(&mut self, cue: Cue) {
            let vol = self.sfx_volume;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = self.ctx.clone() else { return };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let t = ctx.current_time() + f64::from(cue.delay_ms) / 1000.0;
            let sounds = self.sounds;
            match cue.effect {
                SoundEffect::Drop => self.play_tone(&ctx, &sounds.drop, t, vol),
                SoundEffect::Land => self.play_noise(&ctx, &sounds.land, t, vol),
                SoundEffect::Score => self.play_tone(&ctx, &sounds.score, t, vol),
                SoundEffect::Eat => self.play_eat(&ctx, t, vol),
                SoundEffect::AdversaryAppear => self.play_appear(&ctx, t, vol),
                SoundEffect::GameOver => self.play_arpeggio(&ctx, &sounds.game_over, t, vol),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Drop and score - pitch ramps with a fade out
        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, t: f64, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, tone.start_hz, tone.wave.into()) else {
                return;
            };
            osc.frequency().set_value_at_time(tone.start_hz, t).ok();
            for &(hz, at) in tone.ramps {
                osc.frequency().exponential_ramp_to_value_at_time(hz, t + at).ok();
            }
            gain.gain().set_value_at_time(vol * tone.level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + tone.length)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.length).ok();
        }

        /// Land - low-passed noise burst
        fn play_noise(&mut self, ctx: &AudioContext, burst: &NoiseBurst, t: f64, vol: f32) {
            let rate = ctx.sample_rate();
            let len = (f64::from(rate) * burst.length) as u32;
            let mut data: Vec<f32> = (0..len)
                .map(|i| {
                    let decay = (1.0 - i as f32 / len as f32).powi(burst.decay_power);
                    (self.rng.random::<f32>() * 2.0 - 1.0) * decay
                })
                .collect();

            let Ok(buffer) = ctx.create_buffer(1, len, rate) else { return };
            if buffer.copy_to_channel(&mut data, 0).is_err() {
                return;
            }
            let Ok(source) = ctx.create_buffer_source() else { return };
            source.set_buffer(Some(&buffer));
            let Ok(filter) = ctx.create_biquad_filter() else { return };
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(burst.cutoff_hz);
            let Ok(gain) = ctx.create_gain() else { return };
            gain.gain().set_value_at_time(vol * burst.level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + burst.length)
                .ok();

            if source.connect_with_audio_node(&filter).is_err()
                || filter.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(&ctx.destination()).is_err()
            {
                return;
            }
            source.start_with_when(t).ok();
        }

        /// Eat - two quick sawtooth chomps
        fn play_eat(&self, ctx: &AudioContext, t: f64, vol: f32) {
            for bite in 0..2 {
                let t = t + f64::from(bite) * 0.15;
                if let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Sawtooth) {
                    osc.frequency().set_value_at_time(180.0, t).ok();
                    osc.frequency()
                        .exponential_ramp_to_value_at_time(80.0, t + 0.08)
                        .ok();
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.1).ok();
                }
            }
        }

        /// Adversary appears - square wave honk
        fn play_appear(&self, ctx: &AudioContext, t: f64, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Square) else {
                return;
            };
            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency().linear_ramp_to_value_at_time(200.0, t + 0.2).ok();
            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Game over - descending notes
        fn play_arpeggio(&self, ctx: &AudioContext, arp: &Arpeggio, t: f64, vol: f32) {
            for (i, &freq) in arp.notes.iter().enumerate() {
                let t = t + i as f64 * arp.spacing;
                if let Some((osc, gain)) = self.create_osc(ctx, freq, arp.wave.into()) {
                    gain.gain().set_value_at_time(vol * arp.level, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + arp.fade)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + arp.length).ok();
                }
            }
        }

        fn play_bgm_note(&mut self, note: BgmNote) {
            let vol = self.music_volume;
            let Some(ctx) = self.ctx.clone() else { return };
            let (osc_type, hold, release) = match note.voice {
                Voice::Melody => (OscillatorType::Square, 0.7, 0.95),
                Voice::Bass => (OscillatorType::Triangle, 0.5, 0.9),
            };
            let Some((osc, gain)) = self.create_osc(&ctx, note.freq, osc_type) else {
                return;
            };
            let t = note.start;
            let len = note.length;
            let level = vol * note.level;
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain().set_value_at_time(level, t + len * hold).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.0, t + len * release)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + len).ok();

            let now = ctx.current_time();
            self.bgm_nodes.retain(|(_, end)| *end > now);
            self.bgm_nodes.push((osc, t + len));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ItemId;
    use crate::theme::ThemeKind;

    #[test]
    fn test_raid_plays_appear_three_times() {
        let cues = cues_for(&GameEvent::AdversaryAppeared { count: 3, raid: true });
        let delays: Vec<u32> = cues.iter().map(|c| c.delay_ms).collect();
        assert_eq!(delays, vec![0, 100, 200]);
        assert!(cues.iter().all(|c| c.effect == SoundEffect::AdversaryAppear));

        let single = cues_for(&GameEvent::AdversaryAppeared { count: 1, raid: false });
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_event_mapping() {
        let item = ItemId(1);
        assert_eq!(cues_for(&GameEvent::Dropped { item })[0].effect, SoundEffect::Drop);
        assert_eq!(cues_for(&GameEvent::Consumed { item, score: 0 })[0].effect, SoundEffect::Eat);
        assert!(cues_for(&GameEvent::Missed { item }).is_empty());
        assert_eq!(bgm_transition(&GameEvent::SessionStarted), Some(true));
        assert_eq!(
            bgm_transition(&GameEvent::GameOver { score: 3, new_record: false }),
            Some(false)
        );
    }

    #[test]
    fn test_bgm_schedule_covers_one_loop() {
        let track = ThemeKind::Pancake.theme().music;
        let notes = track.schedule(2.0);
        assert_eq!(notes.len(), 64);
        let last = notes.last().expect("notes");
        assert!((last.start + last.length - (2.0 + track.loop_length())).abs() < 1e-9);
        // Bass is an octave down
        let bass = notes.iter().find(|n| n.voice == Voice::Bass).expect("bass");
        assert!((bass.freq - Note::C4.freq() * 0.5).abs() < 1e-3);
        assert_eq!(bass.level, track.bass_level);
    }

    #[test]
    fn test_bgm_poll_refills_before_loop_ends() {
        let track = ThemeKind::Pancake.theme().music;
        let mut bgm = Bgm::new(track);
        assert!(bgm.poll(0.0).is_empty());
        bgm.start(0.0);
        assert_eq!(bgm.poll(0.0).len(), 64);
        assert!(bgm.poll(1.0).is_empty());
        let refill = bgm.poll(track.loop_length() - 0.05);
        assert_eq!(refill.len(), 64);
        assert!((refill[0].start - track.loop_length()).abs() < 1e-9);
        bgm.stop();
        assert!(bgm.poll(100.0).is_empty());
    }

    #[test]
    fn test_track_switch_applies_from_next_loop() {
        let pancake = ThemeKind::Pancake.theme().music;
        let unko = ThemeKind::Unko.theme().music;
        let mut bgm = Bgm::new(pancake);
        bgm.start(0.0);
        let first = bgm.poll(0.0);
        assert_eq!(first[0].freq, pancake.melody[0].freq());

        bgm.set_track(unko);
        let next = bgm.poll(pancake.loop_length());
        assert_eq!(next[0].freq, unko.melody[0].freq());
        // 150 BPM loop is shorter than the 140 BPM one
        assert!(unko.loop_length() < pancake.loop_length());
        let last = next.last().expect("notes");
        assert!((last.start + last.length - (pancake.loop_length() + unko.loop_length())).abs() < 1e-9);
    }
}
