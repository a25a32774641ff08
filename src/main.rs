//! Pancake Tower entry point
//!
//! Native builds run a headless autoplay session and log what happens; the
//! browser build is driven through `pancake_tower::web::WebGame`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use pancake_tower::audio::cues_for;
    use pancake_tower::consts::TICK_MS;
    use pancake_tower::highscores::{BestScoreStore, BestScores, FileStore};
    use pancake_tower::sim::{PhysicsBackend, RapierWorld, ScriptedWorld, Session, SessionPhase, TickInput};
    use pancake_tower::{Difficulty, ThemeKind};

    use clap::{Parser, ValueEnum};

    #[derive(Parser, Debug)]
    #[command(name = "pancake-tower")]
    #[command(about = "Headless autoplay run of the stacking game")]
    pub struct Options {
        #[arg(long, value_enum, default_value_t = CliDifficulty::Normal)]
        difficulty: CliDifficulty,
        #[arg(long, value_enum, default_value_t = CliTheme::Pancake)]
        theme: CliTheme,
        /// RNG seed (defaults to the clock)
        #[arg(long)]
        seed: Option<u64>,
        /// Maximum ticks to simulate (60 per second)
        #[arg(long, default_value_t = 60 * 60 * 3)]
        ticks: u64,
        /// Use the deterministic kinematic backend
        #[arg(long)]
        scripted: bool,
        /// Persist best scores to a JSON file
        #[arg(long)]
        store: Option<PathBuf>,
        /// Print the final frame snapshot as JSON
        #[arg(long = "frame")]
        print_frame: bool,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    enum CliDifficulty {
        Easy,
        Normal,
        Hard,
    }

    impl From<CliDifficulty> for Difficulty {
        fn from(value: CliDifficulty) -> Self {
            match value {
                CliDifficulty::Easy => Difficulty::Easy,
                CliDifficulty::Normal => Difficulty::Normal,
                CliDifficulty::Hard => Difficulty::Hard,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    enum CliTheme {
        Pancake,
        Unko,
    }

    impl From<CliTheme> for ThemeKind {
        fn from(value: CliTheme) -> Self {
            match value {
                CliTheme::Pancake => ThemeKind::Pancake,
                CliTheme::Unko => ThemeKind::Unko,
            }
        }
    }

    pub fn run(opts: Options) {
        let store: Box<dyn BestScoreStore> = match &opts.store {
            Some(path) => Box::new(FileStore::open(path)),
            None => Box::new(BestScores::new()),
        };
        if opts.scripted {
            play(ScriptedWorld::default(), store, &opts);
        } else {
            play(RapierWorld::default(), store, &opts);
        }
    }

    fn play<P: PhysicsBackend>(world: P, store: Box<dyn BestScoreStore>, opts: &Options) {
        let seed = opts.seed.unwrap_or_else(pancake_tower::platform::entropy_seed);
        log::debug!("seed {seed}");
        let difficulty = Difficulty::from(opts.difficulty);
        let mut session = Session::new(world, store, opts.theme.into(), seed);
        session.select_difficulty(difficulty);
        log::info!("{} ({} backend)", session.theme().title, if opts.scripted { "scripted" } else { "rapier" });
        let best_line = session.start_screen_best();
        if !best_line.is_empty() {
            log::info!("{best_line}");
        }

        session.start(difficulty, 0);
        let input = TickInput {
            drop: false,
            autoplay: true,
        };

        let mut now = 0;
        for tick in 1..=opts.ticks {
            now = (tick as f64 * f64::from(TICK_MS)) as u64;
            session.tick(&input, now);
            for event in session.drain_events() {
                let cues = cues_for(&event);
                log::debug!("t={now}ms {event} ({} sound cues)", cues.len());
            }
            if session.phase() == SessionPhase::Terminal {
                break;
            }
        }

        match session.report(now + pancake_tower::consts::GAME_OVER_DISPLAY_DELAY_MS) {
            Some(report) => {
                log::info!(
                    "Game over after {} ticks: score {} (best {}){}",
                    session.ticks(),
                    report.score,
                    report.best,
                    if report.new_record { " NEW RECORD" } else { "" }
                );
            }
            None => log::info!(
                "Stopped after {} ticks: score {}, {} items on the plate",
                session.ticks(),
                session.score(),
                session.stack().landed_count()
            ),
        }

        if opts.print_frame {
            match serde_json::to_string_pretty(&session.frame()) {
                Ok(json) => println!("{json}"),
                Err(err) => log::error!("Failed to serialize frame: {err}"),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_args() {
            let opts = Options::try_parse_from(["pancake-tower", "--difficulty", "hard", "--seed", "42", "--scripted"])
                .expect("valid");
            assert_eq!(Difficulty::from(opts.difficulty), Difficulty::Hard);
            assert_eq!(ThemeKind::from(opts.theme), ThemeKind::Pancake);
            assert_eq!(opts.seed, Some(42));
            assert!(opts.scripted);
            assert!(!opts.print_frame);

            let opts = Options::try_parse_from(["pancake-tower", "--theme", "unko", "--frame"]).expect("valid");
            assert_eq!(ThemeKind::from(opts.theme), ThemeKind::Unko);
            assert!(opts.print_frame);
            assert_eq!(opts.seed, None);

            assert!(Options::try_parse_from(["pancake-tower", "--seed"]).is_err());
            assert!(Options::try_parse_from(["pancake-tower", "--difficulty", "extreme"]).is_err());
            assert!(Options::try_parse_from(["pancake-tower", "--bogus"]).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    headless::run(headless::Options::parse());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is pancake_tower::web::wasm_start, this is just to satisfy the compiler
}
