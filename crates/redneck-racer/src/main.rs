/// Redneck Racer headless runner
///
/// Lays out races, drives the player with a simple autopilot and runs the
/// full race loop (update, collisions, draw) against a recording backend.
/// Useful for soak testing the gameplay core without a window.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use redneck_common::{AppConfig, RaceTrackId};
use redneck_engine::RecordingBackend;
use redneck_game::library::ButtonType;
use redneck_game::shotgun::SHOT_RANGE;
use redneck_game::{GameContext, RaceEvent, RaceScene, RaceState};

/// Road centre is sampled this far ahead of the player
const LOOK_AHEAD: f32 = 150.0;
const MAX_ROLL: f32 = 25.0;
/// Seconds the results panel stays up before the next race
const RESULTS_SECONDS: f32 = 3.0;

#[derive(Parser, Debug)]
#[command(name = "redneck-racer")]
#[command(about = "Run Redneck Racer races headlessly")]
struct Args {
    /// TOML config file
    #[arg(short, long, default_value = "redneck-racer.toml")]
    config: PathBuf,

    /// Track to race on, by key or display name
    #[arg(short, long)]
    track: Option<RaceTrackId>,

    /// RNG seed for the track layout and the AI
    #[arg(short, long)]
    seed: Option<u64>,

    /// Races to run back to back
    #[arg(short, long)]
    races: Option<u32>,

    /// Abandon a race after this many simulated seconds
    #[arg(long)]
    max_seconds: Option<f32>,
}

#[derive(Debug, Default)]
struct RaceOutcome {
    position: i32,
    seconds: u32,
    destroyed: bool,
    best_time: bool,
    finished: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config =
        AppConfig::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;

    let default_filter = format!("redneck={}", config.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_filter.parse()?))
        .init();

    tracing::info!("Redneck Racer v{}", env!("CARGO_PKG_VERSION"));

    if let Some(track) = args.track {
        config.track = track;
    }
    if let Some(races) = args.races {
        config.races = races;
    }
    if let Some(max_seconds) = args.max_seconds {
        config.max_race_seconds = max_seconds;
    }
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    let track = config.track;
    let races = config.races.max(1);

    let mut ctx = GameContext::new(config).context("loading game data")?;
    tracing::info!("Track {} with seed {}, {} race(s)", track.display_name(), seed, races);

    let mut race = RaceScene::new(&ctx, track, seed)?;
    for n in 1..=races {
        if n > 1 {
            ctx.apply_sound_settings();
            race.restart_race(&ctx)?;
        }
        let outcome = run_race(&mut race, &mut ctx);
        if outcome.finished {
            tracing::info!(
                "Race {}: position {}, {}s{}{}",
                n,
                outcome.position,
                outcome.seconds,
                if outcome.destroyed { ", destroyed" } else { "" },
                if outcome.best_time { ", new best time" } else { "" }
            );
        } else {
            tracing::warn!("Race {} abandoned after {:.0}s", n, race.elapsed());
        }
    }

    race.press_button(&mut ctx, ButtonType::Menu);
    for event in race.drain_events() {
        tracing::debug!("Leaving race: {:?}", event);
    }
    Ok(())
}

/// One race from the countdown to the results panel
fn run_race(race: &mut RaceScene, ctx: &mut GameContext) -> RaceOutcome {
    let dt = ctx.config.frame_interval();
    let max_seconds = ctx.config.max_race_seconds;
    let mut backend = RecordingBackend::default();
    let mut outcome = RaceOutcome::default();
    let mut results_time = 0.0;

    loop {
        if race.state() == RaceState::RaceActive {
            steer(race);
            shoot_nearest(race, ctx);
        }
        race.update(ctx, dt);
        let report = race.handle_collisions();
        if !report.removals.is_empty() {
            tracing::trace!("{} entities removed by collisions", report.removals.len());
        }
        backend.clear();
        race.draw(&mut backend);

        for event in race.drain_events() {
            tracing::debug!("{:?}", event);
            match event {
                RaceEvent::RaceFinished { position, seconds, destroyed } => {
                    outcome.position = position;
                    outcome.seconds = seconds;
                    outcome.destroyed = destroyed;
                    outcome.finished = true;
                }
                RaceEvent::NewBestTime { .. } => outcome.best_time = true,
                RaceEvent::FeedbackRequested => tracing::info!("Rating prompt shown"),
                _ => {}
            }
        }

        if race.state() == RaceState::RaceFinished {
            let buttons = race.hud().active_buttons();
            if buttons.contains(&ButtonType::Later) {
                race.press_button(ctx, ButtonType::Later);
            }
            if buttons.contains(&ButtonType::BackToMenu) {
                results_time += dt;
                if results_time >= RESULTS_SECONDS {
                    return outcome;
                }
            }
        } else if race.elapsed() > max_seconds {
            return outcome;
        }
    }
}

/// Lean towards the middle of the road a little way ahead
fn steer(race: &mut RaceScene) {
    let Some(p) = race.player_truck().map(|t| t.position()) else {
        return;
    };
    let (left, right) = race.road().bound_coordinates(p.y + LOOK_AHEAD);
    let roll = if left < right {
        (((left + right) / 2.0 - p.x) / 4.0).clamp(-MAX_ROLL, MAX_ROLL)
    } else {
        0.0
    };
    race.set_roll_angle(roll);
}

/// Fire at the closest racer or cop inside full-damage range
fn shoot_nearest(race: &mut RaceScene, ctx: &GameContext) {
    let Some(p) = race.player_truck().map(|t| t.position()) else {
        return;
    };
    let target = race
        .opponents()
        .iter()
        .copied()
        .chain(std::iter::once(race.police_id()))
        .filter_map(|id| Some((id, race.truck(id)?.position().distance(p))))
        .filter(|(_, d)| *d <= SHOT_RANGE / 2.0)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((id, _)) = target {
        race.shoot_at(ctx, id);
    }
}
