//! Arena Pong
//!
//! Headless driver for the arena simulation.
//!
//! ```text
//! arena-pong [demo] [two|four]          AI-vs-AI local match, run flat out
//! arena-pong relay                      room relay (RELAY_BIND_ADDR, RELAY_MAX_CONNECTIONS)
//! arena-pong host <url> <room> [two|four]
//! arena-pong guest <url> <room> [two|four]
//! ```
//!
//! Networked modes tick at 60 Hz with an autopilot on the local paddle.

use std::time::{Duration, Instant};
use anyhow::{bail, Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use arena_pong::{
    TICK_RATE, VERSION,
    game::{
        config::{ConnectionMode, MatchConfig, ParticipantMode},
        events::{GameEvent, GameEventData},
        input::{slot_sign, InputFrame, KeyState},
        state::{SimulationState, Slot},
    },
    network::{relay::{RelayConfig, RelayServer}, session::SessionSettings},
    runner::{FrameSink, MatchRunner},
};

/// Demo cut-off: ten minutes of match time.
const DEMO_MAX_TICKS: u32 = TICK_RATE * 600;

/// Frames run after a networked match ends.
const LINGER_TICKS: u32 = TICK_RATE * 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Arena Pong v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("demo") => demo(parse_mode(args.get(1))?),
        Some("relay") => relay().await,
        Some("host") => {
            let (url, room) = endpoint(&args)?;
            let config = MatchConfig::new(parse_mode(args.get(3))?, ConnectionMode::RemoteHost)
                .with_network(url, room);
            play_networked(config).await
        }
        Some("guest") => {
            let (url, room) = endpoint(&args)?;
            let config = MatchConfig::new(parse_mode(args.get(3))?, ConnectionMode::RemoteGuest)
                .with_network(url, room);
            play_networked(config).await
        }
        Some(other) => bail!("Unknown mode '{}' (expected demo, relay, host or guest)", other),
    }
}

fn parse_mode(arg: Option<&String>) -> Result<ParticipantMode> {
    match arg.map(String::as_str) {
        None | Some("two") | Some("2") => Ok(ParticipantMode::Two),
        Some("four") | Some("4") => Ok(ParticipantMode::Four),
        Some(other) => bail!("Unknown participant mode '{}'", other),
    }
}

fn endpoint(args: &[String]) -> Result<(String, String)> {
    match (args.get(1), args.get(2)) {
        (Some(url), Some(room)) => Ok((url.clone(), room.clone())),
        _ => bail!("Usage: arena-pong {} <url> <room> [two|four]", args[0]),
    }
}

/// Logs scoring events as they happen.
struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, state: &SimulationState, events: &[GameEvent]) {
        for event in events {
            match &event.data {
                GameEventData::Goal { scorer, conceded, .. } => {
                    info!("Tick {}: {:?} scores past {:?} {:?}", event.tick, scorer, conceded, state.scores.as_slice());
                }
                GameEventData::Penalty { slot, .. } => {
                    info!("Tick {}: {:?} penalized {:?}", event.tick, slot, state.scores.as_slice());
                }
                GameEventData::MatchEnded { winner, .. } => {
                    info!("Tick {}: {:?} wins", event.tick, winner);
                }
                _ => {}
            }
        }
    }
}

/// Keys that chase the ball along `slot`'s movement axis.
fn autopilot(state: &SimulationState, slot: Slot) -> InputFrame {
    let Some(paddle) = state.paddle(slot) else {
        return InputFrame::IDLE;
    };
    let axis = slot.movement_axis();
    let gap = (axis.of(state.ball.position) - paddle.axis_position()) * slot_sign(slot);
    InputFrame::new(gap < -0.3, gap > 0.3)
}

/// Run an AI-vs-AI match as fast as possible.
fn demo(participants: ParticipantMode) -> Result<()> {
    info!("=== Starting Demo Match ({:?}) ===", participants);

    let config = MatchConfig::new(participants, ConnectionMode::AiOpponent);
    let mut runner = MatchRunner::new(config, None, SessionSettings::default())?;
    let mut sink = LogSink;
    let started = Instant::now();

    for _ in 0..DEMO_MAX_TICKS {
        let keys = KeyState::primary(autopilot(runner.view(), Slot::Left));
        let result = runner.run_frame(&keys, Instant::now(), &mut sink)?;
        if result.match_ended {
            break;
        }
    }

    let view = runner.view();
    info!(
        "=== Demo finished after {} ticks in {:?}: scores {:?} ===",
        view.tick,
        started.elapsed(),
        view.scores.as_slice()
    );
    Ok(())
}

/// Run the room relay until Ctrl-C.
async fn relay() -> Result<()> {
    let config = RelayConfig::from_env()?;
    let server = RelayServer::new(config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, stopping relay");
            server.shutdown();
        }
    }
    Ok(())
}

/// Host or guest a match through a relay at 60 Hz.
async fn play_networked(config: MatchConfig) -> Result<()> {
    let mut runner = MatchRunner::new(config, None, SessionSettings::default())?;
    let mut sink = LogSink;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / TICK_RATE as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, leaving match");
                return Ok(());
            }
        }

        let keys = match runner.local_slot() {
            Some(slot) => KeyState::primary(autopilot(runner.view(), slot)),
            None => KeyState::idle(),
        };
        let result = runner.run_frame(&keys, Instant::now(), &mut sink)?;
        if result.match_ended {
            info!(role = runner.role(), scores = ?runner.view().scores.as_slice(), "Match over");
            break;
        }
    }

    // Keep ticking so the host can repeat the final state to guests.
    for _ in 0..LINGER_TICKS {
        ticker.tick().await;
        runner.run_frame(&KeyState::idle(), Instant::now(), &mut sink)?;
    }
    Ok(())
}
