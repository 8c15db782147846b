//! TekkenLite Headless Runner
//!
//! Plays a match between two scripted bots, then proves the result by
//! re-running the recorded transcript.
//!
//! ```text
//! tekken-lite [MOVE_TABLE.json] [--realtime]
//! ```
//!
//! Configuration is read from the file named by `TEKKEN_LITE_CONFIG`, if set.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tekken_lite::{
    TICK_RATE, VERSION,
    config::SimConfig,
    core::fixed::{FIXED_SCALE, fixed_abs},
    game::{
        FighterState, FighterStatus, GameEventData, InputFrame, MoveTable, PlayerSlot, SimSnapshot,
        Simulation,
    },
    replay::{MatchTranscript, TranscriptRecorder, verify_transcript},
    session::{MatchSession, SessionCommand, SessionConfig},
};

/// Hard stop for the headless match (ten minutes of game time).
const MAX_TICKS: u32 = 36_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("TekkenLite v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut realtime = false;
    let mut table_path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--realtime" {
            realtime = true;
        } else {
            table_path = Some(arg);
        }
    }

    let config = SimConfig::from_env().context("loading configuration")?;
    let table = match table_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            Arc::new(MoveTable::from_json(&json).with_context(|| format!("parsing {path}"))?)
        }
        None => Arc::new(MoveTable::standard()),
    };
    let tables = [table.clone(), table];

    let transcript = if realtime {
        run_realtime(config.clone(), tables.clone())?
    } else {
        run_headless(config.clone(), tables.clone())?
    };

    verify(&transcript, &config, tables)
}

/// Run the match as fast as possible on this thread.
fn run_headless(config: SimConfig, tables: [Arc<MoveTable>; 2]) -> Result<MatchTranscript> {
    info!("=== Starting Headless Match ===");
    let mut sim = Simulation::new(config, tables)?;
    let mut recorder = TranscriptRecorder::new(&sim);
    info!("Match ID: {}", recorder.match_id());

    let mut total_events = 0;
    while sim.current_tick() < MAX_TICKS {
        let snapshot = sim.snapshot();
        let inputs = bot_inputs(&snapshot);

        let before = sim.current_tick();
        let result = sim.tick(inputs)?;
        if sim.current_tick() != before {
            recorder.record_tick(before, inputs, &result, &sim);
        }
        total_events += result.events.len();

        for event in &result.events {
            log_event(&event.data);
        }
        if result.match_over {
            break;
        }
    }

    info!("Total events: {}", total_events);
    Ok(recorder.finish(&sim))
}

/// Run the match through the real-time session driver.
fn run_realtime(config: SimConfig, tables: [Arc<MoveTable>; 2]) -> Result<MatchTranscript> {
    info!("=== Starting Real-Time Match ===");
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        let sim = Simulation::new(config, tables)?;
        let handle = MatchSession::new(sim, SessionConfig::default()).spawn();
        let mut snapshots = handle.subscribe();

        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    let inputs = bot_inputs(&snapshot);
                    for slot in PlayerSlot::ALL {
                        handle.input(slot, inputs[slot.index()]).await?;
                    }
                    if snapshot.round.is_match_over() {
                        break;
                    }
                    if snapshot.tick >= MAX_TICKS {
                        handle.send(SessionCommand::Terminate).await?;
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "bot fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }

        let mut transcripts = handle.join().await?;
        transcripts
            .pop()
            .context("session produced no transcript")
    })
}

/// Replay the transcript and compare hashes.
fn verify(transcript: &MatchTranscript, config: &SimConfig, tables: [Arc<MoveTable>; 2]) -> Result<()> {
    info!("=== Match Results ===");
    if let Some(result) = &transcript.result {
        info!("Ended at tick {} ({} s)", result.end_tick, result.end_tick / TICK_RATE);
        info!("Winner: {:?}, rounds {}-{}", result.winner, result.rounds_won[0], result.rounds_won[1]);
        info!("Final State Hash: {}", hex::encode(result.final_state_hash));
    }
    let bytes = transcript.to_bytes()?;
    info!("Transcript: {} bytes, {} checkpoints", bytes.len(), transcript.checkpoints.len());

    info!("=== Verifying Determinism ===");
    let decoded = MatchTranscript::from_bytes(&bytes)?;
    let verification = verify_transcript(&decoded, config, tables);
    info!("Replay State Hash: {}", hex::encode(verification.computed_final_hash));

    match verification.error {
        None => {
            info!("DETERMINISM VERIFIED: Hashes match!");
            Ok(())
        }
        Some(err) => anyhow::bail!("DETERMINISM FAILURE: {err}"),
    }
}

fn log_event(data: &GameEventData) {
    match data {
        GameEventData::RoundStarted { round } => info!("Round {} - FIGHT!", round + 1),
        GameEventData::FighterKnockedOut { slot } => info!("{:?} K.O.!", slot),
        GameEventData::RoundEnded { round, winner, reason, rounds_won } => {
            info!(
                "Round {} over ({:?}): {:?} - score {}-{}",
                round + 1,
                reason,
                winner,
                rounds_won[0],
                rounds_won[1]
            );
        }
        GameEventData::MatchEnded { winner, .. } => info!("Match ended! Winner: {:?}", winner),
        _ => {}
    }
}

// =============================================================================
// Scripted bots
// =============================================================================

fn bot_inputs(snapshot: &SimSnapshot) -> [InputFrame; 2] {
    let [p1, p2] = &snapshot.fighters;
    [
        aggressive_bot(p1, p2, snapshot.tick),
        defensive_bot(p2, p1, snapshot.tick),
    ]
}

/// Gap between anchors in whole world units.
fn distance(me: &FighterState, opponent: &FighterState) -> i32 {
    fixed_abs(opponent.position.x - me.position.x) >> FIXED_SCALE
}

fn toward(me: &FighterState, opponent: &FighterState) -> InputFrame {
    if opponent.position.x > me.position.x {
        InputFrame::from_bits(InputFrame::FLAG_RIGHT)
    } else {
        InputFrame::from_bits(InputFrame::FLAG_LEFT)
    }
}

/// Walks in and alternates punches and kicks.
fn aggressive_bot(me: &FighterState, opponent: &FighterState, tick: u32) -> InputFrame {
    if distance(me, opponent) > 80 {
        return toward(me, opponent);
    }
    match tick % 24 {
        0 => InputFrame::from_bits(InputFrame::FLAG_PUNCH),
        12 => InputFrame::from_bits(InputFrame::FLAG_KICK),
        _ => InputFrame::new(),
    }
}

/// Blocks every other attack it sees and counters with kicks.
fn defensive_bot(me: &FighterState, opponent: &FighterState, tick: u32) -> InputFrame {
    let gap = distance(me, opponent);
    if opponent.status == FighterStatus::Attacking && (tick / 60) % 2 == 0 {
        return InputFrame::from_bits(InputFrame::FLAG_BLOCK);
    }
    if gap > 120 {
        return toward(me, opponent);
    }
    if tick % 40 == 20 && gap <= 80 {
        return InputFrame::from_bits(InputFrame::FLAG_KICK);
    }
    if tick % 90 == 45 {
        return InputFrame::from_bits(InputFrame::FLAG_UP);
    }
    InputFrame::new()
}
