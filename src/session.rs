//! Real-Time Match Session
//!
//! Drives a [`Simulation`] at a fixed tick rate on a tokio task. Local
//! controllers send [`SessionCommand`]s; renderers subscribe to a broadcast
//! of [`SimSnapshot`]s taken after every tick. The task records a
//! [`MatchTranscript`] per match and returns them when it ends.
//!
//! ```text
//!  controllers ──mpsc──▶ ┌───────────────┐ ──broadcast──▶ renderers
//!                        │ MatchSession  │
//!                        │  Simulation   │
//!                        │  Recorder     │
//!                        └───────────────┘
//! ```

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::RoundConfig;
use crate::game::error::CombatError;
use crate::game::input::InputFrame;
use crate::game::state::{PlayerSlot, SimSnapshot};
use crate::game::tick::{Simulation, TickResult};
use crate::replay::transcript::{MatchTranscript, TranscriptRecorder};

/// Commands accepted by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Replace a player's held buttons. Held until the next `Input`.
    Input {
        /// Which player
        slot: PlayerSlot,
        /// Buttons now held
        frame: InputFrame,
    },
    /// Pause the simulation.
    Pause,
    /// Resume after a pause.
    Resume,
    /// Start a new match with the given round structure.
    Reset(RoundConfig),
    /// Stop the session.
    Terminate,
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// End the session on its own once the match is decided.
    pub stop_on_match_over: bool,
    /// Snapshot broadcast buffer; slow observers skip ahead.
    pub snapshot_capacity: usize,
    /// Command queue depth.
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            stop_on_match_over: true,
            snapshot_capacity: 64,
            command_capacity: 256,
        }
    }
}

/// Errors from the session driver.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The simulation failed a tick.
    #[error("simulation error: {0}")]
    Simulation(#[from] CombatError),

    /// The session task is gone.
    #[error("session channel closed")]
    ChannelClosed,

    /// The session task panicked or was cancelled.
    #[error("session task failed: {0}")]
    Join(String),
}

/// Owner-side handle to a spawned session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: broadcast::Sender<SimSnapshot>,
    task: JoinHandle<Result<Vec<MatchTranscript>, SessionError>>,
}

impl SessionHandle {
    /// Queue a command for the next loop iteration.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Shorthand for [`SessionCommand::Input`].
    pub async fn input(&self, slot: PlayerSlot, frame: InputFrame) -> Result<(), SessionError> {
        self.send(SessionCommand::Input { slot, frame }).await
    }

    /// Receive a snapshot after every tick.
    pub fn subscribe(&self) -> broadcast::Receiver<SimSnapshot> {
        self.snapshots.subscribe()
    }

    /// Whether the session task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end and collect its transcripts.
    pub async fn join(self) -> Result<Vec<MatchTranscript>, SessionError> {
        drop(self.commands);
        self.task
            .await
            .map_err(|e| SessionError::Join(e.to_string()))?
    }
}

/// A simulation plus everything needed to run it in real time.
pub struct MatchSession {
    sim: Simulation,
    config: SessionConfig,
    held: [InputFrame; 2],
    recorder: Option<TranscriptRecorder>,
    transcripts: Vec<MatchTranscript>,
}

impl MatchSession {
    /// Wrap a freshly created simulation.
    pub fn new(sim: Simulation, config: SessionConfig) -> Self {
        let recorder = TranscriptRecorder::new(&sim);
        Self {
            sim,
            config,
            held: [InputFrame::new(); 2],
            recorder: Some(recorder),
            transcripts: Vec::new(),
        }
    }

    /// Run the session on the tokio runtime.
    pub fn spawn(self) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_capacity.max(1));
        let (snapshot_tx, _) = broadcast::channel(self.config.snapshot_capacity.max(1));
        let snapshots = snapshot_tx.clone();
        let task = tokio::spawn(self.run(command_rx, snapshot_tx));
        SessionHandle {
            commands: command_tx,
            snapshots,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        snapshots: broadcast::Sender<SimSnapshot>,
    ) -> Result<Vec<MatchTranscript>, SessionError> {
        let tick_rate = self.config.tick_rate.max(1);
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate));
        let mut ticker = interval(tick_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_rate, "session started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = self.tick_once()?;
                    // No subscribers is fine
                    let _ = snapshots.send(self.sim.snapshot());
                    if result.match_over && self.config.stop_on_match_over {
                        info!(tick = self.sim.current_tick(), "match decided, ending session");
                        break;
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.apply(command)? {
                            break;
                        }
                    }
                    None => {
                        info!("command channel closed, ending session");
                        break;
                    }
                },
            }
        }

        self.finish_recording();
        info!(transcripts = self.transcripts.len(), "session ended");
        Ok(self.transcripts)
    }

    /// Apply a command. Returns `false` when the session should stop.
    fn apply(&mut self, command: SessionCommand) -> Result<bool, SessionError> {
        match command {
            SessionCommand::Input { slot, frame } => {
                self.held[slot.index()] = frame;
            }
            SessionCommand::Pause => self.sim.pause(),
            SessionCommand::Resume => self.sim.resume(),
            SessionCommand::Reset(round) => {
                let mut candidate = self.sim.config().clone();
                candidate.round = round.clone();
                if let Err(e) = candidate.validate() {
                    warn!(error = %e, "reset rejected");
                    return Ok(true);
                }
                self.finish_recording();
                self.sim.reset(round)?;
                self.held = [InputFrame::new(); 2];
                self.recorder = Some(TranscriptRecorder::new(&self.sim));
                debug!("session reset");
            }
            SessionCommand::Terminate => {
                self.sim.terminate();
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run one tick with the currently held inputs and record it.
    fn tick_once(&mut self) -> Result<TickResult, SessionError> {
        let inputs = self.held;
        let before = self.sim.current_tick();
        let result = self.sim.tick(inputs)?;

        if self.sim.current_tick() != before {
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.record_tick(before, inputs, &result, &self.sim);
            }
        }
        for event in &result.events {
            debug!(tick = event.tick, event = ?event.data, "event");
        }
        Ok(result)
    }

    fn finish_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            self.transcripts.push(recorder.finish(&self.sim));
        }
    }
}
