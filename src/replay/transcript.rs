//! Match Transcript Recording
//!
//! Records all data needed to deterministically re-run a match: the rules it
//! was played under, both players' inputs (delta-compressed), periodic state
//! hashes and the final result. A five-round match fits in a few KB.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::hash::{StateHash, hash_with_domain};
use crate::game::events::{GameEvent, GameEventData, RoundEndReason};
use crate::game::input::{InputDelta, InputFrame, PlayerInputBuffer};
use crate::game::moves::MoveTable;
use crate::game::state::{PlayerSlot, RoundPhase};
use crate::game::tick::{Simulation, TickResult};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Checkpoint interval in ticks (every 10 seconds at 60Hz).
pub const CHECKPOINT_INTERVAL: u32 = 600;

/// Complete record of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Who played, under which rules, and when.
    pub metadata: MatchMetadata,

    /// Input recordings, indexed by slot.
    pub player_inputs: [PlayerInputRecord; 2],

    /// State hash checkpoints (every [`CHECKPOINT_INTERVAL`] ticks).
    pub checkpoints: Vec<StateCheckpoint>,

    /// Final result, set by [`TranscriptRecorder::finish`].
    pub result: Option<MatchResult>,

    /// Knockouts, round ends and the match end.
    pub events: Vec<TranscriptEvent>,
}

/// Match metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Unique match identifier (UUID bytes).
    pub match_id: [u8; 16],

    /// Unix timestamp (UTC seconds) when recording started.
    pub start_timestamp: i64,

    /// Hash of the [`SimConfig`](crate::config::SimConfig) in effect.
    pub config_hash: StateHash,

    /// Move table names, indexed by slot.
    pub table_names: [String; 2],

    /// Move table hashes, indexed by slot.
    pub table_hashes: [StateHash; 2],
}

/// One player's inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInputRecord {
    /// Which side.
    pub slot: PlayerSlot,

    /// Delta-compressed inputs (only when input changes).
    pub deltas: Vec<InputDelta>,

    /// Number of ticks recorded.
    pub input_count: u32,
}

/// State checkpoint for partial verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Ticks simulated when the hash was taken.
    pub tick: u32,

    /// [`Simulation::compute_hash`] at this tick.
    pub state_hash: StateHash,
}

/// Where the simulation stood when recording stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Ticks simulated.
    pub end_tick: u32,

    /// Whether the match was decided. `false` if the session ended early.
    pub match_over: bool,

    /// Winner, if decided and not a draw game.
    pub winner: Option<PlayerSlot>,

    /// Score when recording stopped.
    pub rounds_won: [u8; 2],

    /// Final state hash.
    pub final_state_hash: StateHash,
}

/// Transcript event (significant subset of [`GameEvent`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptEvent {
    /// A fighter was knocked out.
    KnockOut {
        /// Tick of the knockout.
        tick: u32,
        /// Who went down.
        slot: PlayerSlot,
    },

    /// A round was decided.
    RoundEnded {
        /// Tick the round ended.
        tick: u32,
        /// Zero-based round number.
        round: u8,
        /// `None` for a draw.
        winner: Option<PlayerSlot>,
        /// How it ended.
        reason: RoundEndReason,
    },

    /// The match was decided.
    MatchEnded {
        /// Tick the match ended.
        tick: u32,
        /// `None` for a draw game.
        winner: Option<PlayerSlot>,
        /// Final score.
        rounds_won: [u8; 2],
    },
}

impl TranscriptEvent {
    /// Convert a GameEvent to TranscriptEvent (if relevant).
    pub fn from_game_event(event: &GameEvent) -> Option<Self> {
        match &event.data {
            GameEventData::FighterKnockedOut { slot } => Some(TranscriptEvent::KnockOut {
                tick: event.tick,
                slot: *slot,
            }),
            GameEventData::RoundEnded { round, winner, reason, .. } => Some(TranscriptEvent::RoundEnded {
                tick: event.tick,
                round: *round,
                winner: *winner,
                reason: *reason,
            }),
            GameEventData::MatchEnded { winner, rounds_won, .. } => Some(TranscriptEvent::MatchEnded {
                tick: event.tick,
                winner: *winner,
                rounds_won: *rounds_won,
            }),
            // Hits, blocks and control events are reproduced by replay
            _ => None,
        }
    }
}

impl MatchTranscript {
    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        bincode::serialize(self).map_err(|e| TranscriptError::Encode(e.to_string()))
    }

    /// Deserialize from bytes, rejecting other transcript versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self =
            bincode::deserialize(data).map_err(|e| TranscriptError::Decode(e.to_string()))?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            });
        }
        Ok(transcript)
    }

    /// Rebuild the per-player input buffers for replay.
    pub fn input_buffers(&self) -> [PlayerInputBuffer; 2] {
        let end_tick = self.result.as_ref().map(|r| r.end_tick).unwrap_or(0);
        let rebuild = |record: &PlayerInputRecord| {
            PlayerInputBuffer::from_deltas(
                record.slot,
                self.metadata.match_id,
                record.deltas.clone(),
                end_tick.saturating_sub(1),
            )
        };
        [rebuild(&self.player_inputs[0]), rebuild(&self.player_inputs[1])]
    }

    /// Estimated size in bytes.
    pub fn estimated_size(&self) -> usize {
        // Rough estimate
        let base = 1 + 16 + 8 + 32 * 3 + self.metadata.table_names.iter().map(|n| n.len() + 8).sum::<usize>();
        let inputs: usize = self.player_inputs.iter()
            .map(|r| 1 + 8 + r.deltas.len() * InputDelta::SIZE + 4)
            .sum();
        let checkpoints = self.checkpoints.len() * 36;
        let events = self.events.len() * 16;
        let result = if self.result.is_some() { 48 } else { 0 };

        base + inputs + checkpoints + events + result
    }
}

/// Hash identifying a move table's contents.
pub fn table_hash(table: &MoveTable) -> StateHash {
    hash_with_domain(b"TEKKEN_LITE_MOVES_V1", table.to_json().as_bytes())
}

// =============================================================================
// RECORDER
// =============================================================================

/// Builds a [`MatchTranscript`] alongside a running [`Simulation`].
///
/// Call [`record_tick`](Self::record_tick) only for ticks that advanced the
/// simulation (not paused, not after the match ended).
#[derive(Debug)]
pub struct TranscriptRecorder {
    metadata: MatchMetadata,
    buffers: [PlayerInputBuffer; 2],
    checkpoints: Vec<StateCheckpoint>,
    events: Vec<TranscriptEvent>,
    recorded: u32,
}

impl TranscriptRecorder {
    /// Start recording a match that is at tick 0.
    pub fn new(sim: &Simulation) -> Self {
        Self::with_match_id(sim, Uuid::new_v4())
    }

    /// Start recording with a caller-chosen match id.
    pub fn with_match_id(sim: &Simulation, match_id: Uuid) -> Self {
        let id = *match_id.as_bytes();
        let tables = sim.tables();
        let metadata = MatchMetadata {
            match_id: id,
            start_timestamp: chrono::Utc::now().timestamp(),
            config_hash: sim.config().config_hash(),
            table_names: [tables[0].name().to_string(), tables[1].name().to_string()],
            table_hashes: [table_hash(&tables[0]), table_hash(&tables[1])],
        };
        tracing::debug!(match_id = %match_id, "transcript recording started");
        Self {
            metadata,
            buffers: [
                PlayerInputBuffer::new(PlayerSlot::P1, id),
                PlayerInputBuffer::new(PlayerSlot::P2, id),
            ],
            checkpoints: Vec::new(),
            events: Vec::new(),
            recorded: 0,
        }
    }

    /// Match id being recorded.
    pub fn match_id(&self) -> Uuid {
        Uuid::from_bytes(self.metadata.match_id)
    }

    /// Record the inputs fed to tick `tick` and what it produced. `sim` is
    /// the simulation after the tick.
    pub fn record_tick(&mut self, tick: u32, inputs: [InputFrame; 2], result: &TickResult, sim: &Simulation) {
        for (buffer, frame) in self.buffers.iter_mut().zip(inputs) {
            buffer.record(tick, frame);
        }
        self.recorded = self.recorded.saturating_add(1);

        self.events.extend(result.events.iter().filter_map(TranscriptEvent::from_game_event));

        let now = sim.current_tick();
        if now > 0 && now % CHECKPOINT_INTERVAL == 0 {
            self.checkpoints.push(StateCheckpoint {
                tick: now,
                state_hash: sim.compute_hash(),
            });
        }
    }

    /// Close the transcript with the simulation's current state.
    pub fn finish(mut self, sim: &Simulation) -> MatchTranscript {
        let end_tick = sim.current_tick();
        for buffer in self.buffers.iter_mut() {
            buffer.finalize(end_tick.saturating_sub(1));
        }

        let round = sim.round();
        let (match_over, winner) = match round.phase {
            RoundPhase::MatchOver { winner } => (true, winner),
            _ => (false, None),
        };
        let result = MatchResult {
            end_tick,
            match_over,
            winner,
            rounds_won: round.rounds_won,
            final_state_hash: sim.compute_hash(),
        };

        tracing::info!(
            match_id = %self.match_id(),
            end_tick,
            match_over,
            checkpoints = self.checkpoints.len(),
            final_hash = %hex::encode(&result.final_state_hash[..8]),
            "transcript finished"
        );

        let recorded = self.recorded;
        let [b1, b2] = self.buffers;
        let record = |buffer: PlayerInputBuffer| PlayerInputRecord {
            slot: buffer.slot,
            deltas: buffer.deltas().to_vec(),
            input_count: recorded,
        };
        MatchTranscript {
            version: TRANSCRIPT_VERSION,
            player_inputs: [record(b1), record(b2)],
            metadata: self.metadata,
            checkpoints: self.checkpoints,
            result: Some(result),
            events: self.events,
        }
    }
}

/// Errors that can occur with transcripts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// Serialization failed.
    #[error("transcript encoding failed: {0}")]
    Encode(String),

    /// Deserialization failed.
    #[error("transcript decoding failed: {0}")]
    Decode(String),

    /// Version mismatch.
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Version this build understands
        expected: u8,
        /// Version found in the data
        got: u8,
    },
}
