//! Verification API
//!
//! Verify matches by deterministic replay: rebuild the simulation from the
//! same config and move tables, feed the recorded inputs, and compare every
//! checkpoint and the final state against the transcript.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SimConfig;
use crate::core::hash::StateHash;
use crate::game::error::CombatError;
use crate::game::moves::MoveTable;
use crate::game::state::RoundPhase;
use crate::game::tick::Simulation;
use crate::replay::transcript::{MatchTranscript, TRANSCRIPT_VERSION, table_hash};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from transcript).
    pub expected_final_hash: StateHash,

    /// Checkpoints compared before stopping.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// First mismatch, if any.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointResult {
    /// Tick number.
    pub tick: u32,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Transcript has no result.
    #[error("transcript is incomplete")]
    IncompleteTranscript,

    /// Replay config differs from the recorded one.
    #[error("config hash mismatch")]
    ConfigMismatch,

    /// Replay move table differs from the recorded one.
    #[error("move table mismatch for slot {slot}")]
    TableMismatch {
        /// Slot index (0 = P1)
        slot: usize,
    },

    /// The simulation rejected the replay.
    #[error("replay failed: {0}")]
    Simulation(#[from] CombatError),

    /// The match ended during replay before the recorded end tick.
    #[error("replay stopped at tick {tick}, transcript ends at {end_tick}")]
    EndedEarly {
        /// Tick where replay stopped advancing
        tick: u32,
        /// Recorded end tick
        end_tick: u32,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch at tick {tick}")]
    CheckpointMismatch {
        /// Tick where mismatch occurred.
        tick: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Final state hash mismatch.
    #[error("final state hash mismatch")]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Winner or score differ.
    #[error("match result mismatch")]
    ResultMismatch,
}

impl VerificationResult {
    fn failed(error: VerificationError) -> Self {
        Self {
            valid: false,
            computed_final_hash: [0; 32],
            expected_final_hash: [0; 32],
            checkpoint_results: vec![],
            error: Some(error),
        }
    }
}

/// Verify a match transcript by full replay.
///
/// `config` and `tables` must be the ones the match was played with; their
/// hashes are checked against the transcript metadata before replaying.
pub fn verify_transcript(
    transcript: &MatchTranscript,
    config: &SimConfig,
    tables: [Arc<MoveTable>; 2],
) -> VerificationResult {
    if transcript.version != TRANSCRIPT_VERSION {
        return VerificationResult::failed(VerificationError::VersionMismatch {
            expected: TRANSCRIPT_VERSION,
            got: transcript.version,
        });
    }
    let result = match &transcript.result {
        Some(r) => r,
        None => return VerificationResult::failed(VerificationError::IncompleteTranscript),
    };
    if config.config_hash() != transcript.metadata.config_hash {
        return VerificationResult::failed(VerificationError::ConfigMismatch);
    }
    for (slot, table) in tables.iter().enumerate() {
        if table_hash(table) != transcript.metadata.table_hashes[slot] {
            return VerificationResult::failed(VerificationError::TableMismatch { slot });
        }
    }

    let mut sim = match Simulation::new(config.clone(), tables) {
        Ok(sim) => sim,
        Err(e) => return VerificationResult::failed(e.into()),
    };
    let buffers = transcript.input_buffers();
    let mut checkpoints = transcript.checkpoints.iter().peekable();
    let mut checkpoint_results = Vec::new();

    while sim.current_tick() < result.end_tick {
        let t = sim.current_tick();
        let inputs = [buffers[0].get_input_at(t), buffers[1].get_input_at(t)];
        if let Err(e) = sim.tick(inputs) {
            return VerificationResult::failed(e.into());
        }
        if sim.current_tick() == t {
            return VerificationResult::failed(VerificationError::EndedEarly {
                tick: t,
                end_tick: result.end_tick,
            });
        }

        if let Some(checkpoint) = checkpoints.next_if(|c| c.tick == sim.current_tick()) {
            let computed = sim.compute_hash();
            let valid = computed == checkpoint.state_hash;
            checkpoint_results.push(CheckpointResult {
                tick: checkpoint.tick,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                tracing::warn!(tick = checkpoint.tick, "checkpoint mismatch");
                return VerificationResult {
                    valid: false,
                    computed_final_hash: computed,
                    expected_final_hash: checkpoint.state_hash,
                    checkpoint_results,
                    error: Some(VerificationError::CheckpointMismatch {
                        tick: checkpoint.tick,
                        expected: checkpoint.state_hash,
                        computed,
                    }),
                };
            }
        }
    }

    let final_hash = sim.compute_hash();
    let (match_over, winner) = match sim.round().phase {
        RoundPhase::MatchOver { winner } => (true, winner),
        _ => (false, None),
    };

    let error = if final_hash != result.final_state_hash {
        Some(VerificationError::FinalStateMismatch {
            expected: result.final_state_hash,
            computed: final_hash,
        })
    } else if match_over != result.match_over
        || winner != result.winner
        || sim.round().rounds_won != result.rounds_won
    {
        Some(VerificationError::ResultMismatch)
    } else {
        None
    };

    VerificationResult {
        valid: error.is_none(),
        computed_final_hash: final_hash,
        expected_final_hash: result.final_state_hash,
        checkpoint_results,
        error,
    }
}
