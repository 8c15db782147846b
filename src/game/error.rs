//! Combat Errors

use thiserror::Error;

use crate::core::fixed::{Fixed, to_float};
use crate::game::moves::MoveId;
use crate::game::state::PlayerSlot;

/// Errors raised by the combat engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// A move id was requested that the table does not contain.
    #[error("unknown move: {0:?}")]
    UnknownMove(MoveId),

    /// Contradictory input (e.g. left+right, punch+kick).
    ///
    /// Only produced by [`InputFrame::validate`](crate::game::input::InputFrame::validate);
    /// the tick resolves such frames by priority.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// A fighter ended a tick outside the arena after clamping.
    #[error("{slot:?} out of bounds at x = {}", world_units(.x))]
    OutOfBounds {
        /// Offending fighter
        slot: PlayerSlot,
        /// Post-clamp position
        x: Fixed,
    },

    /// A move table failed validation.
    #[error("invalid move table: {0}")]
    InvalidMoveTable(String),

    /// Configuration rejected when building or resetting a simulation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The simulation was terminated.
    #[error("simulation terminated")]
    Terminated,
}

fn world_units(x: &Fixed) -> f32 {
    to_float(*x)
}
