//! Game Logic Module
//!
//! All combat simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `input`: Input frames, edge detection, delta-compressed buffers
//! - `moves`: Frame data and move tables
//! - `state`: Fighter and round state
//! - `fighter`: Per-fighter step (intent, physics, hitstop)
//! - `collision`: Hit detection, arena clamping, body separation
//! - `combat`: Hit/block resolution
//! - `round`: Round and match flow
//! - `tick`: Authoritative simulation loop
//! - `events`: Game events for presentation and transcripts

pub mod error;
pub mod input;
pub mod moves;
pub mod state;
pub mod fighter;
pub mod collision;
pub mod combat;
pub mod round;
pub mod tick;
pub mod events;

// Re-export key types
pub use error::CombatError;
pub use input::{InputFrame, InputDelta, Intent, PlayerInputBuffer};
pub use moves::{MoveDefinition, MoveId, MoveTable, Phase};
pub use state::{FighterState, FighterStatus, PlayerSlot, RoundPhase, RoundState, SimSnapshot};
pub use tick::{Simulation, TickResult, replay_match};
pub use events::{GameEvent, GameEventData, RoundEndReason};
