//! # TekkenLite Combat Engine
//!
//! Deterministic simulation for a local two-player 2D fighting game: two
//! fighters, one arena, frame-data driven attacks, rounds and a match.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TEKKEN LITE ENGINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  ├── rect.rs     - Boxes, facing, overlap tests              │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Combat logic (deterministic)              │
//! │  ├── input.rs    - Input frames and recording                │
//! │  ├── moves.rs    - Frame data / move tables                  │
//! │  ├── fighter.rs  - Fighter state machine + physics           │
//! │  ├── collision.rs- Hit detection, walls, body push           │
//! │  ├── combat.rs   - Hit/block resolution                      │
//! │  ├── round.rs    - Round and match flow                      │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! │                                                              │
//! │  config.rs       - Tunables (JSON / env)                     │
//! │  replay/         - Transcripts and verification by replay    │
//! │  session.rs      - Real-time driver (tokio, non-deterministic)│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic inside a tick
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - No randomness
//!
//! Given identical configuration, move tables and inputs, the simulation
//! produces **identical results** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod replay;
pub mod session;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use config::{SimConfig, RoundConfig, ConfigError};
pub use game::{CombatError, InputFrame, MoveId, MoveTable, PlayerSlot, SimSnapshot, Simulation, TickResult};
pub use replay::{MatchTranscript, verify_transcript};
pub use session::{MatchSession, SessionCommand, SessionConfig, SessionHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
