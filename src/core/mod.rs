//! Core deterministic primitives.
//!
//! Integer-only building blocks shared by every game module. Nothing in
//! here reads the clock, allocates per tick or touches floating point
//! outside of explicit display/config conversions.

pub mod fixed;
pub mod vec2;
pub mod rect;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use rect::{Rect, LocalBox, Facing, overlaps};
pub use hash::{StateHash, compute_state_hash};
