//! Input Capture and Intent Resolution
//!
//! A player's controls for one tick are seven held buttons packed into a
//! byte. The engine compares each frame with the previous one to find
//! presses, then reduces the pair to a single [`Intent`] by fixed priority.
//!
//! Recording keeps only the ticks where a player's frame changed.

use serde::{Serialize, Deserialize};

use crate::core::rect::Facing;
use crate::game::error::CombatError;
use crate::game::state::PlayerSlot;

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Held buttons for a single tick.
///
/// NO tick field - tick is stored separately for compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct InputFrame {
    /// Packed button bits (see the `FLAG_*` constants)
    pub flags: u8,
}

impl InputFrame {
    /// Walk left
    pub const FLAG_LEFT: u8 = 0x01;
    /// Walk right
    pub const FLAG_RIGHT: u8 = 0x02;
    /// Jump
    pub const FLAG_UP: u8 = 0x04;
    /// Crouch
    pub const FLAG_DOWN: u8 = 0x08;
    /// Punch
    pub const FLAG_PUNCH: u8 = 0x10;
    /// Kick
    pub const FLAG_KICK: u8 = 0x20;
    /// Block
    pub const FLAG_BLOCK: u8 = 0x40;

    /// Bits that carry meaning; bit 7 is reserved.
    pub const FLAG_MASK: u8 = 0x7F;

    /// Nothing held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame from raw bits. Reserved bits are dropped.
    pub const fn from_bits(flags: u8) -> Self {
        Self { flags: flags & Self::FLAG_MASK }
    }

    /// Builder: also hold `flag`.
    pub const fn with(self, flag: u8) -> Self {
        Self::from_bits(self.flags | flag)
    }

    #[inline]
    fn has(self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Left held.
    #[inline]
    pub fn left(self) -> bool {
        self.has(Self::FLAG_LEFT)
    }

    /// Right held.
    #[inline]
    pub fn right(self) -> bool {
        self.has(Self::FLAG_RIGHT)
    }

    /// Up held.
    #[inline]
    pub fn up(self) -> bool {
        self.has(Self::FLAG_UP)
    }

    /// Down held.
    #[inline]
    pub fn down(self) -> bool {
        self.has(Self::FLAG_DOWN)
    }

    /// Punch held.
    #[inline]
    pub fn punch(self) -> bool {
        self.has(Self::FLAG_PUNCH)
    }

    /// Kick held.
    #[inline]
    pub fn kick(self) -> bool {
        self.has(Self::FLAG_KICK)
    }

    /// Block held.
    #[inline]
    pub fn block(self) -> bool {
        self.has(Self::FLAG_BLOCK)
    }

    /// Set or clear a button.
    #[inline]
    pub fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag & Self::FLAG_MASK;
        } else {
            self.flags &= !flag;
        }
    }

    /// Buttons held now but not in `previous`.
    #[inline]
    pub fn pressed_since(self, previous: InputFrame) -> InputFrame {
        Self::from_bits(self.flags & !previous.flags)
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(self) -> bool {
        self.flags == 0
    }

    /// Reject contradictory combinations.
    ///
    /// The tick never calls this to refuse a frame; contradictions are
    /// settled by [`resolve_intent`]. Tools and debug builds use it to flag
    /// suspicious input sources.
    pub fn validate(self) -> Result<(), CombatError> {
        if self.left() && self.right() {
            return Err(CombatError::InvalidInput("left and right held together"));
        }
        if self.up() && self.down() {
            return Err(CombatError::InvalidInput("up and down held together"));
        }
        if self.punch() && self.kick() {
            return Err(CombatError::InvalidInput("punch and kick held together"));
        }
        if self.block() && (self.punch() || self.kick()) {
            return Err(CombatError::InvalidInput("block held with an attack"));
        }
        Ok(())
    }
}

// =============================================================================
// INTENT
// =============================================================================

/// What a fighter tries to do this tick, after priority resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Hold block
    Block,
    /// Start a kick
    Kick,
    /// Start a punch
    Punch,
    /// Start a jump
    Jump,
    /// Crouch
    Crouch,
    /// Walk in a direction
    Move(Facing),
    /// Nothing
    Idle,
}

/// Reduce a frame to one intent.
///
/// Priority: block > kick > punch > jump > crouch > move. Attacks and jump
/// fire on the press edge only; block, crouch and walking act while held.
/// Left and right together cancel out.
pub fn resolve_intent(current: InputFrame, previous: InputFrame) -> Intent {
    let pressed = current.pressed_since(previous);

    if current.block() {
        Intent::Block
    } else if pressed.kick() {
        Intent::Kick
    } else if pressed.punch() {
        Intent::Punch
    } else if pressed.up() {
        Intent::Jump
    } else if current.down() {
        Intent::Crouch
    } else {
        match (current.left(), current.right()) {
            (true, false) => Intent::Move(Facing::Left),
            (false, true) => Intent::Move(Facing::Right),
            _ => Intent::Idle,
        }
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Size in bytes (approximate)
    pub const SIZE: usize = 5;

    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Complete input recording for one player in one match.
///
/// Used for replay playback and transcript verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInputBuffer {
    /// Which side this recording belongs to
    pub slot: PlayerSlot,

    /// Match identifier
    pub match_id: [u8; 16],

    /// Starting tick (usually 0)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Only ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl PlayerInputBuffer {
    /// Create a new input buffer for a player.
    pub fn new(slot: PlayerSlot, match_id: [u8; 16]) -> Self {
        Self {
            slot,
            match_id,
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get input at a specific tick (binary search).
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            // Before first delta - idle
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Get all deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Estimated size in bytes.
    pub fn estimated_size(&self) -> usize {
        32 + (self.deltas.len() * InputDelta::SIZE)
    }

    /// Finalize the buffer (call at match end).
    pub fn finalize(&mut self, end_tick: u32) {
        self.end_tick = end_tick;
    }

    /// Rebuild a buffer from stored deltas (e.g. a decoded transcript).
    pub fn from_deltas(slot: PlayerSlot, match_id: [u8; 16], deltas: Vec<InputDelta>, end_tick: u32) -> Self {
        let last_frame = deltas.last().map(|d| d.frame).unwrap_or_default();
        Self {
            slot,
            match_id,
            start_tick: 0,
            end_tick,
            deltas,
            last_frame,
        }
    }

    /// Create iterator over all inputs for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            buffer: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
            done: false,
        }
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    buffer: &'a PlayerInputBuffer,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
    done: bool,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.current_tick > self.buffer.end_tick {
            return None;
        }

        while let Some(delta) = self.buffer.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        match self.current_tick.checked_add(1) {
            Some(next) => self.current_tick = next,
            None => self.done = true,
        }
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
