//! Game State Definitions
//!
//! Plain data for the two fighters and the round. Logic that advances this
//! state lives in `fighter`, `combat` and `round`.

use serde::{Serialize, Deserialize};

use crate::core::fixed::from_int;
use crate::core::hash::StateHasher;
use crate::core::rect::{Facing, Rect};
use crate::core::vec2::FixedVec2;
use crate::game::error::CombatError;
use crate::game::moves::{MoveId, MoveTable, Phase};

// =============================================================================
// PLAYER SLOT
// =============================================================================

/// Which side of the match a fighter belongs to.
///
/// Implements Ord so events sort P1 before P2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerSlot {
    /// Player one, spawns on the left
    P1 = 0,
    /// Player two, spawns on the right
    P2 = 1,
}

impl PlayerSlot {
    /// Both slots in processing order.
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::P1, PlayerSlot::P2];

    /// Array index (0 or 1).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The other side.
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::P1 => PlayerSlot::P2,
            PlayerSlot::P2 => PlayerSlot::P1,
        }
    }
}

// =============================================================================
// FIGHTER STATE
// =============================================================================

/// What a fighter is currently locked into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
#[derive(Default)]
pub enum FighterStatus {
    /// Free to act
    #[default]
    Neutral = 0,
    /// Committed to an attack
    Attacking = 1,
    /// Holding block
    Blocking = 2,
    /// Stunned on the ground after a hit
    Hitstun = 3,
    /// Frozen by hit impact
    Hitstop = 4,
    /// Stunned after being hit in the air; ends no earlier than landing
    Knockback = 5,
}

/// Stun waiting for hitstop to expire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStun {
    /// Airborne hit: becomes knockback instead of hitstun
    pub knockback: bool,
    /// Length in ticks
    pub ticks: u32,
}

/// Complete state of one fighter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterState {
    /// Which side
    pub slot: PlayerSlot,

    /// Feet centre; y = 0 is the ground
    pub position: FixedVec2,

    /// Per-tick velocity
    pub velocity: FixedVec2,

    /// Remaining health (0..=max_health)
    pub health: u32,

    /// Health at round start
    pub max_health: u32,

    /// Which way the fighter looks
    pub facing: Facing,

    /// Move being performed
    pub current_move: MoveId,

    /// Ticks since the current move started
    pub move_frame: u32,

    /// Phase of the current move at `move_frame`
    pub phase: Phase,

    /// Lock state
    pub status: FighterStatus,

    /// Remaining ticks of hitstop, hitstun or knockback
    pub status_timer: u32,

    /// Off the ground
    pub airborne: bool,

    /// Stun queued behind hitstop
    pub pending_stun: Option<PendingStun>,

    /// The current attack already hit or was blocked
    pub attack_connected: bool,

    /// Ticks left before another attack may start
    pub attack_cooldown: u32,
}

impl FighterState {
    /// Create a fighter standing at `x`, idle.
    pub fn new(slot: PlayerSlot, x: i32, facing: Facing, max_health: u32) -> Self {
        Self {
            slot,
            position: FixedVec2::new(from_int(x), 0),
            velocity: FixedVec2::ZERO,
            health: max_health,
            max_health,
            facing,
            current_move: MoveId::Idle,
            move_frame: 0,
            phase: Phase::Startup,
            status: FighterStatus::Neutral,
            status_timer: 0,
            airborne: false,
            pending_stun: None,
            attack_connected: false,
            attack_cooldown: 0,
        }
    }

    /// Health reached zero.
    #[inline]
    pub fn is_knocked_out(&self) -> bool {
        self.health == 0
    }

    /// Frozen by hitstop.
    #[inline]
    pub fn in_hitstop(&self) -> bool {
        self.status == FighterStatus::Hitstop
    }

    /// In hitstun or knockback.
    #[inline]
    pub fn is_stunned(&self) -> bool {
        matches!(self.status, FighterStatus::Hitstun | FighterStatus::Knockback)
    }

    /// Performing an attack that has not finished.
    #[inline]
    pub fn attack_in_progress(&self) -> bool {
        self.current_move.is_attack()
    }

    /// Start a move from its first frame.
    pub fn start_move(&mut self, id: MoveId) {
        self.current_move = id;
        self.move_frame = 0;
        self.phase = Phase::Startup;
        self.status = Self::status_for(id);
        if id.is_attack() {
            self.attack_connected = false;
        }
    }

    /// Status implied by a move when nothing else holds the fighter.
    pub fn status_for(id: MoveId) -> FighterStatus {
        match id {
            MoveId::Punch | MoveId::Kick => FighterStatus::Attacking,
            MoveId::Block => FighterStatus::Blocking,
            _ => FighterStatus::Neutral,
        }
    }

    /// World-space push box.
    pub fn body_rect(&self, table: &MoveTable) -> Rect {
        Rect::from_local(self.position, table.body(), self.facing)
    }

    /// World-space hurtbox for the current move and frame.
    pub fn hurtbox_rect(&self, table: &MoveTable) -> Result<Rect, CombatError> {
        let def = table.lookup(self.current_move)?;
        Ok(Rect::from_local(self.position, def.hurtbox_at(self.move_frame), self.facing))
    }

    /// Hash this fighter's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.slot as u8);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_u32(self.health);
        hasher.update_u32(self.max_health);
        hasher.update_u8(self.facing as u8);
        hasher.update_u8(self.current_move as u8);
        hasher.update_u32(self.move_frame);
        hasher.update_u8(self.phase as u8);
        hasher.update_u8(self.status as u8);
        hasher.update_u32(self.status_timer);
        hasher.update_bool(self.airborne);
        match self.pending_stun {
            Some(stun) => {
                hasher.update_bool(true);
                hasher.update_bool(stun.knockback);
                hasher.update_u32(stun.ticks);
            }
            None => hasher.update_bool(false),
        }
        hasher.update_bool(self.attack_connected);
        hasher.update_u32(self.attack_cooldown);
    }
}

// =============================================================================
// ROUND STATE
// =============================================================================

/// Current phase of the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Freeze before the round ("READY... FIGHT!")
    Intro {
        /// Frozen ticks left
        ticks_remaining: u32,
    },
    /// Fighting
    Active,
    /// Round decided, holding before the next one
    Ending {
        /// Hold ticks left
        ticks_remaining: u32,
        /// Round winner, `None` for a draw
        winner: Option<PlayerSlot>,
    },
    /// Match decided; terminal until reset
    MatchOver {
        /// Match winner, `None` for a draw game
        winner: Option<PlayerSlot>,
    },
}

/// Timer and score of the match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Ticks left on the round clock
    pub timer_ticks: u32,
    /// Rounds won, indexed by slot
    pub rounds_won: [u8; 2],
    /// Zero-based number of the current round
    pub round_index: u8,
    /// Where in the round we are
    pub phase: RoundPhase,
}

impl RoundState {
    /// Whole seconds left, rounded up.
    pub fn seconds_remaining(&self) -> u32 {
        self.timer_ticks.div_ceil(crate::TICK_RATE)
    }

    /// Match has been decided.
    #[inline]
    pub fn is_match_over(&self) -> bool {
        matches!(self.phase, RoundPhase::MatchOver { .. })
    }

    /// Hash the round state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.timer_ticks);
        hasher.update_u8(self.rounds_won[0]);
        hasher.update_u8(self.rounds_won[1]);
        hasher.update_u8(self.round_index);
        let winner_byte = |w: Option<PlayerSlot>| w.map_or(0xFF, |s| s as u8);
        match self.phase {
            RoundPhase::Intro { ticks_remaining } => {
                hasher.update_u8(0);
                hasher.update_u32(ticks_remaining);
            }
            RoundPhase::Active => hasher.update_u8(1),
            RoundPhase::Ending { ticks_remaining, winner } => {
                hasher.update_u8(2);
                hasher.update_u32(ticks_remaining);
                hasher.update_u8(winner_byte(winner));
            }
            RoundPhase::MatchOver { winner } => {
                hasher.update_u8(3);
                hasher.update_u8(winner_byte(winner));
            }
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read-only copy of the simulation for rendering and observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimSnapshot {
    /// Simulated ticks so far
    pub tick: u32,
    /// Both fighters, indexed by slot
    pub fighters: [FighterState; 2],
    /// Round clock and score
    pub round: RoundState,
    /// Simulation is paused
    pub paused: bool,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::StateHasher;

    #[test]
    fn test_slot_helpers() {
        assert_eq!(PlayerSlot::P1.opponent(), PlayerSlot::P2);
        assert_eq!(PlayerSlot::P2.opponent(), PlayerSlot::P1);
        assert_eq!(PlayerSlot::P2.index(), 1);
        assert!(PlayerSlot::P1 < PlayerSlot::P2);
    }

    #[test]
    fn test_new_fighter() {
        let f = FighterState::new(PlayerSlot::P1, 228, Facing::Right, 100);
        assert_eq!(f.health, 100);
        assert_eq!(f.position, FixedVec2::from_ints(228, 0));
        assert_eq!(f.status, FighterStatus::Neutral);
        assert!(!f.airborne);
        assert!(!f.is_knocked_out());
    }

    #[test]
    fn test_start_move_sets_status() {
        let mut f = FighterState::new(PlayerSlot::P1, 228, Facing::Right, 100);
        f.attack_connected = true;
        f.start_move(MoveId::Kick);
        assert_eq!(f.status, FighterStatus::Attacking);
        assert!(!f.attack_connected);
        assert!(f.attack_in_progress());

        f.start_move(MoveId::Block);
        assert_eq!(f.status, FighterStatus::Blocking);
        f.start_move(MoveId::Walk);
        assert_eq!(f.status, FighterStatus::Neutral);
    }

    #[test]
    fn test_hurtbox_follows_move() {
        let table = MoveTable::standard();
        let mut f = FighterState::new(PlayerSlot::P2, 500, Facing::Left, 100);
        assert_eq!(f.hurtbox_rect(&table).unwrap().height, from_int(98));
        f.start_move(MoveId::Crouch);
        assert_eq!(f.hurtbox_rect(&table).unwrap().height, from_int(49));
        // Push box does not shrink
        assert_eq!(f.body_rect(&table).height, from_int(98));
    }

    #[test]
    fn test_fighter_hash_sensitive() {
        let hash = |f: &FighterState| {
            let mut h = StateHasher::for_sim_state();
            f.hash_into(&mut h);
            h.finalize()
        };
        let a = FighterState::new(PlayerSlot::P1, 228, Facing::Right, 100);
        let mut b = a.clone();
        assert_eq!(hash(&a), hash(&b));
        b.pending_stun = Some(PendingStun { knockback: false, ticks: 3 });
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_seconds_remaining_rounds_up() {
        let mut round = RoundState {
            timer_ticks: 3600,
            rounds_won: [0, 0],
            round_index: 0,
            phase: RoundPhase::Active,
        };
        assert_eq!(round.seconds_remaining(), 60);
        round.timer_ticks = 3599;
        assert_eq!(round.seconds_remaining(), 60);
        round.timer_ticks = 1;
        assert_eq!(round.seconds_remaining(), 1);
        round.timer_ticks = 0;
        assert_eq!(round.seconds_remaining(), 0);
    }
}
