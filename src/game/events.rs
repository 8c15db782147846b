//! Game Events
//!
//! Discrete things that happened during a tick. Returned from
//! `Simulation::tick` for presentation (sounds, hit sparks, banners) and kept
//! in transcripts.

use serde::{Serialize, Deserialize};

use crate::game::moves::MoveId;
use crate::game::state::PlayerSlot;

/// Priority for event ordering within a tick.
///
/// Lower value = first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Clean hits
    Hit = 0,
    /// Blocked attacks
    Block = 1,
    /// Knockouts
    KnockOut = 2,
    /// Round start/end
    Round = 3,
    /// Match end
    Match = 4,
    /// Pause, resume, reset
    Control = 5,
}

/// Why a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    /// One fighter reached zero health
    KnockOut,
    /// Both fighters reached zero health on the same tick
    DoubleKnockOut,
    /// The clock ran out
    TimeUp,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Intro finished, fighting begins
    RoundStarted {
        /// Zero-based round number
        round: u8,
    },

    /// An attack landed cleanly
    HitLanded {
        /// Who attacked
        attacker: PlayerSlot,
        /// Which attack
        move_id: MoveId,
        /// Health removed
        damage: u32,
        /// Defender's health afterwards
        defender_health: u32,
    },

    /// An attack was blocked
    AttackBlocked {
        /// Who attacked
        attacker: PlayerSlot,
        /// Which attack
        move_id: MoveId,
        /// Chip damage dealt
        chip: u32,
        /// Defender's health afterwards
        defender_health: u32,
    },

    /// A fighter's health reached zero
    FighterKnockedOut {
        /// Who went down
        slot: PlayerSlot,
    },

    /// Round decided
    RoundEnded {
        /// Zero-based round number
        round: u8,
        /// `None` for a draw
        winner: Option<PlayerSlot>,
        /// How it ended
        reason: RoundEndReason,
        /// Score after awarding this round
        rounds_won: [u8; 2],
    },

    /// Match decided
    MatchEnded {
        /// `None` for a draw game
        winner: Option<PlayerSlot>,
        /// Final score
        rounds_won: [u8; 2],
        /// Simulated ticks
        duration_ticks: u32,
    },

    /// Simulation paused
    Paused,

    /// Simulation resumed
    Resumed,

    /// Match restarted
    MatchReset,
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Ordering priority
    pub priority: EventPriority,

    /// Player involved (for tie-breaking)
    pub slot: Option<PlayerSlot>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let slot = match &data {
            GameEventData::HitLanded { attacker, .. } => Some(*attacker),
            GameEventData::AttackBlocked { attacker, .. } => Some(*attacker),
            GameEventData::FighterKnockedOut { slot } => Some(*slot),
            GameEventData::RoundEnded { winner, .. } => *winner,
            GameEventData::MatchEnded { winner, .. } => *winner,
            _ => None,
        };

        Self {
            tick,
            priority,
            slot,
            data,
        }
    }

    /// Create hit landed event.
    pub fn hit_landed(tick: u32, attacker: PlayerSlot, move_id: MoveId, damage: u32, defender_health: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Hit,
            GameEventData::HitLanded {
                attacker,
                move_id,
                damage,
                defender_health,
            },
        )
    }

    /// Create attack blocked event.
    pub fn attack_blocked(tick: u32, attacker: PlayerSlot, move_id: MoveId, chip: u32, defender_health: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Block,
            GameEventData::AttackBlocked {
                attacker,
                move_id,
                chip,
                defender_health,
            },
        )
    }

    /// Create knockout event.
    pub fn knocked_out(tick: u32, slot: PlayerSlot) -> Self {
        Self::new(tick, EventPriority::KnockOut, GameEventData::FighterKnockedOut { slot })
    }

    /// Create round started event.
    pub fn round_started(tick: u32, round: u8) -> Self {
        Self::new(tick, EventPriority::Round, GameEventData::RoundStarted { round })
    }

    /// Create round ended event.
    pub fn round_ended(
        tick: u32,
        round: u8,
        winner: Option<PlayerSlot>,
        reason: RoundEndReason,
        rounds_won: [u8; 2],
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Round,
            GameEventData::RoundEnded {
                round,
                winner,
                reason,
                rounds_won,
            },
        )
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, winner: Option<PlayerSlot>, rounds_won: [u8; 2]) -> Self {
        Self::new(
            tick,
            EventPriority::Match,
            GameEventData::MatchEnded {
                winner,
                rounds_won,
                duration_ticks: tick,
            },
        )
    }

    /// Create a pause/resume/reset event.
    pub fn control(tick: u32, data: GameEventData) -> Self {
        Self::new(tick, EventPriority::Control, data)
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.slot == other.slot
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then slot
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.slot.cmp(&other.slot))
    }
}
