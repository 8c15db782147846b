//! Move Definition Table
//!
//! Static per-character data: frame phases, hurtboxes and hitboxes per
//! phase, and the damage numbers of attacks. A table is validated once when
//! loaded and then shared read-only between fighters through an `Arc`.
//!
//! ## Frame layout of an attack
//!
//! ```text
//! frame:   0 .. startup-1 | startup .. +active-1 | .. total-1
//! phase:   Startup        | Active (hitboxes)    | Recovery
//! ```

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::fixed::WORLD_LIMIT;
use crate::core::rect::LocalBox;
use crate::game::error::CombatError;

// =============================================================================
// IDS AND PHASES
// =============================================================================

/// Identifier of an action a fighter can be performing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MoveId {
    /// Standing still
    Idle = 0,
    /// Walking left or right
    Walk = 1,
    /// Airborne after a jump
    Jump = 2,
    /// Crouching
    Crouch = 3,
    /// Holding block
    Block = 4,
    /// Fast, short-range attack
    Punch = 5,
    /// Slower, longer-range attack
    Kick = 6,
}

impl MoveId {
    /// Every move a table must define.
    pub const ALL: [MoveId; 7] = [
        MoveId::Idle,
        MoveId::Walk,
        MoveId::Jump,
        MoveId::Crouch,
        MoveId::Block,
        MoveId::Punch,
        MoveId::Kick,
    ];

    /// Whether this move deals damage.
    #[inline]
    pub fn is_attack(self) -> bool {
        matches!(self, MoveId::Punch | MoveId::Kick)
    }
}

/// Phase of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    /// Wind-up, no hitboxes
    Startup = 0,
    /// Hitboxes live
    Active = 1,
    /// Wind-down
    Recovery = 2,
}

// =============================================================================
// DEFINITIONS
// =============================================================================

/// Duration and boxes of one phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseData {
    /// Length in ticks (>= 1)
    pub duration: u32,
    /// Where the fighter can be hit
    pub hurtbox: LocalBox,
    /// Where the fighter hits; only meaningful in the active phase of attacks
    #[serde(default)]
    pub hitboxes: Vec<LocalBox>,
}

impl PhaseData {
    /// A phase with a hurtbox and no hitboxes.
    pub fn passive(duration: u32, hurtbox: LocalBox) -> Self {
        Self {
            duration,
            hurtbox,
            hitboxes: Vec::new(),
        }
    }
}

/// Damage numbers of an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackData {
    /// Health removed on a clean hit
    pub damage: u32,
    /// Health removed through a block
    pub chip_damage: u32,
    /// Distance the defender slides on hit (half on block), world units
    pub pushback: i32,
    /// Freeze length on hit
    pub hitstop: u32,
    /// Extra stun ticks beyond the attacker's recovery (may be negative)
    #[serde(default)]
    pub hit_advantage: i32,
    /// Recovery ticks the attacker could cancel; shortens the stun
    #[serde(default)]
    pub block_cancel_window: u32,
    /// Ticks after the move ends during which no new attack can start
    #[serde(default)]
    pub cooldown: u32,
}

/// One entry of a move table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDefinition {
    /// Which move this defines
    pub id: MoveId,
    /// Wind-up
    pub startup: PhaseData,
    /// Hitting window
    pub active: PhaseData,
    /// Wind-down
    pub recovery: PhaseData,
    /// Present on attacks only
    #[serde(default)]
    pub attack: Option<AttackData>,
}

impl MoveDefinition {
    /// Non-attacking move using the same hurtbox throughout.
    pub fn stance(id: MoveId, frames: [u32; 3], hurtbox: LocalBox) -> Self {
        Self {
            id,
            startup: PhaseData::passive(frames[0], hurtbox),
            active: PhaseData::passive(frames[1], hurtbox),
            recovery: PhaseData::passive(frames[2], hurtbox),
            attack: None,
        }
    }

    /// Total length in ticks.
    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.startup
            .duration
            .saturating_add(self.active.duration)
            .saturating_add(self.recovery.duration)
    }

    /// Phase containing `frame`. Frames past the end report `Recovery`.
    pub fn phase_at(&self, frame: u32) -> Phase {
        if frame < self.startup.duration {
            Phase::Startup
        } else if frame < self.startup.duration.saturating_add(self.active.duration) {
            Phase::Active
        } else {
            Phase::Recovery
        }
    }

    /// Data for a phase.
    pub fn phase(&self, phase: Phase) -> &PhaseData {
        match phase {
            Phase::Startup => &self.startup,
            Phase::Active => &self.active,
            Phase::Recovery => &self.recovery,
        }
    }

    /// Hurtbox at `frame`.
    pub fn hurtbox_at(&self, frame: u32) -> &LocalBox {
        &self.phase(self.phase_at(frame)).hurtbox
    }

    /// Hitboxes live at `frame` (empty outside the active phase).
    pub fn hitboxes_at(&self, frame: u32) -> &[LocalBox] {
        match self.phase_at(frame) {
            Phase::Active => &self.active.hitboxes,
            _ => &[],
        }
    }

    /// Stun inflicted on a clean hit:
    /// `recovery - block_cancel_window + hit_advantage`, at least 1.
    pub fn hitstun_ticks(&self) -> Option<u32> {
        self.attack.map(|attack| {
            let ticks = self.recovery.duration as i64
                - attack.block_cancel_window as i64
                + attack.hit_advantage as i64;
            ticks.clamp(1, u32::MAX as i64) as u32
        })
    }

    fn validate(&self) -> Result<(), String> {
        for (phase, data) in [
            (Phase::Startup, &self.startup),
            (Phase::Active, &self.active),
            (Phase::Recovery, &self.recovery),
        ] {
            if data.duration == 0 {
                return Err(format!("{:?} {:?} has zero duration", self.id, phase));
            }
            if phase != Phase::Active && !data.hitboxes.is_empty() {
                return Err(format!("{:?} has hitboxes outside its active phase", self.id));
            }
            for b in std::iter::once(&data.hurtbox).chain(data.hitboxes.iter()) {
                if b.width < 0 || b.height < 0 {
                    return Err(format!("{:?} {:?} has a negative box extent", self.id, phase));
                }
                if !box_in_range(b) {
                    return Err(format!(
                        "{:?} {:?} has a box beyond ±{} units",
                        self.id, phase, WORLD_LIMIT
                    ));
                }
            }
        }

        match (self.id.is_attack(), &self.attack) {
            (true, None) => Err(format!("{:?} is an attack without attack data", self.id)),
            (true, Some(attack)) => {
                if self.active.hitboxes.is_empty() {
                    return Err(format!("{:?} has no active hitbox", self.id));
                }
                if attack.chip_damage > attack.damage {
                    return Err(format!(
                        "{:?} chip damage {} exceeds damage {}",
                        self.id, attack.chip_damage, attack.damage
                    ));
                }
                if attack.pushback < 0 {
                    return Err(format!("{:?} has negative pushback", self.id));
                }
                if attack.pushback > WORLD_LIMIT {
                    return Err(format!(
                        "{:?} pushback {} exceeds {} units",
                        self.id, attack.pushback, WORLD_LIMIT
                    ));
                }
                Ok(())
            }
            (false, Some(_)) => Err(format!("{:?} is not an attack but has attack data", self.id)),
            (false, None) => {
                if !self.active.hitboxes.is_empty() {
                    return Err(format!("{:?} is not an attack but has hitboxes", self.id));
                }
                Ok(())
            }
        }
    }
}

/// Offsets and extents all within the world limit.
fn box_in_range(b: &LocalBox) -> bool {
    [b.x, b.y, b.width, b.height]
        .iter()
        .all(|v| (-WORLD_LIMIT..=WORLD_LIMIT).contains(v))
}

// =============================================================================
// TABLE
// =============================================================================

/// Serialized form of a table, one entry per move.
#[derive(Serialize, Deserialize)]
struct MoveTableFile {
    name: String,
    body: LocalBox,
    moves: Vec<MoveDefinition>,
}

/// A character's complete move set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveTable {
    name: String,
    body: LocalBox,
    moves: BTreeMap<MoveId, MoveDefinition>,
}

impl MoveTable {
    /// Build and validate a table.
    pub fn new(
        name: impl Into<String>,
        body: LocalBox,
        moves: impl IntoIterator<Item = MoveDefinition>,
    ) -> Result<Self, CombatError> {
        let mut map = BTreeMap::new();
        for def in moves {
            let id = def.id;
            if map.insert(id, def).is_some() {
                return Err(CombatError::InvalidMoveTable(format!("duplicate move {:?}", id)));
            }
        }
        let table = Self {
            name: name.into(),
            body,
            moves: map,
        };
        table.validate()?;
        Ok(table)
    }

    /// The built-in character.
    pub fn standard() -> Self {
        let standing = LocalBox::centered(56, 98);
        let crouching = LocalBox::centered(56, 49);

        let punch = MoveDefinition {
            id: MoveId::Punch,
            startup: PhaseData::passive(4, standing),
            active: PhaseData {
                duration: 5,
                hurtbox: standing,
                hitboxes: vec![LocalBox::new(24, 41, 45, 16)],
            },
            recovery: PhaseData::passive(5, standing),
            attack: Some(AttackData {
                damage: 8,
                chip_damage: 1,
                pushback: 7,
                hitstop: 4,
                hit_advantage: 4,
                block_cancel_window: 0,
                cooldown: 8,
            }),
        };

        let kick = MoveDefinition {
            id: MoveId::Kick,
            startup: PhaseData::passive(6, standing),
            active: PhaseData {
                duration: 6,
                hurtbox: standing,
                hitboxes: vec![LocalBox::new(24, 40, 60, 18)],
            },
            recovery: PhaseData::passive(6, standing),
            attack: Some(AttackData {
                damage: 12,
                chip_damage: 2,
                pushback: 7,
                hitstop: 4,
                hit_advantage: 4,
                block_cancel_window: 0,
                cooldown: 8,
            }),
        };

        let mut moves = BTreeMap::new();
        for def in [
            MoveDefinition::stance(MoveId::Idle, [1, 1, 1], standing),
            MoveDefinition::stance(MoveId::Walk, [1, 1, 1], standing),
            MoveDefinition::stance(MoveId::Jump, [1, 1, 1], standing),
            MoveDefinition::stance(MoveId::Crouch, [1, 1, 1], crouching),
            MoveDefinition::stance(MoveId::Block, [1, 1, 1], standing),
            punch,
            kick,
        ] {
            moves.insert(def.id, def);
        }

        Self {
            name: "standard".into(),
            body: standing,
            moves,
        }
    }

    /// Parse a table from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let file: MoveTableFile = serde_json::from_str(json)
            .map_err(|e| CombatError::InvalidMoveTable(e.to_string()))?;
        Self::new(file.name, file.body, file.moves)
    }

    /// Serialize to the JSON form accepted by [`MoveTable::from_json`].
    pub fn to_json(&self) -> String {
        let file = MoveTableFile {
            name: self.name.clone(),
            body: self.body,
            moves: self.moves.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file).unwrap_or_default()
    }

    /// Look up a move.
    pub fn lookup(&self, id: MoveId) -> Result<&MoveDefinition, CombatError> {
        self.moves.get(&id).ok_or(CombatError::UnknownMove(id))
    }

    /// Character name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Push box used for arena clamping and body separation.
    pub fn body(&self) -> &LocalBox {
        &self.body
    }

    /// Check every invariant a table must hold before a round can start.
    pub fn validate(&self) -> Result<(), CombatError> {
        if self.body.width <= 0 || self.body.height <= 0 {
            return Err(CombatError::InvalidMoveTable(format!(
                "{}: body must have positive size",
                self.name
            )));
        }
        if !box_in_range(&self.body) {
            return Err(CombatError::InvalidMoveTable(format!(
                "{}: body exceeds ±{} units",
                self.name, WORLD_LIMIT
            )));
        }
        for id in MoveId::ALL {
            let def = self.moves.get(&id).ok_or_else(|| {
                CombatError::InvalidMoveTable(format!("{}: missing move {:?}", self.name, id))
            })?;
            if def.id != id {
                return Err(CombatError::InvalidMoveTable(format!(
                    "{}: entry {:?} is keyed as {:?}",
                    self.name, def.id, id
                )));
            }
            def.validate()
                .map_err(|msg| CombatError::InvalidMoveTable(format!("{}: {}", self.name, msg)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_valid() {
        let table = MoveTable::standard();
        assert!(table.validate().is_ok());
        assert_eq!(table.body().width, 56);
        for id in MoveId::ALL {
            assert!(table.lookup(id).is_ok());
        }
    }

    #[test]
    fn test_punch_frame_data() {
        let table = MoveTable::standard();
        let punch = table.lookup(MoveId::Punch).unwrap();
        assert_eq!(punch.total_frames(), 14);
        assert_eq!(punch.phase_at(0), Phase::Startup);
        assert_eq!(punch.phase_at(3), Phase::Startup);
        assert_eq!(punch.phase_at(4), Phase::Active);
        assert_eq!(punch.phase_at(8), Phase::Active);
        assert_eq!(punch.phase_at(9), Phase::Recovery);
        assert_eq!(punch.phase_at(13), Phase::Recovery);

        assert!(punch.hitboxes_at(3).is_empty());
        assert_eq!(punch.hitboxes_at(4).len(), 1);
        assert!(punch.hitboxes_at(9).is_empty());
        assert_eq!(punch.hitstun_ticks(), Some(9));
        assert_eq!(punch.attack.unwrap().cooldown, 8);
    }

    #[test]
    fn test_kick_frame_data() {
        let table = MoveTable::standard();
        let kick = table.lookup(MoveId::Kick).unwrap();
        assert_eq!(kick.total_frames(), 18);
        assert_eq!(kick.attack.unwrap().damage, 12);
        assert_eq!(kick.hitboxes_at(6)[0].width, 60);
    }

    #[test]
    fn test_crouch_hurtbox_is_shorter() {
        let table = MoveTable::standard();
        let crouch = table.lookup(MoveId::Crouch).unwrap();
        let idle = table.lookup(MoveId::Idle).unwrap();
        assert_eq!(crouch.hurtbox_at(0).height, 49);
        assert_eq!(idle.hurtbox_at(0).height, 98);
        assert_eq!(idle.hitstun_ticks(), None);
    }

    #[test]
    fn test_hitstun_minimum_one() {
        let table = MoveTable::standard();
        let mut punch = table.lookup(MoveId::Punch).unwrap().clone();
        if let Some(attack) = punch.attack.as_mut() {
            attack.hit_advantage = -50;
        }
        assert_eq!(punch.hitstun_ticks(), Some(1));
    }

    #[test]
    fn test_json_round_trip() {
        let table = MoveTable::standard();
        let parsed = MoveTable::from_json(&table.to_json()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_missing_move_rejected() {
        let table = MoveTable::standard();
        let moves: Vec<_> = MoveId::ALL
            .iter()
            .filter(|id| **id != MoveId::Kick)
            .map(|id| table.lookup(*id).unwrap().clone())
            .collect();
        let err = MoveTable::new("broken", *table.body(), moves);
        assert!(matches!(err, Err(CombatError::InvalidMoveTable(_))));
    }

    #[test]
    fn test_duplicate_move_rejected() {
        let table = MoveTable::standard();
        let mut moves: Vec<_> = MoveId::ALL.iter().map(|id| table.lookup(*id).unwrap().clone()).collect();
        moves.push(table.lookup(MoveId::Idle).unwrap().clone());
        assert!(MoveTable::new("dup", *table.body(), moves).is_err());
    }

    fn table_with<F: FnOnce(&mut MoveDefinition)>(id: MoveId, edit: F) -> Result<MoveTable, CombatError> {
        let table = MoveTable::standard();
        let mut moves: Vec<_> = MoveId::ALL.iter().map(|m| table.lookup(*m).unwrap().clone()).collect();
        if let Some(def) = moves.iter_mut().find(|d| d.id == id) {
            edit(def);
        }
        MoveTable::new("edited", *table.body(), moves)
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        assert!(table_with(MoveId::Punch, |d| d.startup.duration = 0).is_err());
        assert!(table_with(MoveId::Punch, |d| d.active.hitboxes.clear()).is_err());
        assert!(table_with(MoveId::Punch, |d| d.attack = None).is_err());
        assert!(table_with(MoveId::Kick, |d| {
            if let Some(a) = d.attack.as_mut() {
                a.chip_damage = a.damage + 1;
            }
        })
        .is_err());
        assert!(table_with(MoveId::Idle, |d| d.active.hitboxes.push(LocalBox::new(0, 0, 5, 5))).is_err());
        assert!(table_with(MoveId::Walk, |d| d.recovery.hitboxes.push(LocalBox::new(0, 0, 5, 5))).is_err());
        // Unchanged edit stays valid
        assert!(table_with(MoveId::Idle, |_| {}).is_ok());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let pushback = |n: i32| {
            table_with(MoveId::Punch, move |d| {
                if let Some(a) = d.attack.as_mut() {
                    a.pushback = n;
                }
            })
        };
        assert!(pushback(WORLD_LIMIT).is_ok());
        assert!(pushback(WORLD_LIMIT + 1).is_err());

        assert!(table_with(MoveId::Kick, |d| d.active.hitboxes[0].width = 40_000).is_err());
        assert!(table_with(MoveId::Idle, |d| d.startup.hurtbox.x = -20_000).is_err());

        let table = MoveTable::standard();
        let moves: Vec<_> = MoveId::ALL.iter().map(|m| table.lookup(*m).unwrap().clone()).collect();
        assert!(MoveTable::new("giant", LocalBox::centered(56, 50_000), moves).is_err());
    }

    #[test]
    fn test_huge_pushback_json_rejected() {
        let json = MoveTable::standard()
            .to_json()
            .replacen("\"pushback\": 7", "\"pushback\": 32767", 1);
        assert!(json.contains("32767"));
        assert!(matches!(
            MoveTable::from_json(&json),
            Err(CombatError::InvalidMoveTable(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            MoveTable::from_json(r#"{ "name": "x" }"#),
            Err(CombatError::InvalidMoveTable(_))
        ));
    }
}
