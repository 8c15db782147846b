//! Combat Resolver
//!
//! Runs once per tick after both fighters have stepped. Hits for both sides
//! are detected against the same pre-resolution state and then applied, so
//! simultaneous hits trade instead of cancelling.

use crate::config::{ArenaConfig, CombatRules};
use crate::core::fixed::{Fixed, from_int};
use crate::game::collision::{clamp_to_arena, detect_hit};
use crate::game::error::CombatError;
use crate::game::fighter::apply_hitstop;
use crate::game::moves::{AttackData, MoveId, MoveTable};
use crate::game::state::{FighterState, FighterStatus, PendingStun};

/// What one fighter's attack did this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HitOutcome {
    /// Nothing connected
    #[default]
    Miss,
    /// Clean hit
    Hit {
        /// Attack that landed
        move_id: MoveId,
        /// Health removed
        damage: u32,
    },
    /// Blocked
    Blocked {
        /// Attack that was blocked
        move_id: MoveId,
        /// Chip damage dealt through the block
        chip: u32,
    },
}

/// Detect and apply hits for both fighters.
///
/// Returns the outcome of each fighter's attack, indexed by slot. Does
/// nothing while either fighter is in hitstop.
pub fn resolve(
    fighters: &mut [FighterState; 2],
    tables: [&MoveTable; 2],
    rules: &CombatRules,
    arena: &ArenaConfig,
) -> Result<[HitOutcome; 2], CombatError> {
    let mut outcomes = [HitOutcome::Miss; 2];
    if fighters.iter().any(|f| f.in_hitstop()) {
        return Ok(outcomes);
    }

    let landed = [
        detect_hit(&fighters[0], tables[0], &fighters[1], tables[1])?,
        detect_hit(&fighters[1], tables[1], &fighters[0], tables[0])?,
    ];
    if !landed[0] && !landed[1] {
        return Ok(outcomes);
    }

    // Decisions use the state before any hit was applied
    let before = fighters.clone();

    for attacker_idx in 0..2 {
        if !landed[attacker_idx] {
            continue;
        }
        let defender_idx = 1 - attacker_idx;
        let move_id = before[attacker_idx].current_move;
        let Some(attack) = tables[attacker_idx].lookup(move_id)?.attack else {
            continue;
        };
        let hitstun = tables[attacker_idx]
            .lookup(move_id)?
            .hitstun_ticks()
            .unwrap_or(1);
        let blocked = is_blocking(&before[defender_idx], &before[attacker_idx], rules);

        let (attacker, defender) = pair_mut(fighters, attacker_idx);
        attacker.attack_connected = true;

        outcomes[attacker_idx] = if blocked {
            apply_block(attacker, defender, &attack, move_id)
        } else {
            apply_hit(attacker, defender, &attack, move_id, hitstun)
        };

        let pushback = match outcomes[attacker_idx] {
            HitOutcome::Blocked { .. } => from_int(attack.pushback) >> 1,
            _ => from_int(attack.pushback),
        };
        push_back(
            attacker,
            tables[attacker_idx],
            defender,
            tables[defender_idx],
            pushback,
            rules.corner_pushback,
            arena,
        );

        match outcomes[attacker_idx] {
            HitOutcome::Hit { damage, .. } => tracing::debug!(
                attacker = ?attacker.slot,
                mv = ?move_id,
                damage,
                defender_health = defender.health,
                "hit"
            ),
            HitOutcome::Blocked { chip, .. } => tracing::debug!(
                attacker = ?attacker.slot,
                mv = ?move_id,
                chip,
                defender_health = defender.health,
                "blocked"
            ),
            HitOutcome::Miss => {}
        }
    }

    Ok(outcomes)
}

/// Whether `defender` blocks an attack coming from `attacker`.
pub fn is_blocking(defender: &FighterState, attacker: &FighterState, rules: &CombatRules) -> bool {
    if defender.status != FighterStatus::Blocking {
        return false;
    }
    if defender.airborne && !rules.allow_air_block {
        return false;
    }
    if rules.require_facing_to_block {
        let dx = attacker.position.x - defender.position.x;
        if dx.signum() != 0 && dx.signum() != defender.facing.sign() {
            return false;
        }
    }
    true
}

fn apply_block(
    attacker: &mut FighterState,
    defender: &mut FighterState,
    attack: &AttackData,
    move_id: MoveId,
) -> HitOutcome {
    let chip = attack.chip_damage.min(defender.health);
    defender.health -= chip;
    apply_hitstop(attacker, (attack.hitstop / 2).max(1));
    HitOutcome::Blocked { move_id, chip }
}

fn apply_hit(
    attacker: &mut FighterState,
    defender: &mut FighterState,
    attack: &AttackData,
    move_id: MoveId,
    hitstun: u32,
) -> HitOutcome {
    let damage = attack.damage.min(defender.health);
    defender.health -= damage;

    // Cancel whatever the defender was doing
    defender.start_move(MoveId::Idle);
    defender.velocity.x = 0;
    defender.pending_stun = Some(PendingStun {
        knockback: defender.airborne,
        ticks: hitstun,
    });

    apply_hitstop(defender, attack.hitstop);
    apply_hitstop(attacker, attack.hitstop);
    HitOutcome::Hit { move_id, damage }
}

/// Slide a grounded defender away from the attacker. With `corner_pushback`,
/// what the wall absorbs moves the attacker back instead. Airborne
/// defenders keep their trajectory.
fn push_back(
    attacker: &mut FighterState,
    attacker_table: &MoveTable,
    defender: &mut FighterState,
    defender_table: &MoveTable,
    distance: Fixed,
    corner_pushback: bool,
    arena: &ArenaConfig,
) {
    if defender.airborne {
        return;
    }
    let direction = match (defender.position.x - attacker.position.x).signum() {
        0 => attacker.facing.sign(),
        s => s,
    };
    defender.position.x += direction * distance;
    let absorbed = clamp_to_arena(defender, defender_table, arena);
    if corner_pushback && absorbed != 0 {
        attacker.position.x += absorbed;
        clamp_to_arena(attacker, attacker_table, arena);
    }
}

fn pair_mut(fighters: &mut [FighterState; 2], first: usize) -> (&mut FighterState, &mut FighterState) {
    let [a, b] = fighters;
    if first == 0 { (a, b) } else { (b, a) }
}
