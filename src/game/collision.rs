//! Collision Detection
//!
//! World-space boxes for fighters: hit detection, arena walls and keeping
//! the two bodies from overlapping.

use crate::config::ArenaConfig;
use crate::core::fixed::Fixed;
use crate::core::rect::{Rect, overlaps};
use crate::game::error::CombatError;
use crate::game::moves::{MoveTable, Phase};
use crate::game::state::{FighterState, FighterStatus};

/// Live attack boxes of a fighter this tick.
///
/// Empty unless the fighter is performing an attack, is in its active phase
/// and has not already connected with it.
pub fn active_hitboxes(fighter: &FighterState, table: &MoveTable) -> Result<Vec<Rect>, CombatError> {
    if fighter.status != FighterStatus::Attacking
        || fighter.phase != Phase::Active
        || fighter.attack_connected
    {
        return Ok(Vec::new());
    }

    let def = table.lookup(fighter.current_move)?;
    Ok(def
        .hitboxes_at(fighter.move_frame)
        .iter()
        .map(|local| Rect::from_local(fighter.position, local, fighter.facing))
        .collect())
}

/// Whether any of the attacker's live boxes touch the defender's hurtbox.
pub fn detect_hit(
    attacker: &FighterState,
    attacker_table: &MoveTable,
    defender: &FighterState,
    defender_table: &MoveTable,
) -> Result<bool, CombatError> {
    let hitboxes = active_hitboxes(attacker, attacker_table)?;
    if hitboxes.is_empty() {
        return Ok(false);
    }
    let hurtbox = defender.hurtbox_rect(defender_table)?;
    Ok(hitboxes.iter().any(|hit| overlaps(hit, &hurtbox)))
}

/// Push a fighter back inside the arena walls.
///
/// Returns the signed shift applied to x (0 when already inside).
pub fn clamp_to_arena(fighter: &mut FighterState, table: &MoveTable, arena: &ArenaConfig) -> Fixed {
    let body = fighter.body_rect(table);
    let left = arena.left_fixed();
    let right = arena.right_fixed();

    let shift = if body.x < left {
        left - body.x
    } else if body.right() > right {
        right - body.right()
    } else {
        0
    };
    fighter.position.x = fighter.position.x.wrapping_add(shift);
    shift
}

/// Fail if the body pokes outside the arena.
pub fn check_bounds(fighter: &FighterState, table: &MoveTable, arena: &ArenaConfig) -> Result<(), CombatError> {
    let body = fighter.body_rect(table);
    if body.x < arena.left_fixed() || body.right() > arena.right_fixed() {
        return Err(CombatError::OutOfBounds {
            slot: fighter.slot,
            x: fighter.position.x,
        });
    }
    Ok(())
}

/// Push overlapping bodies apart.
///
/// Only side-by-side overlap is resolved (overlap narrower than it is tall);
/// a fighter dropping onto the other's head passes by. Each body moves half
/// the overlap; if a wall stops one, the other takes the rest.
pub fn separate_bodies(
    fighters: &mut [FighterState; 2],
    tables: [&MoveTable; 2],
    arena: &ArenaConfig,
) {
    let a = fighters[0].body_rect(tables[0]);
    let b = fighters[1].body_rect(tables[1]);
    if !overlaps(&a, &b) {
        return;
    }
    let overlap_w = a.overlap_width(&b);
    if overlap_w >= a.overlap_height(&b) {
        return;
    }

    // Which one goes left: by body centre, then by P1's facing
    let first_goes_left = match a.center_x().cmp(&b.center_x()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => fighters[0].facing.sign() > 0,
    };
    let (left_idx, right_idx) = if first_goes_left { (0, 1) } else { (1, 0) };

    let half = (overlap_w + 1) >> 1;
    fighters[left_idx].position.x -= half;
    fighters[right_idx].position.x += overlap_w - half;

    clamp_to_arena(&mut fighters[left_idx], tables[left_idx], arena);
    clamp_to_arena(&mut fighters[right_idx], tables[right_idx], arena);

    // A wall stopped one of them: hand the remainder to the other
    let left_body = fighters[left_idx].body_rect(tables[left_idx]);
    let right_body = fighters[right_idx].body_rect(tables[right_idx]);
    let remaining = left_body.right() - right_body.x;
    if remaining > 0 {
        if left_body.x <= arena.left_fixed() {
            fighters[right_idx].position.x += remaining;
            clamp_to_arena(&mut fighters[right_idx], tables[right_idx], arena);
        } else {
            fighters[left_idx].position.x -= remaining;
            clamp_to_arena(&mut fighters[left_idx], tables[left_idx], arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::from_int;
    use crate::core::rect::Facing;
    use crate::game::moves::MoveId;
    use crate::game::state::PlayerSlot;

    fn pair(x1: i32, x2: i32) -> [FighterState; 2] {
        [
            FighterState::new(PlayerSlot::P1, x1, Facing::Right, 100),
            FighterState::new(PlayerSlot::P2, x2, Facing::Left, 100),
        ]
    }

    fn in_active_punch(f: &mut FighterState) {
        f.start_move(MoveId::Punch);
        f.move_frame = 4;
        f.phase = Phase::Active;
    }

    #[test]
    fn test_no_hitboxes_outside_active() {
        let table = MoveTable::standard();
        let mut f = pair(300, 350)[0].clone();
        f.start_move(MoveId::Punch);
        assert!(active_hitboxes(&f, &table).unwrap().is_empty());

        in_active_punch(&mut f);
        assert_eq!(active_hitboxes(&f, &table).unwrap().len(), 1);

        f.attack_connected = true;
        assert!(active_hitboxes(&f, &table).unwrap().is_empty());
    }

    #[test]
    fn test_punch_range() {
        let table = MoveTable::standard();
        // Punch reaches anchor + 24 + 45 = 69; defender hurtbox starts 28 left of its anchor
        let mut near = pair(300, 396);
        in_active_punch(&mut near[0]);
        assert!(detect_hit(&near[0], &table, &near[1], &table).unwrap());

        // Exactly touching: 300 + 69 = 369 = 397 - 28
        let mut touching = pair(300, 397);
        in_active_punch(&mut touching[0]);
        assert!(!detect_hit(&touching[0], &table, &touching[1], &table).unwrap());
    }

    #[test]
    fn test_punch_height_vs_crouch() {
        let table = MoveTable::standard();
        let mut fighters = pair(300, 360);
        in_active_punch(&mut fighters[0]);
        fighters[1].start_move(MoveId::Crouch);
        // Punch box starts at y = 41, crouch hurtbox ends at 49
        assert!(detect_hit(&fighters[0], &table, &fighters[1], &table).unwrap());

        let mut high = fighters.clone();
        high[0].position.y = from_int(10);
        assert!(!detect_hit(&high[0], &table, &high[1], &table).unwrap());
    }

    #[test]
    fn test_clamp_to_arena() {
        let table = MoveTable::standard();
        let arena = ArenaConfig::default();
        let mut f = pair(10, 500)[0].clone();
        let shift = clamp_to_arena(&mut f, &table, &arena);
        assert_eq!(f.position.x, from_int(68));
        assert_eq!(shift, from_int(58));
        assert!(check_bounds(&f, &table, &arena).is_ok());

        let mut g = pair(990, 500)[0].clone();
        clamp_to_arena(&mut g, &table, &arena);
        assert_eq!(g.position.x, from_int(932));
    }

    #[test]
    fn test_check_bounds_reports_slot() {
        let table = MoveTable::standard();
        let arena = ArenaConfig::default();
        let f = pair(500, 2000)[1].clone();
        assert!(matches!(
            check_bounds(&f, &table, &arena),
            Err(CombatError::OutOfBounds { slot: PlayerSlot::P2, .. })
        ));
    }

    #[test]
    fn test_separate_bodies_midstage() {
        let table = MoveTable::standard();
        let arena = ArenaConfig::default();
        let mut fighters = pair(480, 520);
        separate_bodies(&mut fighters, [&table, &table], &arena);

        let a = fighters[0].body_rect(&table);
        let b = fighters[1].body_rect(&table);
        assert!(!overlaps(&a, &b));
        assert_eq!(fighters[0].position.x, from_int(472));
        assert_eq!(fighters[1].position.x, from_int(528));
    }

    #[test]
    fn test_separate_bodies_against_wall() {
        let table = MoveTable::standard();
        let arena = ArenaConfig::default();
        let mut fighters = pair(68, 90);
        separate_bodies(&mut fighters, [&table, &table], &arena);

        assert_eq!(fighters[0].position.x, from_int(68));
        assert_eq!(fighters[1].position.x, from_int(124));
        assert!(!overlaps(&fighters[0].body_rect(&table), &fighters[1].body_rect(&table)));
    }

    #[test]
    fn test_separate_bodies_ignores_vertical_stack() {
        let table = MoveTable::standard();
        let arena = ArenaConfig::default();
        let mut fighters = pair(500, 505);
        fighters[1].position.y = from_int(90);
        let before = fighters.clone();
        separate_bodies(&mut fighters, [&table, &table], &arena);
        assert_eq!(fighters, before);
    }
}
