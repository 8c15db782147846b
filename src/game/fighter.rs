//! Fighter State Machine
//!
//! Advances one fighter by one tick:
//!
//! ```text
//! stunned?  ── yes ──▶ count down stun ─────────────────────┐
//!    │ no                                                   │
//!    ▼                                                      ▼
//! advance move frame ▶ resolve intent ▶ face opponent ▶ integrate ▶ clamp to arena
//! ```
//!
//! Hitstop never reaches [`step`]: the whole simulation freezes while either
//! fighter is in hitstop and only [`tick_hitstop`] runs.

use crate::config::{ArenaConfig, CombatRules, Physics};
use crate::core::fixed::{Fixed, fixed_abs, fixed_mul};
use crate::core::rect::Facing;
use crate::game::collision::{check_bounds, clamp_to_arena};
use crate::game::error::CombatError;
use crate::game::input::{InputFrame, Intent, resolve_intent};
use crate::game::moves::{MoveId, MoveTable};
use crate::game::state::{FighterState, FighterStatus};

/// Everything a fighter step reads besides the fighter itself.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// The fighter's own move table
    pub table: &'a MoveTable,
    /// Fixed-point movement tuning
    pub physics: &'a Physics,
    /// Walls
    pub arena: &'a ArenaConfig,
    /// Block rules
    pub rules: &'a CombatRules,
    /// Opponent anchor x, for facing
    pub opponent_x: Fixed,
}

/// Advance a fighter one tick.
///
/// Returns `true` when the fighter read its input this tick (it was not
/// stunned), so the caller knows to remember `input` for edge detection.
pub fn step(
    fighter: &mut FighterState,
    input: InputFrame,
    previous: InputFrame,
    ctx: &StepContext<'_>,
) -> Result<bool, CombatError> {
    if fighter.in_hitstop() {
        tick_hitstop(fighter);
        return Ok(false);
    }

    let read_input = if fighter.is_stunned() {
        fighter.status_timer = fighter.status_timer.saturating_sub(1);
        false
    } else {
        advance_move(fighter, ctx.table)?;

        #[cfg(any(debug_assertions, feature = "debug-tracing"))]
        if input != previous {
            if let Err(e) = input.validate() {
                tracing::debug!(slot = ?fighter.slot, flags = input.flags, "{}", e);
            }
        }

        // Attack buttons are dead until the last attack cools down
        let input = if fighter.attack_cooldown > 0 {
            InputFrame::from_bits(input.flags & !(InputFrame::FLAG_PUNCH | InputFrame::FLAG_KICK))
        } else {
            input
        };
        let intent = resolve_intent(input, previous);
        apply_intent(fighter, intent, ctx);
        face_opponent(fighter, ctx.opponent_x);
        true
    };
    fighter.attack_cooldown = fighter.attack_cooldown.saturating_sub(1);

    integrate(fighter, ctx.physics);

    if fighter.is_stunned() && fighter.status_timer == 0 {
        let can_recover = fighter.status == FighterStatus::Hitstun || !fighter.airborne;
        if can_recover {
            fighter.start_move(if fighter.airborne { MoveId::Jump } else { MoveId::Idle });
        }
    }

    clamp_to_arena(fighter, ctx.table, ctx.arena);
    check_bounds(fighter, ctx.table, ctx.arena)?;

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        slot = ?fighter.slot,
        pos = %fighter.position,
        mv = ?fighter.current_move,
        frame = fighter.move_frame,
        status = ?fighter.status,
        "fighter step"
    );

    Ok(read_input)
}

/// Advance `move_frame`, moving through phases and finishing attacks.
pub fn advance_move(fighter: &mut FighterState, table: &MoveTable) -> Result<(), CombatError> {
    let def = table.lookup(fighter.current_move)?;
    let total = def.total_frames();
    let next = fighter.move_frame.saturating_add(1);

    if next < total {
        fighter.move_frame = next;
    } else if fighter.current_move.is_attack() {
        let after = if fighter.airborne { MoveId::Jump } else { MoveId::Idle };
        fighter.start_move(after);
        fighter.attack_cooldown = def.attack.map_or(0, |attack| attack.cooldown);
        return Ok(());
    } else if fighter.current_move == MoveId::Jump {
        // Hold the last frame until landing
        fighter.move_frame = total.saturating_sub(1);
    } else {
        fighter.move_frame = 0;
    }
    fighter.phase = def.phase_at(fighter.move_frame);
    Ok(())
}

fn apply_intent(fighter: &mut FighterState, intent: Intent, ctx: &StepContext<'_>) {
    // Attacks cannot be cancelled
    if fighter.attack_in_progress() {
        return;
    }

    let grounded = !fighter.airborne;
    match intent {
        Intent::Block => {
            if (grounded || ctx.rules.allow_air_block) && fighter.current_move != MoveId::Block {
                fighter.start_move(MoveId::Block);
            }
        }
        Intent::Kick => fighter.start_move(MoveId::Kick),
        Intent::Punch => fighter.start_move(MoveId::Punch),
        Intent::Jump if grounded => {
            fighter.velocity.y = ctx.physics.jump_speed;
            fighter.airborne = true;
            fighter.start_move(MoveId::Jump);
        }
        Intent::Crouch if grounded => {
            if fighter.current_move != MoveId::Crouch {
                fighter.start_move(MoveId::Crouch);
            }
        }
        Intent::Move(direction) => {
            fighter.velocity.x = direction.sign() * ctx.physics.move_speed;
            if grounded {
                if fighter.current_move != MoveId::Walk {
                    fighter.start_move(MoveId::Walk);
                }
            } else if fighter.current_move != MoveId::Jump {
                fighter.start_move(MoveId::Jump);
            }
        }
        _ => {
            let stance = if grounded { MoveId::Idle } else { MoveId::Jump };
            if fighter.current_move != stance {
                fighter.start_move(stance);
            }
        }
    }
}

fn face_opponent(fighter: &mut FighterState, opponent_x: Fixed) {
    if fighter.attack_in_progress() {
        return;
    }
    if opponent_x > fighter.position.x {
        fighter.facing = Facing::Right;
    } else if opponent_x < fighter.position.x {
        fighter.facing = Facing::Left;
    }
}

/// Gravity, integration, landing and ground friction.
pub fn integrate(fighter: &mut FighterState, physics: &Physics) {
    if fighter.airborne {
        fighter.velocity.y = (fighter.velocity.y - physics.gravity).max(-physics.max_fall);
    }

    fighter.position = fighter.position + fighter.velocity;

    if fighter.airborne && fighter.position.y <= 0 {
        fighter.position.y = 0;
        fighter.velocity.y = 0;
        fighter.airborne = false;
        if fighter.current_move == MoveId::Jump && !fighter.is_stunned() {
            fighter.start_move(MoveId::Idle);
        }
    }

    if !fighter.airborne && fighter.current_move != MoveId::Walk {
        fighter.velocity.x = fixed_mul(fighter.velocity.x, physics.friction);
        if fixed_abs(fighter.velocity.x) < physics.stop_threshold {
            fighter.velocity.x = 0;
        }
    }
}

// =============================================================================
// HITSTOP
// =============================================================================

/// Put a fighter into hitstop, keeping the longer freeze if already frozen.
///
/// A zero-length hitstop starts any queued stun immediately.
pub fn apply_hitstop(fighter: &mut FighterState, ticks: u32) {
    if ticks == 0 {
        if !fighter.in_hitstop() {
            end_hitstop(fighter);
        }
        return;
    }
    if fighter.in_hitstop() {
        fighter.status_timer = fighter.status_timer.max(ticks);
    } else {
        fighter.status = FighterStatus::Hitstop;
        fighter.status_timer = ticks;
    }
}

/// Count down hitstop. Returns `true` on the tick it expires.
pub fn tick_hitstop(fighter: &mut FighterState) -> bool {
    if !fighter.in_hitstop() {
        return false;
    }
    fighter.status_timer = fighter.status_timer.saturating_sub(1);
    if fighter.status_timer == 0 {
        end_hitstop(fighter);
        true
    } else {
        false
    }
}

/// Leave hitstop: start the queued stun, or go back to what the move implies.
fn end_hitstop(fighter: &mut FighterState) {
    match fighter.pending_stun.take() {
        Some(stun) => {
            fighter.status = if stun.knockback {
                FighterStatus::Knockback
            } else {
                FighterStatus::Hitstun
            };
            fighter.status_timer = stun.ticks;
        }
        None => {
            fighter.status = FighterState::status_for(fighter.current_move);
            fighter.status_timer = 0;
        }
    }
}
