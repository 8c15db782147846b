//! Authoritative Simulation Tick
//!
//! [`Simulation`] owns both fighters and the round. One call to
//! [`Simulation::tick`] advances everything by one fixed step:
//!
//! ```text
//! round countdowns ─▶ P1 step ─▶ P2 step ─▶ body separation ─▶ combat ─▶ KO / timer
//! ```
//!
//! # Determinism
//!
//! - Fixed-point math only; floats are converted once in `new`
//! - Fighters are always processed P1 then P2
//! - No clocks, no randomness

use std::sync::Arc;

use crate::config::{Physics, RoundConfig, SimConfig};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rect::Facing;
use crate::game::collision::{check_bounds, clamp_to_arena, separate_bodies};
use crate::game::combat::{self, HitOutcome};
use crate::game::error::CombatError;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::fighter::{self, StepContext, tick_hitstop};
use crate::game::input::{InputFrame, PlayerInputBuffer};
use crate::game::moves::MoveTable;
use crate::game::round::{RoundController, TickPlan};
use crate::game::state::{FighterState, PlayerSlot, RoundState, SimSnapshot};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in (priority, slot) order
    pub events: Vec<GameEvent>,
    /// A round was decided this tick
    pub round_ended: bool,
    /// The match is over (set on every tick from the deciding one on)
    pub match_over: bool,
}

/// The combat simulation.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimConfig,
    physics: Physics,
    tables: [Arc<MoveTable>; 2],
    fighters: [FighterState; 2],
    prev_inputs: [InputFrame; 2],
    round: RoundController,
    tick: u32,
    paused: bool,
    terminated: bool,
    pending_events: Vec<GameEvent>,
}

impl Simulation {
    /// Build a simulation at the intro of round one.
    ///
    /// Fails if the config is invalid, either move table is malformed, or
    /// the arena cannot hold both fighters.
    pub fn new(config: SimConfig, tables: [Arc<MoveTable>; 2]) -> Result<Self, CombatError> {
        config.validate()?;
        for table in &tables {
            table.validate()?;
        }
        let combined = tables[0].body().width.saturating_add(tables[1].body().width);
        if config.arena.width() < combined {
            return Err(CombatError::InvalidConfig(format!(
                "arena width {} cannot hold fighters {} wide",
                config.arena.width(),
                combined
            )));
        }

        let physics = config.physics.to_physics();
        let round = RoundController::new(config.round.clone());
        let fighters = spawn_fighters(&config, &tables);

        tracing::debug!(
            p1 = tables[0].name(),
            p2 = tables[1].name(),
            round_ticks = config.round.round_ticks(),
            "simulation created"
        );

        Ok(Self {
            config,
            physics,
            tables,
            fighters,
            prev_inputs: [InputFrame::new(); 2],
            round,
            tick: 0,
            paused: false,
            terminated: false,
            pending_events: Vec::new(),
        })
    }

    /// Run one simulation tick.
    ///
    /// Paused ticks and ticks after the match is over change nothing and do
    /// not advance the tick counter.
    pub fn tick(&mut self, inputs: [InputFrame; 2]) -> Result<TickResult, CombatError> {
        if self.terminated {
            return Err(CombatError::Terminated);
        }

        let mut result = TickResult {
            events: std::mem::take(&mut self.pending_events),
            ..Default::default()
        };
        if self.paused {
            result.match_over = self.round.state().is_match_over();
            return Ok(result);
        }

        let now = self.tick;
        match self.round.begin_tick(now, &mut result.events) {
            TickPlan::Halted => {
                result.match_over = true;
                return Ok(result);
            }
            TickPlan::Hold => {
                self.prev_inputs = inputs;
            }
            TickPlan::NewRound => {
                self.fighters = spawn_fighters(&self.config, &self.tables);
                self.prev_inputs = inputs;
            }
            TickPlan::Fight => {
                self.fight(now, inputs, &mut result.events)?;
                result.round_ended = self.round.observe(now, &self.fighters, &mut result.events);
            }
        }

        self.tick = self.tick.wrapping_add(1);
        result.events.sort();
        result.match_over = self.round.state().is_match_over();
        Ok(result)
    }

    fn fight(&mut self, now: u32, inputs: [InputFrame; 2], events: &mut Vec<GameEvent>) -> Result<(), CombatError> {
        // Global hitstop freeze: only hitstop timers run
        if self.fighters.iter().any(|f| f.in_hitstop()) {
            for f in self.fighters.iter_mut() {
                tick_hitstop(f);
            }
            #[cfg(feature = "debug-tracing")]
            tracing::trace!(tick = now, "hitstop freeze");
            return Ok(());
        }

        for slot in PlayerSlot::ALL {
            let i = slot.index();
            let ctx = StepContext {
                table: &self.tables[i],
                physics: &self.physics,
                arena: &self.config.arena,
                rules: &self.config.combat,
                opponent_x: self.fighters[1 - i].position.x,
            };
            if fighter::step(&mut self.fighters[i], inputs[i], self.prev_inputs[i], &ctx)? {
                self.prev_inputs[i] = inputs[i];
            }
        }

        let tables = [self.tables[0].as_ref(), self.tables[1].as_ref()];
        separate_bodies(&mut self.fighters, tables, &self.config.arena);
        for (f, table) in self.fighters.iter().zip(tables) {
            check_bounds(f, table, &self.config.arena)?;
        }

        let outcomes = combat::resolve(&mut self.fighters, tables, &self.config.combat, &self.config.arena)?;
        for slot in PlayerSlot::ALL {
            let defender_health = self.fighters[slot.opponent().index()].health;
            match outcomes[slot.index()] {
                HitOutcome::Hit { move_id, damage } => {
                    events.push(GameEvent::hit_landed(now, slot, move_id, damage, defender_health));
                }
                HitOutcome::Blocked { move_id, chip } => {
                    events.push(GameEvent::attack_blocked(now, slot, move_id, chip, defender_health));
                }
                HitOutcome::Miss => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Stop advancing. Ticks while paused mutate nothing.
    pub fn pause(&mut self) {
        if !self.paused && !self.terminated {
            self.paused = true;
            tracing::debug!(tick = self.tick, "paused");
            self.pending_events.push(GameEvent::control(self.tick, GameEventData::Paused));
        }
    }

    /// Continue after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        if self.paused && !self.terminated {
            self.paused = false;
            tracing::debug!(tick = self.tick, "resumed");
            self.pending_events.push(GameEvent::control(self.tick, GameEventData::Resumed));
        }
    }

    /// Start a new match with a different round structure. Arena, physics
    /// and move tables are kept.
    pub fn reset(&mut self, round: RoundConfig) -> Result<(), CombatError> {
        if self.terminated {
            return Err(CombatError::Terminated);
        }
        let mut config = self.config.clone();
        config.round = round;
        config.validate()?;

        self.round = RoundController::new(config.round.clone());
        self.fighters = spawn_fighters(&config, &self.tables);
        self.config = config;
        self.prev_inputs = [InputFrame::new(); 2];
        self.tick = 0;
        self.paused = false;
        self.pending_events.clear();
        self.pending_events.push(GameEvent::control(0, GameEventData::MatchReset));
        tracing::debug!("match reset");
        Ok(())
    }

    /// Stop for good. Every later tick fails with [`CombatError::Terminated`].
    pub fn terminate(&mut self) {
        if !self.terminated {
            self.terminated = true;
            tracing::info!(tick = self.tick, "simulation terminated");
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Serializable copy of everything a renderer needs.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.tick,
            fighters: self.fighters.clone(),
            round: self.round.state().clone(),
            paused: self.paused,
        }
    }

    /// Hash of all state that affects future ticks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            for fighter in &self.fighters {
                fighter.hash_into(hasher);
            }
            self.round.state().hash_into(hasher);
            hasher.update_u8(self.prev_inputs[0].flags);
            hasher.update_u8(self.prev_inputs[1].flags);
        })
    }

    /// Simulated ticks so far.
    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    /// Both fighters, indexed by slot.
    pub fn fighters(&self) -> &[FighterState; 2] {
        &self.fighters
    }

    /// One fighter.
    pub fn fighter(&self, slot: PlayerSlot) -> &FighterState {
        &self.fighters[slot.index()]
    }

    /// Round clock and score.
    pub fn round(&self) -> &RoundState {
        self.round.state()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Move tables, indexed by slot.
    pub fn tables(&self) -> &[Arc<MoveTable>; 2] {
        &self.tables
    }

    /// Whether [`pause`](Self::pause) is in effect.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether [`terminate`](Self::terminate) was called.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Test hook: overwrite a fighter's state.
    #[doc(hidden)]
    pub fn fighter_mut(&mut self, slot: PlayerSlot) -> &mut FighterState {
        &mut self.fighters[slot.index()]
    }
}

/// Both fighters at their spawn points, full health, facing each other.
fn spawn_fighters(config: &SimConfig, tables: &[Arc<MoveTable>; 2]) -> [FighterState; 2] {
    let max_health = config.combat.max_health;
    let mut fighters = [
        FighterState::new(PlayerSlot::P1, config.arena.p1_spawn_x, Facing::Right, max_health),
        FighterState::new(PlayerSlot::P2, config.arena.p2_spawn_x, Facing::Left, max_health),
    ];
    for (f, table) in fighters.iter_mut().zip(tables.iter()) {
        clamp_to_arena(f, table, &config.arena);
    }
    fighters
}

/// Replay a match from recorded inputs.
///
/// Runs until `tick_count` ticks have been simulated or the match ends.
/// Returns the final simulation and every event produced.
pub fn replay_match(
    config: SimConfig,
    tables: [Arc<MoveTable>; 2],
    inputs: &[PlayerInputBuffer; 2],
    tick_count: u32,
) -> Result<(Simulation, Vec<GameEvent>), CombatError> {
    let mut sim = Simulation::new(config, tables)?;
    let mut all_events = Vec::new();

    while sim.current_tick() < tick_count {
        let t = sim.current_tick();
        let frames = [inputs[0].get_input_at(t), inputs[1].get_input_at(t)];
        let result = sim.tick(frames)?;
        all_events.extend(result.events);
        if result.match_over {
            break;
        }
    }

    Ok((sim, all_events))
}
