//! Round Controller
//!
//! ```text
//! Intro ──▶ Active ──(KO / time up)──▶ Ending ──▶ Intro (next round)
//!                                        │
//!                                        └──▶ MatchOver (terminal)
//! ```
//!
//! The round is awarded on the tick `Ending` is entered. Draws (double KO,
//! equal health at time up) award nobody.

use crate::config::RoundConfig;
use crate::game::events::{GameEvent, RoundEndReason};
use crate::game::state::{FighterState, PlayerSlot, RoundPhase, RoundState};

/// What the simulation should do with the fighters this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPlan {
    /// Match decided: nothing changes
    Halted,
    /// Intro or ending hold: fighters frozen
    Hold,
    /// A new round begins: reset fighters, then hold
    NewRound,
    /// Fighters simulate
    Fight,
}

/// Drives the round state through its phases.
#[derive(Clone, Debug)]
pub struct RoundController {
    config: RoundConfig,
    state: RoundState,
}

impl RoundController {
    /// Start a match at the intro of the first round.
    pub fn new(config: RoundConfig) -> Self {
        let state = RoundState {
            timer_ticks: config.round_ticks(),
            rounds_won: [0, 0],
            round_index: 0,
            phase: RoundPhase::Intro {
                ticks_remaining: config.intro_ticks,
            },
        };
        Self { config, state }
    }

    /// Current round state.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Round configuration in use.
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Advance intro/ending countdowns and decide how this tick runs.
    pub fn begin_tick(&mut self, tick: u32, events: &mut Vec<GameEvent>) -> TickPlan {
        match self.state.phase {
            RoundPhase::MatchOver { .. } => TickPlan::Halted,
            RoundPhase::Active => TickPlan::Fight,
            RoundPhase::Intro { ticks_remaining } if ticks_remaining > 0 => {
                self.state.phase = RoundPhase::Intro {
                    ticks_remaining: ticks_remaining - 1,
                };
                TickPlan::Hold
            }
            RoundPhase::Intro { .. } => {
                self.state.phase = RoundPhase::Active;
                tracing::info!(round = self.state.round_index + 1, "round start");
                events.push(GameEvent::round_started(tick, self.state.round_index));
                TickPlan::Fight
            }
            RoundPhase::Ending { ticks_remaining, winner } if ticks_remaining > 0 => {
                self.state.phase = RoundPhase::Ending {
                    ticks_remaining: ticks_remaining - 1,
                    winner,
                };
                TickPlan::Hold
            }
            RoundPhase::Ending { .. } => match self.match_result() {
                Some(winner) => {
                    self.state.phase = RoundPhase::MatchOver { winner };
                    tracing::info!(
                        winner = ?winner,
                        p1 = self.state.rounds_won[0],
                        p2 = self.state.rounds_won[1],
                        "match over"
                    );
                    events.push(GameEvent::match_ended(tick, winner, self.state.rounds_won));
                    TickPlan::Hold
                }
                None => {
                    self.state.round_index = self.state.round_index.saturating_add(1);
                    self.state.timer_ticks = self.config.round_ticks();
                    self.state.phase = RoundPhase::Intro {
                        ticks_remaining: self.config.intro_ticks,
                    };
                    TickPlan::NewRound
                }
            },
        }
    }

    /// Run the clock and check for a KO or time up. Call on `Fight` ticks
    /// after combat has been resolved.
    ///
    /// Returns `true` when the round ended this tick.
    pub fn observe(&mut self, tick: u32, fighters: &[FighterState; 2], events: &mut Vec<GameEvent>) -> bool {
        if self.state.phase != RoundPhase::Active {
            return false;
        }
        self.state.timer_ticks = self.state.timer_ticks.saturating_sub(1);

        let ko = [fighters[0].is_knocked_out(), fighters[1].is_knocked_out()];
        let (winner, reason) = match ko {
            [true, true] => (None, RoundEndReason::DoubleKnockOut),
            [true, false] => (Some(PlayerSlot::P2), RoundEndReason::KnockOut),
            [false, true] => (Some(PlayerSlot::P1), RoundEndReason::KnockOut),
            [false, false] if self.state.timer_ticks == 0 => {
                let winner = match fighters[0].health.cmp(&fighters[1].health) {
                    std::cmp::Ordering::Greater => Some(PlayerSlot::P1),
                    std::cmp::Ordering::Less => Some(PlayerSlot::P2),
                    std::cmp::Ordering::Equal => None,
                };
                (winner, RoundEndReason::TimeUp)
            }
            [false, false] => return false,
        };

        for slot in PlayerSlot::ALL {
            if ko[slot.index()] {
                events.push(GameEvent::knocked_out(tick, slot));
            }
        }

        if let Some(slot) = winner {
            let won = &mut self.state.rounds_won[slot.index()];
            *won = won.saturating_add(1);
        }
        self.state.phase = RoundPhase::Ending {
            ticks_remaining: self.config.end_ticks,
            winner,
        };

        tracing::info!(
            round = self.state.round_index + 1,
            winner = ?winner,
            reason = ?reason,
            p1 = self.state.rounds_won[0],
            p2 = self.state.rounds_won[1],
            "round over"
        );
        events.push(GameEvent::round_ended(
            tick,
            self.state.round_index,
            winner,
            reason,
            self.state.rounds_won,
        ));
        true
    }

    /// `Some(winner)` once the match is decided, `Some(None)` for a draw game.
    fn match_result(&self) -> Option<Option<PlayerSlot>> {
        let [p1, p2] = self.state.rounds_won;
        let target = self.config.rounds_to_win;
        if p1 >= target || p2 >= target {
            return Some(if p1 >= p2 { Some(PlayerSlot::P1) } else { Some(PlayerSlot::P2) });
        }
        if self.state.round_index.saturating_add(1) >= self.config.max_rounds {
            return Some(match p1.cmp(&p2) {
                std::cmp::Ordering::Greater => Some(PlayerSlot::P1),
                std::cmp::Ordering::Less => Some(PlayerSlot::P2),
                std::cmp::Ordering::Equal => None,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rect::Facing;
    use crate::game::events::GameEventData;

    fn fighters() -> [FighterState; 2] {
        [
            FighterState::new(PlayerSlot::P1, 228, Facing::Right, 100),
            FighterState::new(PlayerSlot::P2, 772, Facing::Left, 100),
        ]
    }

    fn quick_config() -> RoundConfig {
        RoundConfig {
            round_time_secs: 1,
            rounds_to_win: 2,
            max_rounds: 5,
            intro_ticks: 2,
            end_ticks: 1,
        }
    }

    #[test]
    fn test_intro_counts_down() {
        let mut rc = RoundController::new(quick_config());
        let mut events = Vec::new();
        assert_eq!(rc.begin_tick(0, &mut events), TickPlan::Hold);
        assert_eq!(rc.begin_tick(1, &mut events), TickPlan::Hold);
        assert!(events.is_empty());
        assert_eq!(rc.begin_tick(2, &mut events), TickPlan::Fight);
        assert_eq!(rc.state().phase, RoundPhase::Active);
        assert_eq!(events[0].data, GameEventData::RoundStarted { round: 0 });
    }

    #[test]
    fn test_zero_intro_fights_immediately() {
        let mut config = quick_config();
        config.intro_ticks = 0;
        let mut rc = RoundController::new(config);
        assert_eq!(rc.begin_tick(0, &mut Vec::new()), TickPlan::Fight);
    }

    #[test]
    fn test_knockout_awards_round_immediately() {
        let mut rc = RoundController::new(quick_config());
        rc.state.phase = RoundPhase::Active;
        let mut f = fighters();
        f[0].health = 0;

        let mut events = Vec::new();
        assert!(rc.observe(10, &f, &mut events));
        assert_eq!(rc.state().rounds_won, [0, 1]);
        assert_eq!(
            rc.state().phase,
            RoundPhase::Ending { ticks_remaining: 1, winner: Some(PlayerSlot::P2) }
        );
        assert_eq!(events[0].data, GameEventData::FighterKnockedOut { slot: PlayerSlot::P1 });
        assert!(matches!(
            events[1].data,
            GameEventData::RoundEnded { reason: RoundEndReason::KnockOut, winner: Some(PlayerSlot::P2), .. }
        ));
    }

    #[test]
    fn test_double_knockout_is_draw() {
        let mut rc = RoundController::new(quick_config());
        rc.state.phase = RoundPhase::Active;
        let mut f = fighters();
        f[0].health = 0;
        f[1].health = 0;
        assert!(rc.observe(10, &f, &mut Vec::new()));
        assert_eq!(rc.state().rounds_won, [0, 0]);
        assert_eq!(rc.state().phase, RoundPhase::Ending { ticks_remaining: 1, winner: None });
    }

    #[test]
    fn test_time_up_decides_by_health() {
        let mut rc = RoundController::new(quick_config());
        rc.state.phase = RoundPhase::Active;
        let mut f = fighters();
        f[1].health = 60;

        let mut events = Vec::new();
        for _ in 0..59 {
            assert!(!rc.observe(0, &f, &mut events));
        }
        assert_eq!(rc.state().timer_ticks, 1);
        assert!(rc.observe(59, &f, &mut events));
        assert_eq!(rc.state().rounds_won, [1, 0]);
        assert!(matches!(
            events.last().map(|e| &e.data),
            Some(GameEventData::RoundEnded { reason: RoundEndReason::TimeUp, .. })
        ));
    }

    #[test]
    fn test_time_up_equal_health_draws() {
        let mut config = quick_config();
        config.round_time_secs = 1;
        let mut rc = RoundController::new(config);
        rc.state.phase = RoundPhase::Active;
        rc.state.timer_ticks = 1;
        assert!(rc.observe(0, &fighters(), &mut Vec::new()));
        assert_eq!(rc.state().rounds_won, [0, 0]);
    }

    #[test]
    fn test_next_round_after_hold() {
        let mut rc = RoundController::new(quick_config());
        rc.state.phase = RoundPhase::Ending { ticks_remaining: 1, winner: Some(PlayerSlot::P1) };
        rc.state.rounds_won = [1, 0];
        rc.state.timer_ticks = 7;

        let mut events = Vec::new();
        assert_eq!(rc.begin_tick(0, &mut events), TickPlan::Hold);
        assert_eq!(rc.begin_tick(1, &mut events), TickPlan::NewRound);
        assert_eq!(rc.state().round_index, 1);
        assert_eq!(rc.state().timer_ticks, 60);
        assert_eq!(rc.state().phase, RoundPhase::Intro { ticks_remaining: 2 });
    }

    #[test]
    fn test_match_over_is_terminal() {
        let mut rc = RoundController::new(quick_config());
        rc.state.phase = RoundPhase::Ending { ticks_remaining: 0, winner: Some(PlayerSlot::P2) };
        rc.state.rounds_won = [1, 2];

        let mut events = Vec::new();
        assert_eq!(rc.begin_tick(100, &mut events), TickPlan::Hold);
        assert_eq!(rc.state().phase, RoundPhase::MatchOver { winner: Some(PlayerSlot::P2) });
        assert_eq!(
            events[0].data,
            GameEventData::MatchEnded { winner: Some(PlayerSlot::P2), rounds_won: [1, 2], duration_ticks: 100 }
        );

        let frozen = rc.state().clone();
        for t in 101..110 {
            assert_eq!(rc.begin_tick(t, &mut events), TickPlan::Halted);
            assert!(!rc.observe(t, &fighters(), &mut events));
        }
        assert_eq!(rc.state(), &frozen);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_max_rounds_draw_game() {
        let mut config = quick_config();
        config.max_rounds = 3;
        let mut rc = RoundController::new(config);
        rc.state.round_index = 2;
        rc.state.rounds_won = [1, 1];
        rc.state.phase = RoundPhase::Ending { ticks_remaining: 0, winner: None };

        rc.begin_tick(0, &mut Vec::new());
        assert_eq!(rc.state().phase, RoundPhase::MatchOver { winner: None });
    }
}
