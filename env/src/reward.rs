//! Shaped reward and episode termination

use sdgym_battle::{Outcome, SideState, TrackedBattle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Per unit of HP fraction: opponent lost minus agent lost
    pub hp_delta: f32,
    /// Per creature: opponent faints minus agent faints
    pub faint: f32,
    pub win_bonus: f32,
    pub loss_penalty: f32,
    pub tie: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            hp_delta: 1.0,
            faint: 0.0,
            win_bonus: 1.0,
            loss_penalty: 1.0,
            tie: 0.0,
        }
    }
}

impl RewardWeights {
    pub fn is_finite(&self) -> bool {
        [
            self.hp_delta,
            self.faint,
            self.win_bonus,
            self.loss_penalty,
            self.tie,
        ]
        .iter()
        .all(|w| w.is_finite())
    }
}

/// Why an episode stopped without a natural result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationReason {
    TurnLimit,
    Timeout,
    /// The tracker lost sync with the server
    StateError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    /// Won, lost, tied or forfeited
    pub terminated: bool,
    pub truncation: Option<TruncationReason>,
}

impl StepOutcome {
    pub fn truncated(&self) -> bool {
        self.truncation.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RewardPolicy {
    weights: RewardWeights,
    max_turns: Option<u32>,
    team_size: usize,
}

impl RewardPolicy {
    pub fn new(weights: RewardWeights, max_turns: Option<u32>, team_size: usize) -> Self {
        Self {
            weights,
            max_turns,
            team_size,
        }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Reward and termination for the step that took `prev` to `next`.
    ///
    /// The turn limit counts the turn that was being decided in `prev`, so with `max_turns = 1`
    /// the first step always truncates.
    pub fn compute(&self, prev: &TrackedBattle, next: &TrackedBattle, outcome: Outcome) -> StepOutcome {
        let mut reward = self.shaped(prev, next);
        let terminated = outcome.is_terminal();
        reward += self.terminal(outcome);

        let truncation = self
            .max_turns
            .filter(|&limit| prev.turn >= limit)
            .map(|_| TruncationReason::TurnLimit);

        StepOutcome {
            reward,
            done: terminated || truncation.is_some(),
            terminated,
            truncation,
        }
    }

    /// The server went quiet: shaped reward only, no terminal penalty
    pub fn truncate(
        &self,
        prev: &TrackedBattle,
        next: &TrackedBattle,
        reason: TruncationReason,
    ) -> StepOutcome {
        StepOutcome {
            reward: self.shaped(prev, next),
            done: true,
            terminated: false,
            truncation: Some(reason),
        }
    }

    fn shaped(&self, prev: &TrackedBattle, next: &TrackedBattle) -> f32 {
        let hp_lost = |side: fn(&TrackedBattle) -> Option<&SideState>| {
            self.total_hp(side(prev)) - self.total_hp(side(next))
        };
        let faints = |side: fn(&TrackedBattle) -> Option<&SideState>| {
            let count = |b| side(b).map_or(0, SideState::fainted_count) as f32;
            count(next) - count(prev)
        };

        let hp = hp_lost(TrackedBattle::opponent) - hp_lost(TrackedBattle::me);
        let faint = faints(TrackedBattle::opponent) - faints(TrackedBattle::me);
        self.weights.hp_delta * hp + self.weights.faint * faint
    }

    fn terminal(&self, outcome: Outcome) -> f32 {
        if outcome.agent_won() {
            self.weights.win_bonus
        } else if outcome.agent_lost() {
            -self.weights.loss_penalty
        } else if outcome == Outcome::Tie {
            self.weights.tie
        } else {
            0.0
        }
    }

    /// Sum of HP fractions over a full team; unseen or unmeasured creatures count as healthy
    fn total_hp(&self, side: Option<&SideState>) -> f32 {
        let Some(side) = side else {
            return self.team_size as f32;
        };
        let known: f32 = side
            .pokemon
            .iter()
            .take(self.team_size)
            .map(|p| p.hp_fraction().unwrap_or(1.0))
            .sum();
        let unseen = self.team_size.saturating_sub(side.pokemon.len());
        known + unseen as f32
    }
}
