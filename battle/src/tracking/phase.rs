//! Battle lifecycle and outcome

/// Where the battle is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BattlePhase {
    /// Room joined, battle not started yet
    #[default]
    AwaitingStart,
    /// Log events of a turn are arriving
    InTurn,
    /// The agent has to choose
    AwaitingDecision,
    /// A choice was sent, waiting for the server to resolve it
    Resolving,
    Ended,
}

impl BattlePhase {
    pub fn is_ended(&self) -> bool {
        matches!(self, BattlePhase::Ended)
    }
}

/// Result of the battle from the agent's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Outcome {
    #[default]
    Ongoing,
    Won,
    Lost,
    Tie,
    /// One player forfeited or was timed out
    Forfeited { agent_won: bool },
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }

    pub fn agent_won(&self) -> bool {
        matches!(self, Outcome::Won | Outcome::Forfeited { agent_won: true })
    }

    pub fn agent_lost(&self) -> bool {
        matches!(self, Outcome::Lost | Outcome::Forfeited { agent_won: false })
    }
}
