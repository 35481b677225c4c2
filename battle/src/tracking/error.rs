use sdgym_protocol::Player;
use thiserror::Error;

/// The tracked state no longer matches what the server reports
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateConsistencyError {
    #[error("{side} has no creature named {name}")]
    UnknownCreature { side: Player, name: String },

    #[error("{side} {name} reported {current} HP with max {max}")]
    HpOutOfBounds {
        side: Player,
        name: String,
        current: u32,
        max: u32,
    },

    #[error("{side} revealed more than {limit} creatures")]
    RosterOverflow { side: Player, limit: usize },
}
