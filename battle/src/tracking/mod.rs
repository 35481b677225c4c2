//! Battle state tracking from server messages

mod battle;
mod error;
mod phase;
mod updater;

pub use battle::{TrackedBattle, player_to_index, position_to_slot};
pub use error::StateConsistencyError;
pub use phase::{BattlePhase, Outcome};
