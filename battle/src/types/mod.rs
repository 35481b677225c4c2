//! Domain types for battle state tracking

mod conditions;
mod field;
mod pokemon;
mod side;
mod stats;
mod status;

pub use conditions::{SideCondition, SideConditionState, Terrain, Weather};
pub use field::FieldState;
pub use pokemon::{MAX_MOVES, MoveState, PokemonState};
pub use side::{DEFAULT_TEAM_SIZE, SideState};
pub use stats::{StatBlock, StatStages};
pub use status::{Status, Volatile};
