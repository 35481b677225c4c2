//! Battle state tracking and domain types for Pokemon Showdown episodes.
//!
//! # Overview
//!
//! `sdgym-battle` sits between `sdgym-protocol` (wire format) and the session and
//! environment crates:
//!
//! ```text
//! sdgym-protocol (wire format)
//!        │
//!        ▼
//! sdgym-battle (domain types + tracking) ← THIS CRATE
//!        │
//!        ├─> sdgym-client (protocol session feeding the tracker)
//!        └─> sdgym-env (observations, masks and rewards read from tracked state)
//! ```
//!
//! # Main Types
//!
//! ## Domain Types
//! - [`Status`] - Non-volatile status conditions (Burn, Freeze, etc.)
//! - [`Volatile`] - Volatile conditions that feed the observation
//! - [`StatStages`], [`StatBlock`] - Stat stages and calculated stats
//! - [`Weather`], [`Terrain`], [`SideCondition`] - Field conditions
//! - [`PokemonState`] - One creature, possibly a team preview placeholder
//! - [`SideState`] - One player's roster and side conditions
//! - [`FieldState`] - Global field conditions
//!
//! ## State Tracking
//! - [`TrackedBattle`] - Applies server messages and requests in arrival order
//! - [`BattlePhase`], [`Outcome`] - Lifecycle and agent-relative result
//! - [`StateConsistencyError`] - Raised when the tracker and server disagree
//!
//! # Example Usage
//!
//! ```ignore
//! use sdgym_battle::TrackedBattle;
//! use sdgym_protocol::parse_server_message;
//!
//! let mut battle = TrackedBattle::new("battle-gen9randombattle-1", "Agent");
//! battle.apply(&parse_server_message("|turn|1")?)?;
//!
//! if let Some(me) = battle.me() {
//!     let active = me.active_pokemon().unwrap();
//!     println!("My active: {} at {:?}", active.display_name(), active.hp_fraction());
//! }
//! ```

pub mod tracking;
pub mod types;

pub use tracking::{
    BattlePhase, Outcome, StateConsistencyError, TrackedBattle, player_to_index, position_to_slot,
};
pub use types::{
    DEFAULT_TEAM_SIZE, FieldState, MAX_MOVES, MoveState, PokemonState, SideCondition,
    SideConditionState, SideState, StatBlock, StatStages, Status, Terrain, Volatile, Weather,
};

pub use sdgym_protocol::{GameType, Player, Stat};
