//! Step-based reinforcement learning environment over Pokemon Showdown battles
//!
//! ```text
//! sdgym-client (protocol session)
//!        │
//!        ▼
//! sdgym-env ← THIS CRATE
//!   ├─ ObservationEncoder   TrackedBattle -> fixed-length vector
//!   ├─ ActionMapper         action index <-> choice, legal mask
//!   ├─ RewardPolicy         shaped reward, termination and truncation
//!   ├─ OpponentAgent        built-in opponent policies played by a bot session
//!   └─ ShowdownEnv          reset / step facade over a Connector
//! ```
//!
//! # Example Usage
//!
//! ```ignore
//! use sdgym_env::{EnvConfig, ShowdownEnv, WsConnector, first_legal};
//!
//! let config = EnvConfig::load("sdgym.toml")?;
//! let mut env = ShowdownEnv::new(config.clone(), WsConnector::new(config.server_url))?;
//!
//! let mut obs = env.reset(Some(7))?;
//! loop {
//!     let action = first_legal(&env.legal_mask()).unwrap_or(0);
//!     let result = env.step(action)?;
//!     obs = result.observation;
//!     if result.done {
//!         break;
//!     }
//! }
//! ```

pub mod action;
pub mod config;
pub mod connector;
pub mod env;
pub mod error;
pub mod eval;
pub mod observation;
pub mod opponent;
pub mod reward;
pub mod team;

pub use action::{ActionMapper, ActionSpace, MOVE_SLOTS, first_legal};
pub use config::EnvConfig;
pub use connector::{Connector, Episode, EpisodeSetup, ScriptedConnector, WsConnector};
pub use env::{EnvState, ShowdownEnv, StepInfo, StepResult};
pub use error::{ConfigError, EnvError, InvalidAction};
pub use eval::{EvalSummary, evaluate};
pub use observation::{Observation, ObservationEncoder, ObservationSpace, UNKNOWN};
pub use opponent::{OpponentAgent, OpponentPolicy, run_opponent};
pub use reward::{RewardPolicy, RewardWeights, StepOutcome, TruncationReason};
pub use team::TeamSelection;

pub use sdgym_battle::{Outcome, TrackedBattle};
pub use sdgym_client::Choice;
