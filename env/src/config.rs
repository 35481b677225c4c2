use std::path::Path;
use std::time::Duration;

use sdgym_client::auth::LOGIN_URL;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::opponent::OpponentPolicy;
use crate::reward::RewardWeights;
use crate::team::TeamSelection;

fn default_server_url() -> String {
    "ws://localhost:8000/showdown/websocket".into()
}
fn default_login_url() -> String {
    LOGIN_URL.into()
}
fn default_format() -> String {
    "gen9randombattle".into()
}
fn default_username_prefix() -> String {
    "sdgym".into()
}
const fn default_team_size() -> usize {
    6
}
const fn default_decision_timeout_secs() -> f64 {
    30.0
}
const fn default_opponent_timeout_secs() -> f64 {
    300.0
}

/// Environment configuration. Every key is optional in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Websocket endpoint of the battle server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Only needed when the server verifies logins
    #[serde(default)]
    pub password: Option<String>,

    /// Usernames are this prefix plus a seeded suffix
    #[serde(default = "default_username_prefix")]
    pub username_prefix: String,

    #[serde(default = "default_format")]
    pub format: String,

    /// Creatures per side; fixes the action and observation sizes
    #[serde(default = "default_team_size")]
    pub team_size: usize,

    #[serde(default)]
    pub team_selection: TeamSelection,

    #[serde(default)]
    pub opponent_policy: OpponentPolicy,

    /// Truncate once the turn being decided reaches this
    #[serde(default)]
    pub max_turns: Option<u32>,

    #[serde(default)]
    pub reward_weights: RewardWeights,

    /// Bound on every wait for the server
    #[serde(default = "default_decision_timeout_secs")]
    pub decision_timeout_secs: f64,

    /// Bound on each of the opponent bot's waits for the agent
    #[serde(default = "default_opponent_timeout_secs")]
    pub opponent_timeout_secs: f64,

    /// Species with their own observation bucket; everything else shares `other`
    #[serde(default)]
    pub species_catalog: Vec<String>,

    /// Seed for usernames, team draws and the random opponent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            login_url: default_login_url(),
            password: None,
            username_prefix: default_username_prefix(),
            format: default_format(),
            team_size: default_team_size(),
            team_selection: TeamSelection::default(),
            opponent_policy: OpponentPolicy::default(),
            max_turns: None,
            reward_weights: RewardWeights::default(),
            decision_timeout_secs: default_decision_timeout_secs(),
            opponent_timeout_secs: default_opponent_timeout_secs(),
            species_catalog: Vec::new(),
            seed: None,
        }
    }
}

impl EnvConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=6).contains(&self.team_size) {
            return Err(ConfigError::TeamSize(self.team_size));
        }
        if self.format.trim().is_empty() {
            return Err(ConfigError::invalid("format", "must not be empty"));
        }
        // Showdown names are at most 18 characters and the suffix takes up to 7
        if self.username_prefix.is_empty() || self.username_prefix.len() > 11 {
            return Err(ConfigError::invalid(
                "username_prefix",
                "must be 1 to 11 characters",
            ));
        }
        for (field, secs) in [
            ("decision_timeout_secs", self.decision_timeout_secs),
            ("opponent_timeout_secs", self.opponent_timeout_secs),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::invalid(field, format!("{secs} (must be > 0)")));
            }
        }
        if self.max_turns == Some(0) {
            return Err(ConfigError::invalid("max_turns", "must be at least 1"));
        }
        if !self.reward_weights.is_finite() {
            return Err(ConfigError::invalid("reward_weights", "must be finite"));
        }
        match &self.team_selection {
            TeamSelection::Fixed { team } if team.trim().is_empty() => {
                return Err(ConfigError::invalid("team_selection", "fixed team is empty"));
            }
            TeamSelection::Pool { teams } if teams.is_empty() => {
                return Err(ConfigError::invalid("team_selection", "team pool is empty"));
            }
            _ => {}
        }
        match &self.opponent_policy {
            OpponentPolicy::Heuristic { switch_threshold }
                if !(0.0..=1.0).contains(switch_threshold) =>
            {
                return Err(ConfigError::invalid(
                    "opponent_policy",
                    format!("switch_threshold {switch_threshold} outside [0, 1]"),
                ));
            }
            OpponentPolicy::Script { choices } if choices.is_empty() => {
                return Err(ConfigError::invalid("opponent_policy", "script has no choices"));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.decision_timeout_secs)
    }

    pub fn opponent_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.opponent_timeout_secs)
    }
}
