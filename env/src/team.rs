//! Team selection per episode

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where each side's team comes from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamSelection {
    /// The server generates teams (random battle formats)
    #[default]
    ServerGenerated,
    /// The same packed team every episode
    Fixed { team: String },
    /// A packed team drawn uniformly per episode
    Pool { teams: Vec<String> },
}

impl TeamSelection {
    /// Packed team to upload, `None` when the server generates one
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        match self {
            TeamSelection::ServerGenerated => None,
            TeamSelection::Fixed { team } => Some(team.clone()),
            TeamSelection::Pool { teams } if teams.is_empty() => None,
            TeamSelection::Pool { teams } => Some(teams[rng.gen_range(0..teams.len())].clone()),
        }
    }
}
