//! Run whole episodes under a fixed policy and summarize them

use serde::Serialize;

use crate::connector::Connector;
use crate::env::ShowdownEnv;
use crate::error::EnvError;
use crate::observation::Observation;

/// Totals over evaluated episodes
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EvalSummary {
    pub episodes: usize,
    pub wins: usize,
    /// Mean of per-episode reward sums
    pub average_reward: f32,
    pub win_rate: f32,
}

/// Play `episodes` battles, asking `policy` for an action index at every decision.
///
/// The policy sees the observation and the legal mask; illegal picks are handled by `step`.
pub fn evaluate<C, P>(
    env: &mut ShowdownEnv<C>,
    episodes: usize,
    mut policy: P,
) -> Result<EvalSummary, EnvError>
where
    C: Connector,
    P: FnMut(&Observation, &[bool]) -> usize,
{
    let mut total_reward = 0.0;
    let mut wins = 0;

    for episode in 0..episodes {
        let mut observation = env.reset(None)?;
        let mut episode_reward = 0.0;
        let mut won = false;

        // reset can land on an already finished battle
        while env.legal_mask().iter().any(|&legal| legal) {
            let action = policy(&observation, &env.legal_mask());
            let result = env.step(action)?;
            episode_reward += result.reward;
            observation = result.observation;
            if result.done {
                won = result.info.won;
                break;
            }
        }

        tracing::info!(episode, reward = episode_reward, won, "evaluation episode finished");
        total_reward += episode_reward;
        wins += usize::from(won);
    }

    if episodes == 0 {
        return Ok(EvalSummary::default());
    }
    Ok(EvalSummary {
        episodes,
        wins,
        average_reward: total_reward / episodes as f32,
        win_rate: wins as f32 / episodes as f32,
    })
}
