//! Built-in opponent policies and the bot loop that plays them

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sdgym_battle::SideState;
use sdgym_client::{
    BattleRequest, Choice, ProtocolSession, SessionError, SessionEvent, Transport,
};
use serde::{Deserialize, Serialize};

use crate::action::ActionMapper;

fn default_switch_threshold() -> f32 {
    0.25
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OpponentPolicy {
    /// Uniform over legal choices
    #[default]
    Random,
    /// Switch out when low, otherwise the usable move with the most PP left
    Heuristic {
        #[serde(default = "default_switch_threshold")]
        switch_threshold: f32,
    },
    /// Play `choices` in a cycle, falling back to the first legal choice
    Script { choices: Vec<String> },
}

/// Picks the opponent's choices for one battle
pub struct OpponentAgent {
    policy: OpponentPolicy,
    mapper: ActionMapper,
    rng: ChaCha8Rng,
    script_pos: usize,
}

impl OpponentAgent {
    pub fn new(policy: OpponentPolicy, team_size: usize, seed: u64) -> Self {
        Self {
            policy,
            mapper: ActionMapper::new(team_size),
            rng: ChaCha8Rng::seed_from_u64(seed),
            script_pos: 0,
        }
    }

    pub fn choose(&mut self, request: &BattleRequest, me: Option<&SideState>) -> Choice {
        let legal: Vec<Choice> = self
            .mapper
            .legal_choices(request, me)
            .into_iter()
            .map(|(_, choice)| choice)
            .collect();
        let Some(first) = legal.first().cloned() else {
            return Choice::Default;
        };

        match &self.policy {
            OpponentPolicy::Random => legal[self.rng.gen_range(0..legal.len())].clone(),
            OpponentPolicy::Heuristic { switch_threshold } => {
                heuristic_choice(request, &legal, *switch_threshold).unwrap_or(first)
            }
            OpponentPolicy::Script { choices } if choices.is_empty() => first,
            OpponentPolicy::Script { choices } => {
                let scripted = &choices[self.script_pos % choices.len()];
                self.script_pos += 1;
                match scripted.parse::<Choice>() {
                    Ok(choice) if legal.contains(&choice) => choice,
                    _ => {
                        tracing::debug!(choice = %scripted, "scripted choice not legal, using first legal");
                        first
                    }
                }
            }
        }
    }
}

fn hp_fraction(condition: &str) -> f32 {
    match sdgym_protocol::HpStatus::parse(condition) {
        Some(hp) if hp.is_fainted() => 0.0,
        Some(hp) => hp.max.filter(|&m| m > 0).map_or(1.0, |m| hp.current as f32 / m as f32),
        None => 1.0,
    }
}

fn heuristic_choice(request: &BattleRequest, legal: &[Choice], threshold: f32) -> Option<Choice> {
    let party = request.party();

    let mut best_switch: Option<(usize, f32)> = None;
    for choice in legal {
        if let Choice::Switch(position) = choice
            && let Some(entry) = party.get(position - 1)
        {
            let hp = hp_fraction(&entry.condition);
            if best_switch.is_none_or(|(_, best)| hp > best) {
                best_switch = Some((*position, hp));
            }
        }
    }

    let active_hp = party
        .iter()
        .find(|p| p.active)
        .map_or(1.0, |p| hp_fraction(&p.condition));
    if let Some((position, _)) = best_switch
        && (request.is_force_switch() || active_hp <= threshold)
    {
        return Some(Choice::Switch(position));
    }

    let moves = request.active_slot().map(|a| a.moves.as_slice()).unwrap_or_default();
    let mut best_move: Option<(usize, u32)> = None;
    for choice in legal {
        if let Choice::Move(slot) = choice {
            let pp = moves.get(slot - 1).and_then(|m| m.pp).unwrap_or(0);
            if best_move.is_none_or(|(_, best)| pp > best) {
                best_move = Some((*slot, pp));
            }
        }
    }
    best_move
        .map(|(slot, _)| Choice::Move(slot))
        .or(best_switch.map(|(position, _)| Choice::Switch(position)))
}

/// Play one battle as the opponent: wait for the challenge, answer every decision, then leave.
///
/// Timeouts while waiting are not fatal here; the bot waits as long as the agent takes.
pub async fn run_opponent<T: Transport>(mut session: ProtocolSession<T>, mut agent: OpponentAgent) {
    if let Err(e) = session.start_battle().await {
        tracing::warn!(user = %session.username(), error = %e, "opponent failed to start battle");
        if let Err(e) = session.close().await {
            tracing::debug!(error = %e, "opponent close failed");
        }
        return;
    }

    loop {
        match session.await_decision().await {
            Ok(SessionEvent::Decision(decision)) => {
                let choice = agent.choose(decision.request(), session.battle().me());
                if let Err(e) = session.send_choice(&decision, &choice).await {
                    tracing::warn!(error = %e, "opponent failed to send choice");
                    break;
                }
            }
            Ok(SessionEvent::Ended(outcome)) => {
                tracing::debug!(?outcome, "opponent battle ended");
                break;
            }
            Err(SessionError::Timeout(_)) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "opponent session stopped");
                break;
            }
        }
    }

    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "opponent close failed");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sdgym_client::{BattleTarget, ScriptedTransport, SessionConfig};

    use super::*;

    const REQUEST: &str = r#"{
        "active": [{"moves": [
            {"move": "Earthquake", "id": "earthquake", "pp": 8, "maxpp": 16, "target": "allAdjacent", "disabled": false},
            {"move": "Swords Dance", "id": "swordsdance", "pp": 32, "maxpp": 32, "target": "self", "disabled": false},
            {"move": "Outrage", "id": "outrage", "pp": 16, "maxpp": 16, "target": "randomNormal", "disabled": true}
        ]}],
        "side": {"name": "Rival", "id": "p2", "pokemon": [
            {"ident": "p2: Chomp", "details": "Garchomp, L80", "condition": "20/300", "active": true},
            {"ident": "p2: Pex", "details": "Toxapex, L84", "condition": "100/250", "active": false},
            {"ident": "p2: Wing", "details": "Corviknight, L82", "condition": "280/300", "active": false},
            {"ident": "p2: Dozer", "details": "Snorlax, L80", "condition": "0 fnt", "active": false}
        ]},
        "rqid": 4
    }"#;

    fn create_test_request() -> BattleRequest {
        serde_json::from_str(REQUEST).unwrap()
    }

    fn create_test_agent(policy: OpponentPolicy) -> OpponentAgent {
        OpponentAgent::new(policy, 6, 11)
    }

    #[test]
    fn test_random_picks_legal_choices() {
        let request = create_test_request();
        let mut agent = create_test_agent(OpponentPolicy::Random);
        for _ in 0..50 {
            let choice = agent.choose(&request, None);
            assert!(
                [Choice::Move(1), Choice::Move(2), Choice::Switch(2), Choice::Switch(3)]
                    .contains(&choice),
                "{choice}"
            );
        }
    }

    #[test]
    fn test_random_is_seeded() {
        let request = create_test_request();
        let mut a = create_test_agent(OpponentPolicy::Random);
        let mut b = create_test_agent(OpponentPolicy::Random);
        let picks_a: Vec<_> = (0..20).map(|_| a.choose(&request, None)).collect();
        let picks_b: Vec<_> = (0..20).map(|_| b.choose(&request, None)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_heuristic_switches_to_healthiest_when_low() {
        let request = create_test_request();
        let mut agent = create_test_agent(OpponentPolicy::Heuristic {
            switch_threshold: 0.25,
        });
        assert_eq!(agent.choose(&request, None), Choice::Switch(3));
    }

    #[test]
    fn test_heuristic_attacks_when_healthy() {
        let request = create_test_request();
        let mut agent = create_test_agent(OpponentPolicy::Heuristic {
            switch_threshold: 0.05,
        });
        // Swords Dance has the most PP left
        assert_eq!(agent.choose(&request, None), Choice::Move(2));
    }

    #[test]
    fn test_script_cycles_and_falls_back() {
        let request = create_test_request();
        let mut agent = create_test_agent(OpponentPolicy::Script {
            choices: vec!["move 2".into(), "move 3".into(), "switch 4".into()],
        });
        assert_eq!(agent.choose(&request, None), Choice::Move(2));
        // disabled
        assert_eq!(agent.choose(&request, None), Choice::Move(1));
        // fainted
        assert_eq!(agent.choose(&request, None), Choice::Move(1));
        assert_eq!(agent.choose(&request, None), Choice::Move(2));
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: OpponentPolicy = toml::from_str("policy = \"heuristic\"").unwrap();
        assert_eq!(
            policy,
            OpponentPolicy::Heuristic {
                switch_threshold: 0.25
            }
        );
    }

    #[tokio::test]
    async fn test_bot_accepts_and_plays() {
        const ROOM: &str = "battle-gen9randombattle-7";
        let transport = ScriptedTransport::new([
            "|challstr|4|abc",
            "|updateuser| Rival|1|2|{}",
        ])
        .with_responder(|line| {
            if line.starts_with("|/utm") {
                vec![r#"|updatechallenges|{"challengesFrom":{"agent":"gen9randombattle"}}"#.to_string()]
            } else if line.starts_with("|/accept") {
                vec![
                    format!(">{ROOM}\n|init|battle\n|player|p1|Agent|1|\n|player|p2|Rival|2|"),
                    format!(">{ROOM}\n|request|{}", REQUEST.replace('\n', "")),
                    format!(">{ROOM}\n|start\n|switch|p2a: Chomp|Garchomp, L80|20/300\n|turn|1"),
                ]
            } else if line.contains("/choose") {
                vec![format!(">{ROOM}\n|win|Agent")]
            } else {
                Vec::new()
            }
        });
        let log = transport.sent_log();

        let mut config = SessionConfig::new(
            "Rival",
            "gen9randombattle",
            BattleTarget::Accept("Agent".to_string()),
        );
        config.decision_timeout = Duration::from_millis(200);
        let session = ProtocolSession::login(transport, config).await.unwrap();
        let agent = create_test_agent(OpponentPolicy::Script {
            choices: vec!["move 1".into()],
        });
        run_opponent(session, agent).await;

        let log = log.lock().unwrap();
        assert!(log.contains(&"|/accept Agent".to_string()));
        assert!(log.contains(&format!("{ROOM}|/choose move 1|4")));
        assert_eq!(log.last(), Some(&format!("|/leave {ROOM}")));
    }

    #[tokio::test]
    async fn test_bot_gives_up_without_challenge() {
        let transport = ScriptedTransport::new(["|challstr|4|abc", "|updateuser| Rival|1|2|{}"]);
        let log = transport.sent_log();

        let mut config = SessionConfig::new(
            "Rival",
            "gen9randombattle",
            BattleTarget::Accept("Agent".to_string()),
        );
        config.decision_timeout = Duration::from_millis(50);
        let session = ProtocolSession::login(transport, config).await.unwrap();
        let agent = create_test_agent(OpponentPolicy::Random);

        tokio::time::timeout(Duration::from_secs(1), run_opponent(session, agent))
            .await
            .unwrap();
        assert!(!log.lock().unwrap().iter().any(|l| l.starts_with("|/accept")));
    }
}
