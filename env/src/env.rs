//! Step-based facade over one battle at a time
//!
//! ```text
//! Unopened --reset--> Ready --step--> Stepping --step--> ... --> Done
//!     ^                                                          |
//!     +------------------------- reset --------------------------+
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sdgym_battle::{Outcome, TrackedBattle};
use sdgym_client::{BattleTarget, DecisionRequest, SessionConfig, SessionError, SessionEvent};
use sdgym_protocol::Player;
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::action::{ActionMapper, ActionSpace, first_legal};
use crate::config::EnvConfig;
use crate::connector::{Connector, Episode, EpisodeSetup};
use crate::error::EnvError;
use crate::observation::{Observation, ObservationEncoder, ObservationSpace};
use crate::reward::{RewardPolicy, StepOutcome, TruncationReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    Unopened,
    Ready,
    Stepping,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Per-step diagnostics for trainers and logs
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StepInfo {
    pub turn: u32,
    pub outcome: Outcome,
    pub won: bool,
    /// The battle reached a result
    pub terminated: bool,
    /// The episode was cut short; bootstrap from the last observation
    pub truncated: bool,
    pub truncation: Option<TruncationReason>,
    /// The action index that was asked for but could not be played
    pub invalid_action: Option<usize>,
    /// The action index that was sent
    pub applied_action: Option<usize>,
    pub error: Option<String>,
    /// The server rejected the previous choice and asked again
    pub choice_rejected: bool,
}

struct ActiveEpisode<T: sdgym_client::Transport> {
    episode: Episode<T>,
    decision: Option<DecisionRequest>,
}

/// Reinforcement learning environment over Showdown battles.
///
/// Blocks on its own runtime, so call it from synchronous code only.
pub struct ShowdownEnv<C: Connector> {
    config: EnvConfig,
    connector: C,
    runtime: Runtime,
    rng: ChaCha8Rng,
    encoder: ObservationEncoder,
    mapper: ActionMapper,
    reward: RewardPolicy,
    state: EnvState,
    active: Option<ActiveEpisode<C::Transport>>,
    last_battle: Option<TrackedBattle>,
}

impl<C: Connector> ShowdownEnv<C> {
    pub fn new(config: EnvConfig, connector: C) -> Result<Self, EnvError> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sdgym-env")
            .enable_all()
            .build()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            encoder: ObservationEncoder::new(config.team_size, &config.species_catalog),
            mapper: ActionMapper::new(config.team_size),
            reward: RewardPolicy::new(config.reward_weights, config.max_turns, config.team_size),
            config,
            connector,
            runtime,
            rng,
            state: EnvState::Unopened,
            active: None,
            last_battle: None,
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn env_state(&self) -> EnvState {
        self.state
    }

    pub fn observation_space(&self) -> ObservationSpace {
        self.encoder.space()
    }

    pub fn action_space(&self) -> ActionSpace {
        self.mapper.space()
    }

    /// Tracked battle of the current or most recent episode
    pub fn state(&self) -> Option<&TrackedBattle> {
        match &self.active {
            Some(active) => Some(active.episode.session.battle()),
            None => self.last_battle.as_ref(),
        }
    }

    /// Legal actions at the pending decision, all false when there is none
    pub fn legal_mask(&self) -> Vec<bool> {
        match &self.active {
            Some(ActiveEpisode {
                episode,
                decision: Some(decision),
            }) => self
                .mapper
                .legal_mask(decision.request(), episode.session.battle().me()),
            _ => vec![false; self.mapper.len()],
        }
    }

    /// Replace the configuration, then reset
    pub fn reset_with_config(
        &mut self,
        seed: Option<u64>,
        config: EnvConfig,
    ) -> Result<Observation, EnvError> {
        config.validate()?;
        self.close();
        self.encoder = ObservationEncoder::new(config.team_size, &config.species_catalog);
        self.mapper = ActionMapper::new(config.team_size);
        self.reward = RewardPolicy::new(config.reward_weights, config.max_turns, config.team_size);
        self.config = config;
        self.reset(seed)
    }

    /// Close any running episode and start a fresh one
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Observation, EnvError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.close();

        let setup = self.episode_setup();
        tracing::info!(agent = %setup.agent.username, opponent = %setup.opponent.username, "starting episode");
        let episode = self
            .runtime
            .block_on(self.connector.open(setup))
            .map_err(EnvError::Session)?;

        let mut active = ActiveEpisode {
            episode,
            decision: None,
        };
        match self
            .runtime
            .block_on(active.episode.session.await_decision())
        {
            Ok(SessionEvent::Decision(decision)) => {
                active.decision = Some(decision);
                self.state = EnvState::Ready;
            }
            Ok(SessionEvent::Ended(outcome)) => {
                tracing::warn!(?outcome, "battle ended before the first decision");
                self.state = EnvState::Done;
            }
            Err(e) => {
                self.active = Some(active);
                return Err(self.fail_episode(e));
            }
        }

        let observation = observe(&self.encoder, active.episode.session.battle());
        self.active = Some(active);
        if self.state == EnvState::Done {
            self.finish_episode();
        }
        Ok(observation)
    }

    /// Play `action`, wait for the next decision point and score the transition.
    ///
    /// A masked or out-of-range index plays the lowest legal action instead and is reported
    /// in `info.invalid_action`.
    pub fn step(&mut self, action: usize) -> Result<StepResult, EnvError> {
        match self.state {
            EnvState::Unopened => return Err(EnvError::NotReady),
            EnvState::Done => return Err(EnvError::EpisodeDone),
            EnvState::Ready | EnvState::Stepping => {}
        }
        let active = self.active.as_mut().ok_or(EnvError::NotReady)?;
        let decision = active.decision.take().ok_or(EnvError::NotReady)?;
        let session = &mut active.episode.session;

        let mut info = StepInfo::default();
        let me = session.battle().me();
        let (index, choice) = match self.mapper.decode(action, decision.request(), me) {
            Ok(choice) => (action, choice),
            Err(invalid) => {
                tracing::warn!(action, error = %invalid, "invalid action, playing the first legal one");
                info.invalid_action = Some(invalid.index());
                let fallback = first_legal(&self.mapper.legal_mask(decision.request(), me))
                    .and_then(|index| {
                        self.mapper
                            .decode(index, decision.request(), me)
                            .ok()
                            .map(|choice| (index, choice))
                    });
                match fallback {
                    Some(fallback) => fallback,
                    None => {
                        active.decision = Some(decision);
                        return Err(EnvError::NoLegalAction);
                    }
                }
            }
        };
        info.applied_action = Some(index);

        let prev = session.battle().current_state();
        if let Err(e) = self.runtime.block_on(session.send_choice(&decision, &choice)) {
            return Err(self.fail_episode(e));
        }

        let mut outcome = Outcome::Ongoing;
        let step: StepOutcome = match self.runtime.block_on(session.await_decision()) {
            Ok(SessionEvent::Decision(next)) => {
                info.choice_rejected = next.is_rearmed();
                active.decision = Some(next);
                self.reward.compute(&prev, session.battle(), Outcome::Ongoing)
            }
            Ok(SessionEvent::Ended(ended)) => {
                outcome = ended;
                self.reward.compute(&prev, session.battle(), ended)
            }
            Err(SessionError::Timeout(limit)) => {
                tracing::warn!(timeout = ?limit, turn = prev.turn, "server went quiet, truncating episode");
                self.reward
                    .truncate(&prev, session.battle(), TruncationReason::Timeout)
            }
            Err(SessionError::State(e)) => {
                tracing::error!(error = %e, "battle state out of sync, ending episode");
                info.error = Some(e.to_string());
                self.reward
                    .truncate(&prev, session.battle(), TruncationReason::StateError)
            }
            Err(e) => return Err(self.fail_episode(e)),
        };

        let battle = session.battle();
        let observation = observe(&self.encoder, battle);
        info.turn = battle.turn;
        info.outcome = outcome;
        info.won = outcome.agent_won();
        info.terminated = step.terminated;
        info.truncated = step.truncated();
        info.truncation = step.truncation;

        if step.done {
            tracing::info!(turn = info.turn, ?outcome, truncation = ?step.truncation, "episode done");
            self.finish_episode();
            self.state = EnvState::Done;
        } else {
            self.state = EnvState::Stepping;
        }

        Ok(StepResult {
            observation,
            reward: step.reward,
            done: step.done,
            truncated: step.truncated(),
            info,
        })
    }

    /// Forfeit and close any running episode
    pub fn close(&mut self) {
        self.finish_episode();
        self.state = EnvState::Unopened;
    }

    fn episode_setup(&mut self) -> EpisodeSetup {
        let suffix = self.rng.gen_range(0..1_000_000u32);
        let prefix = &self.config.username_prefix;
        let agent_name = format!("{prefix}a{suffix}");
        let opponent_name = format!("{prefix}b{suffix}");

        let mut agent = SessionConfig::new(
            agent_name.clone(),
            self.config.format.clone(),
            BattleTarget::Challenge(opponent_name.clone()),
        );
        agent.password = self.config.password.clone();
        agent.login_url = self.config.login_url.clone();
        agent.team = self.config.team_selection.pick(&mut self.rng);
        agent.decision_timeout = self.config.decision_timeout();

        let mut opponent = SessionConfig::new(
            opponent_name,
            self.config.format.clone(),
            BattleTarget::Accept(agent_name),
        );
        opponent.login_url = self.config.login_url.clone();
        opponent.team = self.config.team_selection.pick(&mut self.rng);
        opponent.decision_timeout = self.config.opponent_timeout();

        EpisodeSetup {
            agent,
            opponent,
            opponent_policy: self.config.opponent_policy.clone(),
            team_size: self.config.team_size,
            opponent_seed: self.rng.next_u64(),
        }
    }

    /// Keep a snapshot, close the session and stop the opponent
    fn finish_episode(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        self.last_battle = Some(active.episode.session.battle().current_state());
        if let Err(e) = self.runtime.block_on(active.episode.session.close()) {
            tracing::warn!(error = %e, "failed to close session");
        }
        if let Some(opponent) = active.episode.opponent.take() {
            opponent.abort();
        }
    }

    fn fail_episode(&mut self, error: SessionError) -> EnvError {
        tracing::warn!(error = %error, "episode failed");
        self.finish_episode();
        self.state = EnvState::Done;
        EnvError::Session(error)
    }
}

fn observe(encoder: &ObservationEncoder, battle: &TrackedBattle) -> Observation {
    let perspective = battle.perspective().unwrap_or(Player::P1);
    encoder.encode(battle, perspective)
}

impl<C: Connector> Drop for ShowdownEnv<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use sdgym_client::ScriptedTransport;

    use super::*;
    use crate::action::MOVE_SLOTS;
    use crate::connector::ScriptedConnector;

    const ROOM: &str = "battle-gen9randombattle-99";

    type SentLogs = Arc<Mutex<Vec<Arc<Mutex<Vec<String>>>>>>;

    /// Server reply to the k-th choice of an episode, given the agent's name
    type OnChoice = fn(usize, &str) -> Vec<String>;

    fn request_frame(rqid: usize) -> String {
        let json = r#"{"active":[{"moves":[
            {"move":"Thunderbolt","id":"thunderbolt","pp":24,"maxpp":24,"target":"normal","disabled":false},
            {"move":"Quick Attack","id":"quickattack","pp":48,"maxpp":48,"target":"normal","disabled":false}]}],
            "side":{"name":"Agent","id":"p1","pokemon":[
            {"ident":"p1: Sparky","details":"Pikachu, L88","condition":"211/211","active":true,"moves":["thunderbolt","quickattack"]},
            {"ident":"p1: Pex","details":"Toxapex, L84","condition":"250/250","active":false,"moves":["recover"]},
            {"ident":"p1: Dozer","details":"Snorlax, L80","condition":"0 fnt","active":false,"moves":["rest"]}]},
            "rqid":RQID}"#
            .replace('\n', "")
            .replace("RQID", &rqid.to_string());
        format!(">{ROOM}\n|request|{json}")
    }

    fn play_turn(k: usize, _name: &str) -> Vec<String> {
        vec![
            request_frame(k + 1),
            format!(
                ">{ROOM}\n|move|p1a: Sparky|Thunderbolt|p2a: Chomp\n|-damage|p2a: Chomp|{}/100\n|turn|{}",
                100 - 30 * k,
                k + 1
            ),
        ]
    }

    fn win_on_second(k: usize, name: &str) -> Vec<String> {
        if k < 2 {
            return play_turn(k, name);
        }
        vec![format!(
            ">{ROOM}\n|move|p1a: Sparky|Thunderbolt|p2a: Chomp\n|-damage|p2a: Chomp|0 fnt\n|faint|p2a: Chomp\n|win|{name}"
        )]
    }

    fn go_quiet(_k: usize, _name: &str) -> Vec<String> {
        Vec::new()
    }

    fn hang_up(_k: usize, _name: &str) -> Vec<String> {
        vec![ScriptedTransport::HANG_UP.to_string()]
    }

    fn desync(_k: usize, _name: &str) -> Vec<String> {
        vec![format!(">{ROOM}\n|-damage|p2a: Ghost|50/100\n|turn|2")]
    }

    fn create_test_connector(on_choice: OnChoice) -> (ScriptedConnector, SentLogs) {
        let logs: SentLogs = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&logs);
        let connector = ScriptedConnector::new(move |_setup| {
            let mut name = String::new();
            let mut choices = 0;
            let transport = ScriptedTransport::new(["|challstr|4|abc"]).with_responder(move |line| {
                if let Some(rest) = line.strip_prefix("|/trn ") {
                    name = rest.split(',').next().unwrap_or_default().to_string();
                    vec![format!("|updateuser| {name}|1|1|{{}}")]
                } else if line.starts_with("|/challenge") {
                    vec![
                        format!(">{ROOM}\n|init|battle\n|title|{name} vs. Rival"),
                        request_frame(1),
                        format!(
                            ">{ROOM}\n|player|p1|{name}|1|\n|player|p2|Rival|2|\n|teamsize|p1|3\n|teamsize|p2|3\n|gametype|singles\n|start\n|switch|p1a: Sparky|Pikachu, L88|211/211\n|switch|p2a: Chomp|Garchomp, L80|100/100\n|turn|1"
                        ),
                    ]
                } else if line.contains("|/choose ") {
                    choices += 1;
                    on_choice(choices, &name)
                } else {
                    Vec::new()
                }
            });
            shared.lock().unwrap().push(transport.sent_log());
            transport
        });
        (connector, logs)
    }

    fn create_test_config() -> EnvConfig {
        EnvConfig {
            decision_timeout_secs: 0.3,
            seed: Some(5),
            ..EnvConfig::default()
        }
    }

    fn create_test_env(on_choice: OnChoice) -> (ShowdownEnv<ScriptedConnector>, SentLogs) {
        let (connector, logs) = create_test_connector(on_choice);
        (ShowdownEnv::new(create_test_config(), connector).unwrap(), logs)
    }

    fn sent(logs: &SentLogs, episode: usize) -> Vec<String> {
        logs.lock().unwrap()[episode].lock().unwrap().clone()
    }

    #[test]
    fn test_spaces_without_battle() {
        let (env, _) = create_test_env(play_turn);
        assert_eq!(env.action_space(), ActionSpace { n: 9 });
        assert_eq!(env.observation_space().shape.len(), 1);
        assert_eq!(env.legal_mask(), vec![false; 9]);
        assert!(env.state().is_none());
    }

    #[test]
    fn test_step_before_reset_is_rejected() {
        let (mut env, _) = create_test_env(play_turn);
        assert!(matches!(env.step(0), Err(EnvError::NotReady)));
    }

    #[test]
    fn test_reset_returns_first_observation() {
        let (mut env, _) = create_test_env(play_turn);
        let obs = env.reset(None).unwrap();

        assert_eq!(obs.len(), env.observation_space().shape[0]);
        assert_eq!(env.env_state(), EnvState::Ready);
        assert_eq!(env.state().unwrap().turn, 1);

        let mask = env.legal_mask();
        assert_eq!(&mask[..MOVE_SLOTS], &[true, true, false, false]);
        // Pex legal, Dozer fainted
        assert_eq!(&mask[MOVE_SLOTS..], &[true, false, false, false, false]);
    }

    #[test]
    fn test_episode_runs_to_win() {
        let (mut env, logs) = create_test_env(win_on_second);
        env.reset(None).unwrap();

        let first = env.step(0).unwrap();
        assert!(!first.done);
        assert!((first.reward - 0.3).abs() < 1e-5);
        assert_eq!(first.info.turn, 2);
        assert_eq!(env.env_state(), EnvState::Stepping);

        let second = env.step(1).unwrap();
        assert!(second.done);
        assert!(!second.truncated);
        assert!(second.info.terminated && second.info.won);
        assert_eq!(second.info.outcome, Outcome::Won);
        assert!((second.reward - 1.7).abs() < 1e-5);

        assert!(matches!(env.step(0), Err(EnvError::EpisodeDone)));
        assert_eq!(env.legal_mask(), vec![false; 9]);
        assert!(env.state().unwrap().is_ended());

        let log = sent(&logs, 0);
        assert!(log.contains(&format!("{ROOM}|/choose move 1|1")));
        assert!(log.contains(&format!("{ROOM}|/choose move 2|2")));
        assert!(!log.iter().any(|l| l.ends_with("/forfeit")));
    }

    #[test]
    fn test_turn_limit_truncates() {
        let (connector, logs) = create_test_connector(play_turn);
        let config = EnvConfig {
            max_turns: Some(1),
            ..create_test_config()
        };
        let mut env = ShowdownEnv::new(config, connector).unwrap();
        env.reset(None).unwrap();

        let result = env.step(0).unwrap();
        assert!(result.done && result.truncated);
        assert!(!result.info.terminated);
        assert_eq!(result.info.truncation, Some(TruncationReason::TurnLimit));
        assert!(sent(&logs, 0).contains(&format!("{ROOM}|/forfeit")));
    }

    #[test]
    fn test_timeout_truncates() {
        let (mut env, _) = create_test_env(go_quiet);
        env.reset(None).unwrap();

        let result = env.step(0).unwrap();
        assert!(result.done && result.truncated);
        assert_eq!(result.info.truncation, Some(TruncationReason::Timeout));
        assert_eq!(result.reward, 0.0);
    }

    #[test]
    fn test_desync_ends_episode_with_error() {
        let (mut env, _) = create_test_env(desync);
        env.reset(None).unwrap();

        let result = env.step(0).unwrap();
        assert!(result.done);
        assert_eq!(result.info.truncation, Some(TruncationReason::StateError));
        assert!(result.info.error.as_deref().unwrap().contains("Ghost"));
    }

    #[test]
    fn test_connection_loss_is_surfaced() {
        let (mut env, logs) = create_test_env(hang_up);
        env.reset(None).unwrap();

        assert!(matches!(
            env.step(0),
            Err(EnvError::Session(SessionError::Closed))
        ));
        assert_eq!(env.env_state(), EnvState::Done);
        assert!(matches!(env.step(0), Err(EnvError::EpisodeDone)));
        assert_eq!(env.legal_mask(), vec![false; 9]);

        // nothing goes out once the link is down
        let log = sent(&logs, 0);
        assert_eq!(log.last().unwrap(), &format!("{ROOM}|/choose move 1|1"));
        assert_eq!(logs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_action_plays_first_legal() {
        let (mut env, logs) = create_test_env(play_turn);
        env.reset(None).unwrap();

        // Dozer has fainted
        let result = env.step(MOVE_SLOTS + 1).unwrap();
        assert_eq!(result.info.invalid_action, Some(MOVE_SLOTS + 1));
        assert_eq!(result.info.applied_action, Some(0));
        assert!(!result.done);

        let result = env.step(99).unwrap();
        assert_eq!(result.info.invalid_action, Some(99));
        assert_eq!(sent(&logs, 0).last().unwrap(), &format!("{ROOM}|/choose move 1|2"));
    }

    #[test]
    fn test_reset_twice_gives_fresh_episode() {
        let (mut env, logs) = create_test_env(play_turn);
        env.reset(None).unwrap();
        env.reset(None).unwrap();

        let first = sent(&logs, 0);
        assert!(first.contains(&format!("{ROOM}|/forfeit")));
        assert!(first.contains(&format!("|/leave {ROOM}")));

        let result = env.step(MOVE_SLOTS).unwrap();
        assert!(!result.done);
        assert!(sent(&logs, 1).contains(&format!("{ROOM}|/choose switch 2|1")));
        assert!(!sent(&logs, 0).iter().any(|l| l.contains("switch")));

        let names = env.connector().agent_usernames();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn test_seeded_reset_is_reproducible() {
        let (mut a, _) = create_test_env(play_turn);
        let (mut b, _) = create_test_env(play_turn);
        let obs_a = a.reset(Some(42)).unwrap();
        let obs_b = b.reset(Some(42)).unwrap();

        assert_eq!(obs_a, obs_b);
        assert_eq!(a.connector().agent_usernames(), b.connector().agent_usernames());
    }

    #[test]
    fn test_close_forfeits_running_episode() {
        let (mut env, logs) = create_test_env(play_turn);
        env.reset(None).unwrap();
        env.close();

        assert_eq!(env.env_state(), EnvState::Unopened);
        assert!(sent(&logs, 0).contains(&format!("{ROOM}|/forfeit")));
        assert!(matches!(env.step(0), Err(EnvError::NotReady)));
    }

    #[test]
    fn test_step_info_serializes() {
        let info = StepInfo {
            turn: 3,
            outcome: Outcome::Forfeited { agent_won: true },
            truncation: Some(TruncationReason::TurnLimit),
            ..StepInfo::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["turn"], 3);
        assert_eq!(json["truncation"], "turn_limit");
        assert_eq!(json["outcome"]["forfeited"]["agent_won"], true);
    }
}
