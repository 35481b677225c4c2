//! How an episode gets its sessions: live websocket links or scripted transports

use sdgym_client::{
    ProtocolSession, Result, ScriptedTransport, SessionConfig, SessionError, Transport,
    WsTransport,
};
use tokio::task::JoinHandle;

use crate::opponent::{OpponentAgent, OpponentPolicy, run_opponent};

/// Everything needed to open one episode
#[derive(Debug, Clone)]
pub struct EpisodeSetup {
    pub agent: SessionConfig,
    pub opponent: SessionConfig,
    pub opponent_policy: OpponentPolicy,
    pub team_size: usize,
    pub opponent_seed: u64,
}

/// The agent's open session and the task playing the opponent, if any
pub struct Episode<T: Transport> {
    pub session: ProtocolSession<T>,
    pub opponent: Option<JoinHandle<()>>,
}

#[allow(async_fn_in_trait)]
pub trait Connector {
    type Transport: Transport;

    /// Open a session that has entered its battle
    async fn open(&mut self, setup: EpisodeSetup) -> Result<Episode<Self::Transport>>;
}

/// Two websocket links to one server: the agent and a bot playing the opponent policy
#[derive(Debug, Clone)]
pub struct WsConnector {
    server_url: String,
}

impl WsConnector {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn open(&mut self, setup: EpisodeSetup) -> Result<Episode<WsTransport>> {
        // The bot must be logged in before the agent's challenge reaches it
        let link = WsTransport::connect(&self.server_url)
            .await
            .map_err(SessionError::Transport)?;
        let bot = ProtocolSession::login(link, setup.opponent).await?;
        let agent = OpponentAgent::new(setup.opponent_policy, setup.team_size, setup.opponent_seed);
        tracing::debug!(bot = %bot.username(), "opponent logged in");
        let handle = tokio::spawn(run_opponent(bot, agent));

        let session = match WsTransport::connect(&self.server_url).await {
            Ok(link) => ProtocolSession::open(link, setup.agent).await,
            Err(e) => Err(SessionError::Transport(e)),
        };
        match session {
            Ok(session) => Ok(Episode {
                session,
                opponent: Some(handle),
            }),
            Err(e) => {
                handle.abort();
                Err(e)
            }
        }
    }
}

type TransportFactory = Box<dyn FnMut(&EpisodeSetup) -> ScriptedTransport + Send>;

/// Builds a scripted transport per episode; the script plays both the server and the opponent
pub struct ScriptedConnector {
    factory: TransportFactory,
    agent_usernames: Vec<String>,
}

impl ScriptedConnector {
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut(&EpisodeSetup) -> ScriptedTransport + Send + 'static,
    {
        Self {
            factory: Box::new(factory),
            agent_usernames: Vec::new(),
        }
    }

    /// Agent usernames of every episode opened so far
    pub fn agent_usernames(&self) -> &[String] {
        &self.agent_usernames
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn open(&mut self, setup: EpisodeSetup) -> Result<Episode<ScriptedTransport>> {
        let transport = (self.factory)(&setup);
        self.agent_usernames.push(setup.agent.username.clone());
        let session = ProtocolSession::open(transport, setup.agent).await?;
        Ok(Episode {
            session,
            opponent: None,
        })
    }
}
