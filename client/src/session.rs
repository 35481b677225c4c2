//! One battle over one connection: handshake, decision points and choices

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sdgym_battle::TrackedBattle;
use sdgym_protocol::{
    BattleRequest, ClientCommand, ClientMessage, FrameDecoder, RawFrame, ServerMessage,
    parse_server_message, to_id,
};
use tokio::time::timeout;

use crate::auth::{self, LOGIN_URL};
use crate::decision::{Choice, DecisionRequest, SessionEvent};
use crate::error::{Result, SessionError};
use crate::transport::Transport;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// How the session gets into a battle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleTarget {
    /// Challenge a named user
    Challenge(String),
    /// Wait for a challenge from a named user and accept it
    Accept(String),
    /// Search the ladder
    Ladder,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    /// Only needed for servers that verify logins
    pub password: Option<String>,
    pub login_url: String,
    /// Packed team, `None` for formats where the server generates teams
    pub team: Option<String>,
    pub format: String,
    pub target: BattleTarget,
    /// Bound on every wait for the server
    pub decision_timeout: Duration,
}

impl SessionConfig {
    pub fn new(username: impl Into<String>, format: impl Into<String>, target: BattleTarget) -> Self {
        Self {
            username: username.into(),
            password: None,
            login_url: LOGIN_URL.to_string(),
            team: None,
            format: format.into(),
            target,
            decision_timeout: Duration::from_secs(30),
        }
    }
}

/// A protocol session driving a single battle.
///
/// Frames are applied to the tracked battle strictly in arrival order. A request becomes a
/// decision only once the battle log it belongs to has arrived, whichever of the two the
/// server sends first.
pub struct ProtocolSession<T: Transport> {
    transport: T,
    decoder: FrameDecoder,
    config: SessionConfig,
    id: u64,
    username: String,
    room_id: Option<String>,
    battle: TrackedBattle,

    /// Latest request that still needs an answer but has not been handed out
    pending: Option<BattleRequest>,
    /// Sequence number of the decision handed out and not yet answered
    outstanding: Option<u64>,
    last_issued: Option<BattleRequest>,
    next_seq: u64,
    /// Turn of the last move decision
    last_move_turn: u32,
    /// A battle log frame arrived since the last choice
    log_since_choice: bool,
    /// The server rejected the last choice
    rearm: bool,
    closed: bool,
}

impl<T: Transport> ProtocolSession<T> {
    /// Log in and start a battle
    pub async fn open(transport: T, config: SessionConfig) -> Result<Self> {
        let mut session = Self::login(transport, config).await?;
        session.start_battle().await?;
        Ok(session)
    }

    /// Wait for the challstr, log in and wait for the server to confirm the name
    pub async fn login(transport: T, config: SessionConfig) -> Result<Self> {
        let mut session = Self {
            transport,
            decoder: FrameDecoder::new(),
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            username: config.username.clone(),
            room_id: None,
            battle: TrackedBattle::new("", &config.username),
            config,
            pending: None,
            outstanding: None,
            last_issued: None,
            next_seq: 0,
            last_move_turn: 0,
            log_since_choice: false,
            rearm: false,
            closed: false,
        };
        let limit = session.config.decision_timeout;
        timeout(limit, session.log_in())
            .await
            .map_err(|_| SessionError::Timeout(limit))??;
        Ok(session)
    }

    /// Send the team, then challenge, accept or search, and wait for the battle room
    pub async fn start_battle(&mut self) -> Result<()> {
        let limit = self.config.decision_timeout;
        timeout(limit, self.enter_battle())
            .await
            .map_err(|_| SessionError::Timeout(limit))?
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn battle(&self) -> &TrackedBattle {
        &self.battle
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send a raw client message
    pub async fn send(&mut self, message: ClientMessage) -> Result<()> {
        let wire = message.to_wire_format();
        tracing::debug!(user = %self.username, message = %wire, "send");
        self.transport.send(wire).await.map_err(SessionError::Transport)
    }

    /// Suspend until the next decision point or the end of the battle
    pub async fn await_decision(&mut self) -> Result<SessionEvent> {
        let limit = self.config.decision_timeout;
        match timeout(limit, self.next_event()).await {
            Ok(event) => event,
            Err(_) => {
                tracing::warn!(room = ?self.room_id, timeout = ?limit, "no decision point in time");
                Err(SessionError::Timeout(limit))
            }
        }
    }

    /// Answer a decision request; answering twice or answering an old request fails
    pub async fn send_choice(&mut self, decision: &DecisionRequest, choice: &Choice) -> Result<()> {
        if decision.session_id != self.id || self.outstanding != Some(decision.seq) {
            return Err(SessionError::StaleRequest { seq: decision.seq });
        }
        self.outstanding = None;
        self.submit(&choice.to_string(), decision.rqid()).await
    }

    /// Forfeit an unfinished battle, leave the room and close the transport
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pending = None;
        self.outstanding = None;

        if let Some(room) = self.room_id.clone() {
            if !self.battle.is_ended()
                && let Err(e) = self
                    .send(ClientMessage::in_room(room.clone(), ClientCommand::Forfeit))
                    .await
            {
                tracing::warn!(room = %room, error = %e, "failed to forfeit");
            }
            if let Err(e) = self
                .send(ClientMessage::global(ClientCommand::LeaveRoom(room.clone())))
                .await
            {
                tracing::warn!(room = %room, error = %e, "failed to leave room");
            }
        }
        self.transport.close().await.map_err(SessionError::Transport)
    }

    async fn log_in(&mut self) -> Result<()> {
        let challstr = loop {
            let frame = self.next_frame().await?;
            let found = parse_lines(&frame).find_map(|msg| match msg {
                ServerMessage::Challstr(challstr) => Some(challstr),
                _ => None,
            });
            if let Some(challstr) = found {
                break challstr;
            }
        };

        let assertion = match &self.config.password {
            Some(password) => auth::get_assertion(
                &self.config.login_url,
                &self.config.username,
                password,
                &challstr,
            )
            .await
            .map_err(SessionError::Login)?,
            None => String::new(),
        };

        self.send(ClientMessage::global(ClientCommand::TrustedLogin {
            username: self.config.username.clone(),
            assertion,
        }))
        .await?;

        loop {
            let frame = self.next_frame().await?;
            for msg in parse_lines(&frame) {
                match msg {
                    ServerMessage::UpdateUser {
                        username,
                        named: true,
                        ..
                    } => {
                        tracing::info!(user = %username, "logged in");
                        self.battle = TrackedBattle::new("", &username);
                        self.username = username;
                        return Ok(());
                    }
                    ServerMessage::NameTaken { username, message } => {
                        return Err(SessionError::Login(anyhow::anyhow!("{username}: {message}")));
                    }
                    _ => {}
                }
            }
        }
    }

    async fn enter_battle(&mut self) -> Result<()> {
        let team = self.config.team.clone().unwrap_or_else(|| "null".to_string());
        self.send(ClientMessage::global(ClientCommand::UpdateTeam(team)))
            .await?;

        let format = self.config.format.clone();
        match self.config.target.clone() {
            BattleTarget::Challenge(opponent) => {
                self.send(ClientMessage::global(ClientCommand::Challenge {
                    username: opponent,
                    format,
                }))
                .await?
            }
            BattleTarget::Ladder => {
                self.send(ClientMessage::global(ClientCommand::Search(format)))
                    .await?
            }
            BattleTarget::Accept(_) => {}
        }

        let mut accepted = false;
        loop {
            let frame = self.next_frame().await?;
            if let Some(room) = frame.room_id.as_deref().filter(|r| r.starts_with("battle-")) {
                if frame.lines.iter().any(|l| l.starts_with("|init|battle")) {
                    tracing::info!(room, user = %self.username, "battle started");
                    self.room_id = Some(room.to_string());
                    self.battle = TrackedBattle::new(room, &self.username);
                    return self.handle_battle_frame(&frame).await;
                }
                continue;
            }

            for msg in parse_lines(&frame) {
                match msg {
                    ServerMessage::UpdateChallenges(state) => {
                        if let BattleTarget::Accept(from) = &self.config.target
                            && !accepted
                            && state.challenges_from.contains_key(&to_id(from))
                        {
                            let from = from.clone();
                            self.send(ClientMessage::global(ClientCommand::Accept(from)))
                                .await?;
                            accepted = true;
                        }
                    }
                    ServerMessage::Popup(text) => {
                        return Err(SessionError::Protocol(format!("server popup: {text}")));
                    }
                    _ => {}
                }
            }
        }
    }

    async fn next_event(&mut self) -> Result<SessionEvent> {
        loop {
            if let Some(event) = self.ready_event() {
                return Ok(event);
            }
            let frame = self.next_frame().await?;
            if frame.room_id.is_some() && frame.room_id == self.room_id {
                self.handle_battle_frame(&frame).await?;
            } else {
                for msg in parse_lines(&frame) {
                    if let ServerMessage::Popup(text) = msg {
                        tracing::warn!(popup = %text, "server popup");
                    }
                }
            }
        }
    }

    /// Hand out the pending request if the battle has caught up with it
    fn ready_event(&mut self) -> Option<SessionEvent> {
        if self.battle.is_ended() {
            return Some(SessionEvent::Ended(self.battle.outcome()));
        }

        let request = self.pending.as_ref()?;
        let force_switch = request.is_force_switch();
        let ready = self.rearm
            || if force_switch {
                self.log_since_choice
            } else {
                self.battle.turn > self.last_move_turn
            };
        if !ready {
            return None;
        }

        let request = self.pending.take()?;
        if !force_switch {
            self.last_move_turn = self.battle.turn;
        }
        self.next_seq += 1;
        self.outstanding = Some(self.next_seq);
        self.last_issued = Some(request.clone());
        self.battle.mark_awaiting_decision();

        let decision = DecisionRequest {
            session_id: self.id,
            seq: self.next_seq,
            turn: self.battle.turn,
            rearmed: std::mem::take(&mut self.rearm),
            request,
        };
        Some(SessionEvent::Decision(decision))
    }

    async fn handle_battle_frame(&mut self, frame: &RawFrame) -> Result<()> {
        let mut saw_log = false;
        for msg in parse_lines(frame) {
            match msg {
                ServerMessage::Request(Some(request)) => self.receive_request(*request).await?,
                ServerMessage::Request(None) => {}
                ServerMessage::Error(text) => self.receive_error(&text),
                ServerMessage::Deinit if !self.battle.is_ended() => return Err(SessionError::Closed),
                msg => {
                    saw_log |= msg.is_battle_delta();
                    self.battle.apply(&msg)?;
                }
            }
        }
        if saw_log {
            self.log_since_choice = true;
        }
        Ok(())
    }

    async fn receive_request(&mut self, request: BattleRequest) -> Result<()> {
        self.battle.apply_request(&request)?;

        if request.team_preview {
            // Keep the team in its submitted order
            return self.submit(&Choice::Default.to_string(), request.rqid).await;
        }
        self.pending = request.needs_decision().then_some(request);
        Ok(())
    }

    fn receive_error(&mut self, text: &str) {
        if text.starts_with("[Invalid choice]") || text.starts_with("[Unavailable choice]") {
            tracing::warn!(room = ?self.room_id, error = %text, "choice rejected");
            self.rearm = true;
            if self.pending.is_none() {
                self.pending = self.last_issued.clone();
            }
        } else {
            tracing::warn!(room = ?self.room_id, error = %text, "server error");
        }
    }

    async fn submit(&mut self, choice: &str, rqid: Option<u64>) -> Result<()> {
        let room = self
            .room_id
            .clone()
            .ok_or_else(|| SessionError::Protocol("no battle room".to_string()))?;
        self.send(ClientMessage::in_room(
            room,
            ClientCommand::Choose {
                choice: choice.to_string(),
                rqid,
            },
        ))
        .await?;
        self.log_since_choice = false;
        self.battle.choice_submitted();
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<RawFrame> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(frame);
            }
            match self.transport.recv().await.map_err(SessionError::Transport)? {
                Some(chunk) => self.decoder.push(&chunk),
                None => return Err(SessionError::Closed),
            }
        }
    }
}

/// Parse every line of a frame, logging and skipping malformed ones
fn parse_lines(frame: &RawFrame) -> impl Iterator<Item = ServerMessage> + '_ {
    frame
        .lines
        .iter()
        .filter_map(|line| match parse_server_message(line) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::warn!(line = %line, error = %e, "malformed server message");
                None
            }
        })
}
