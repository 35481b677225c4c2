//! Decision points handed out by a session

use std::fmt;
use std::str::FromStr;

use sdgym_battle::Outcome;
use sdgym_protocol::BattleRequest;

/// What `await_decision` resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Decision(DecisionRequest),
    Ended(Outcome),
}

/// A request the agent must answer exactly once.
///
/// Carries the id of the session that issued it and a sequence number, so an answer to an
/// old or foreign request is rejected instead of reaching the server.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub(crate) session_id: u64,
    pub(crate) seq: u64,
    pub(crate) turn: u32,
    pub(crate) rearmed: bool,
    pub(crate) request: BattleRequest,
}

impl DecisionRequest {
    pub fn request(&self) -> &BattleRequest {
        &self.request
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn rqid(&self) -> Option<u64> {
        self.request.rqid
    }

    /// Turn counter when the request became ready
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_force_switch(&self) -> bool {
        self.request.is_force_switch()
    }

    /// Re-issued because the server rejected the previous answer
    pub fn is_rearmed(&self) -> bool {
        self.rearmed
    }
}

/// An answer to a decision request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// 1-based move slot
    Move(usize),
    /// 1-based party position
    Switch(usize),
    /// Let the server pick
    Default,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Move(slot) => write!(f, "move {slot}"),
            Choice::Switch(position) => write!(f, "switch {position}"),
            Choice::Default => f.write_str("default"),
        }
    }
}

impl FromStr for Choice {
    type Err = String;

    /// Parses `move N`, `switch N` and `default`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "default" {
            return Ok(Choice::Default);
        }
        let (kind, slot) = s
            .split_once(' ')
            .ok_or_else(|| format!("invalid choice: {s}"))?;
        let slot: usize = slot
            .trim()
            .parse()
            .map_err(|_| format!("invalid slot in choice: {s}"))?;
        if slot == 0 {
            return Err(format!("slots are 1-based: {s}"));
        }
        match kind {
            "move" => Ok(Choice::Move(slot)),
            "switch" => Ok(Choice::Switch(slot)),
            _ => Err(format!("invalid choice: {s}")),
        }
    }
}
