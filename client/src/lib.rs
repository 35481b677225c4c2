//! Async protocol session for Pokemon Showdown battles
//!
//! A [`ProtocolSession`] logs in, enters one battle and turns the server's interleaved
//! stream of battle log frames and requests into discrete decision points. The wire is
//! abstracted behind [`Transport`] so the same session runs over a websocket or over a
//! [`ScriptedTransport`] in tests.

pub mod auth;
mod decision;
mod error;
mod scripted;
mod session;
mod transport;

pub use decision::{Choice, DecisionRequest, SessionEvent};
pub use error::{Result, SessionError};
pub use scripted::ScriptedTransport;
pub use session::{BattleTarget, ProtocolSession, SessionConfig};
pub use transport::{Transport, WsTransport};

pub use sdgym_protocol::{BattleRequest, ClientCommand, ClientMessage};
