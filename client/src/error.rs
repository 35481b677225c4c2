use std::time::Duration;

use sdgym_battle::StateConsistencyError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The server said something the session cannot work with
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("no response from server within {0:?}")]
    Timeout(Duration),

    #[error("connection closed")]
    Closed,

    /// A decision request was answered twice, superseded, or belongs to another session
    #[error("decision request {seq} is stale")]
    StaleRequest { seq: u64 },

    #[error(transparent)]
    State(#[from] StateConsistencyError),

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),

    #[error("login failed: {0:#}")]
    Login(anyhow::Error),
}
