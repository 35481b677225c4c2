//! In-memory transport replaying a scripted server

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use sdgym_protocol::frame_text;

use crate::transport::Transport;

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

/// Plays back server messages and answers sent lines through a responder closure.
///
/// Each scripted message is framed like a websocket message. Once the script is
/// exhausted `recv` never completes, so callers see their own timeouts fire.
/// A [`ScriptedTransport::HANG_UP`] entry ends the stream instead.
pub struct ScriptedTransport {
    /// `None` is a hang-up
    incoming: VecDeque<Option<String>>,
    responder: Responder,
    sent: Arc<Mutex<Vec<String>>>,
    closed: bool,
}

impl ScriptedTransport {
    /// Script or responder entry that drops the connection
    pub const HANG_UP: &'static str = "<hang up>";

    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            incoming: messages.into_iter().map(|m| scripted(m.as_ref())).collect(),
            responder: Box::new(|_| Vec::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: false,
        }
    }

    /// Messages returned by `responder` are queued whenever a line is sent
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    /// Shared log of every line sent through this transport
    pub fn sent_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, message: String) -> Result<()> {
        if self.closed {
            bail!("transport closed");
        }
        let replies = (self.responder)(&message);
        self.sent
            .lock()
            .map_err(|_| anyhow!("sent log poisoned"))?
            .push(message);
        self.incoming
            .extend(replies.iter().map(|reply| scripted(reply)));
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        match self.incoming.pop_front() {
            Some(Some(message)) => Ok(Some(message)),
            Some(None) => {
                self.closed = true;
                Ok(None)
            }
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn scripted(message: &str) -> Option<String> {
    (message != ScriptedTransport::HANG_UP).then(|| frame_text(message))
}
