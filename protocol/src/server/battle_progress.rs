//! Turn flow messages: requests, turn counter, battle end

use anyhow::{Context, Result};

use super::fields::Fields;
use super::request::BattleRequest;
use super::ServerMessage;

/// |request|REQUEST where REQUEST is JSON, or empty once the battle is over
pub fn parse_request(fields: &Fields<'_>) -> Result<ServerMessage> {
    let json = fields.rest(2);
    if json.trim().is_empty() || json.trim() == "null" {
        return Ok(ServerMessage::Request(None));
    }

    let request: BattleRequest =
        serde_json::from_str(&json).context("Failed to parse request JSON")?;
    Ok(ServerMessage::Request(Some(Box::new(request))))
}

/// |turn|NUMBER
pub fn parse_turn(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Turn(fields.number(2, "turn number")?))
}
