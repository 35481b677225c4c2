//! Battle initialization messages, sent once when a battle room opens

use anyhow::Result;

use super::battle::GameType;
use super::fields::Fields;
use super::ServerMessage;
use crate::ParseError;

/// |player|PLAYER|USERNAME|AVATAR|RATING
pub fn parse_player(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::BattlePlayer {
        player: fields.player(2)?,
        username: fields.text(3),
        avatar: fields.text(4),
        rating: fields.get(5).and_then(|s| s.parse().ok()),
    })
}

/// |teamsize|PLAYER|NUMBER
pub fn parse_teamsize(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::TeamSize {
        player: fields.player(2)?,
        size: fields.number(3, "team size")?,
    })
}

/// |gametype|GAMETYPE
pub fn parse_gametype(fields: &Fields<'_>) -> Result<ServerMessage> {
    let raw = fields.required(2, "game type")?;
    GameType::parse(raw)
        .map(ServerMessage::GameType)
        .ok_or_else(|| ParseError::InvalidFormat(format!("game type: {raw}")).into())
}

/// |gen|GENNUM
pub fn parse_gen(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Gen(fields.number(2, "generation")?))
}

/// |poke|PLAYER|DETAILS|ITEM
pub fn parse_poke(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Poke {
        player: fields.player(2)?,
        details: fields.details(3),
        has_item: fields.get(4) == Some("item"),
    })
}
