//! Connection-level messages: login handshake, challenges, searches

use anyhow::Result;
use serde::de::DeserializeOwned;

use super::fields::Fields;
use super::{RoomType, ServerMessage};
use crate::ParseError;

const RANK_SYMBOLS: &[char] = &[' ', '+', '%', '@', '*', '#', '&', '~', '^', '\u{2606}', '!'];

/// Strip the leading rank symbol and trailing `@status` from a displayed username
fn display_name(raw: &str) -> String {
    let name = raw.strip_prefix(RANK_SYMBOLS).unwrap_or(raw);
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    name.trim().to_string()
}

fn json_payload<T: DeserializeOwned>(fields: &Fields<'_>, what: &str) -> Result<T> {
    let json = fields.rest(2);
    if json.is_empty() {
        return Err(ParseError::MissingField(format!("{what} json")).into());
    }
    serde_json::from_str(&json)
        .map_err(|e| ParseError::InvalidFormat(format!("invalid {what} json: {e}")).into())
}

/// |challstr|CHALLSTR (the challstr itself contains `|`)
pub fn parse_challstr(fields: &Fields<'_>) -> Result<ServerMessage> {
    let challstr = fields.rest(2);
    if challstr.is_empty() {
        return Err(ParseError::InvalidFormat("challstr cannot be empty".to_string()).into());
    }
    Ok(ServerMessage::Challstr(challstr))
}

/// |updateuser|USER|NAMED|AVATAR|SETTINGS
pub fn parse_updateuser(fields: &Fields<'_>) -> Result<ServerMessage> {
    let username = display_name(fields.required(2, "updateuser user")?);
    let named = fields.required(3, "updateuser named")? == "1";

    Ok(ServerMessage::UpdateUser {
        username,
        named,
        avatar: fields.text(4),
    })
}

/// |nametaken|USERNAME|MESSAGE
pub fn parse_nametaken(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::NameTaken {
        username: fields.text(2),
        message: fields.rest(3),
    })
}

/// |pm|SENDER|RECEIVER|MESSAGE
pub fn parse_pm(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Pm {
        sender: display_name(fields.required(2, "pm sender")?),
        receiver: display_name(fields.required(3, "pm receiver")?),
        message: fields.rest(4),
    })
}

pub fn parse_updatechallenges(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::UpdateChallenges(json_payload(
        fields,
        "updatechallenges",
    )?))
}

pub fn parse_updatesearch(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::UpdateSearch(json_payload(fields, "updatesearch")?))
}

/// |init|ROOMTYPE
pub fn parse_init(fields: &Fields<'_>) -> Result<ServerMessage> {
    match fields.required(2, "room type")? {
        "chat" => Ok(ServerMessage::Init(RoomType::Chat)),
        "battle" => Ok(ServerMessage::Init(RoomType::Battle)),
        other => Err(ParseError::InvalidFormat(format!("unknown room type: {other}")).into()),
    }
}
