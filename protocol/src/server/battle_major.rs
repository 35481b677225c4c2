//! Major battle actions: moves, switches, faints

use anyhow::Result;

use super::fields::Fields;
use super::ServerMessage;

/// |move|POKEMON|MOVE|TARGET with optional `[miss]` / `[from]` tags
pub fn parse_move(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Move {
        pokemon: fields.pokemon(2)?,
        move_name: fields.required(3, "move")?.to_string(),
        target: fields.maybe_pokemon(4),
        miss: fields.flag("[miss]"),
        from: fields.tag("[from]"),
    })
}

/// |switch|POKEMON|DETAILS|HP STATUS
pub fn parse_switch(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Switch {
        pokemon: fields.pokemon(2)?,
        details: fields.details(3),
        hp_status: fields.hp(4),
    })
}

/// |drag|POKEMON|DETAILS|HP STATUS
pub fn parse_drag(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Drag {
        pokemon: fields.pokemon(2)?,
        details: fields.details(3),
        hp_status: fields.hp(4),
    })
}

/// |replace|POKEMON|DETAILS|HP STATUS (Illusion ending)
pub fn parse_replace(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Replace {
        pokemon: fields.pokemon(2)?,
        details: fields.details(3),
        hp_status: fields.hp(4),
    })
}

/// |detailschange|POKEMON|DETAILS|HP STATUS
pub fn parse_detailschange(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::DetailsChange {
        pokemon: fields.pokemon(2)?,
        details: fields.details(3),
        hp_status: fields.hp(4),
    })
}

/// |-formechange|POKEMON|SPECIES|HP STATUS
pub fn parse_formechange(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::FormeChange {
        pokemon: fields.pokemon(2)?,
        species: fields.required(3, "species")?.to_string(),
        hp_status: fields.hp(4),
    })
}

/// |cant|POKEMON|REASON or |cant|POKEMON|REASON|MOVE
pub fn parse_cant(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Cant {
        pokemon: fields.pokemon(2)?,
        reason: fields.text(3),
        move_name: fields.opt(4),
    })
}
