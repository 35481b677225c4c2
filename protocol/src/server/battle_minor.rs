//! Minor battle actions: HP, status, boosts, field and side effects

use anyhow::Result;

use super::battle::Side;
use super::fields::Fields;
use super::ServerMessage;
use crate::ParseError;

/// |-damage|POKEMON|HP STATUS
pub fn parse_damage(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Damage {
        pokemon: fields.pokemon(2)?,
        hp_status: fields.hp(3),
        from: fields.tag("[from]"),
    })
}

/// |-heal|POKEMON|HP STATUS
pub fn parse_heal(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Heal {
        pokemon: fields.pokemon(2)?,
        hp_status: fields.hp(3),
        from: fields.tag("[from]"),
    })
}

/// |-sethp|POKEMON|HP
pub fn parse_sethp(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::SetHp {
        pokemon: fields.pokemon(2)?,
        hp_status: fields.hp(3),
    })
}

/// |-status|POKEMON|STATUS
pub fn parse_status(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Status {
        pokemon: fields.pokemon(2)?,
        status: fields.required(3, "status")?.to_string(),
    })
}

/// |-curestatus|POKEMON|STATUS
pub fn parse_curestatus(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::CureStatus {
        pokemon: fields.pokemon(2)?,
        status: fields.text(3),
    })
}

/// |-boost|, |-unboost| and |-setboost|, all POKEMON|STAT|AMOUNT
pub fn parse_boost(fields: &Fields<'_>) -> Result<ServerMessage> {
    let pokemon = fields.pokemon(2)?;
    let stat = fields.stat(3)?;
    let amount = fields.number(4, "boost amount")?;

    match fields.get(1) {
        Some("-boost") => Ok(ServerMessage::Boost {
            pokemon,
            stat,
            amount,
        }),
        Some("-unboost") => Ok(ServerMessage::Unboost {
            pokemon,
            stat,
            amount,
        }),
        _ => Ok(ServerMessage::SetBoost {
            pokemon,
            stat,
            amount,
        }),
    }
}

/// |-weather|WEATHER or |-weather|WEATHER|[upkeep]
pub fn parse_weather(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Weather {
        weather: fields.text(2),
        upkeep: fields.flag("[upkeep]"),
    })
}

/// |-sidestart|SIDE|CONDITION and |-sideend|SIDE|CONDITION
pub fn parse_side_condition(fields: &Fields<'_>) -> Result<ServerMessage> {
    let raw = fields.required(2, "side")?;
    let side =
        Side::parse(raw).ok_or_else(|| ParseError::InvalidFormat(format!("side: {raw}")))?;
    let condition = fields.required(3, "side condition")?.to_string();

    if fields.get(1) == Some("-sidestart") {
        Ok(ServerMessage::SideStart { side, condition })
    } else {
        Ok(ServerMessage::SideEnd { side, condition })
    }
}

/// |-start|POKEMON|EFFECT and |-end|POKEMON|EFFECT
pub fn parse_volatile(fields: &Fields<'_>) -> Result<ServerMessage> {
    let pokemon = fields.pokemon(2)?;
    let effect = fields.required(3, "effect")?.to_string();

    if fields.get(1) == Some("-start") {
        Ok(ServerMessage::VolatileStart { pokemon, effect })
    } else {
        Ok(ServerMessage::VolatileEnd { pokemon, effect })
    }
}

/// |-item|POKEMON|ITEM and |-enditem|POKEMON|ITEM
pub fn parse_item(fields: &Fields<'_>) -> Result<ServerMessage> {
    let pokemon = fields.pokemon(2)?;
    let item = fields.text(3);
    let from = fields.tag("[from]");

    if fields.get(1) == Some("-item") {
        Ok(ServerMessage::Item {
            pokemon,
            item,
            from,
        })
    } else {
        Ok(ServerMessage::EndItem {
            pokemon,
            item,
            from,
        })
    }
}

/// |-ability|POKEMON|ABILITY
pub fn parse_ability(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Ability {
        pokemon: fields.pokemon(2)?,
        ability: fields.required(3, "ability")?.to_string(),
        from: fields.tag("[from]"),
    })
}

/// |-transform|POKEMON|SPECIES
pub fn parse_transform(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Transform {
        pokemon: fields.pokemon(2)?,
        into: fields.text(3),
    })
}

/// |-terastallize|POKEMON|TYPE
pub fn parse_terastallize(fields: &Fields<'_>) -> Result<ServerMessage> {
    Ok(ServerMessage::Terastallize {
        pokemon: fields.pokemon(2)?,
        tera_type: fields.required(3, "tera type")?.to_string(),
    })
}
