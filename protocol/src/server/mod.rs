pub mod battle;
mod battle_init;
mod battle_major;
mod battle_minor;
mod battle_progress;
mod fields;
mod global;
pub mod lines;
pub mod request;
mod tests;

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

use battle::{GameType, HpStatus, Player, Pokemon, PokemonDetails, Side, Stat};
use fields::Fields;
use request::BattleRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    // === Global ===
    Challstr(String),
    UpdateUser {
        username: String,
        named: bool,
        avatar: String,
    },
    NameTaken {
        username: String,
        message: String,
    },
    Popup(String),
    Pm {
        sender: String,
        receiver: String,
        message: String,
    },
    UpdateChallenges(ChallengeState),
    UpdateSearch(SearchState),

    // === Room ===
    Init(RoomType),
    Deinit,
    Title(String),
    Error(String),

    // === Battle initialization ===
    BattlePlayer {
        player: Player,
        username: String,
        avatar: String,
        rating: Option<u32>,
    },
    TeamSize {
        player: Player,
        size: u8,
    },
    GameType(GameType),
    Gen(u8),
    Tier(String),
    ClearPoke,
    Poke {
        player: Player,
        details: PokemonDetails,
        has_item: bool,
    },
    TeamPreview(Option<u8>),
    BattleStart,

    // === Battle progress ===
    /// `None` for the empty request sent once a battle is over
    Request(Option<Box<BattleRequest>>),
    Inactive(String),
    Upkeep,
    Turn(u32),
    Win(String),
    Tie,

    // === Major actions ===
    Move {
        pokemon: Pokemon,
        move_name: String,
        target: Option<Pokemon>,
        miss: bool,
        from: Option<String>,
    },
    Switch {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    Drag {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    Replace {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    DetailsChange {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    FormeChange {
        pokemon: Pokemon,
        species: String,
        hp_status: Option<HpStatus>,
    },
    Faint(Pokemon),
    Cant {
        pokemon: Pokemon,
        reason: String,
        move_name: Option<String>,
    },

    // === Minor actions ===
    Damage {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
        from: Option<String>,
    },
    Heal {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
        from: Option<String>,
    },
    SetHp {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
    },
    Status {
        pokemon: Pokemon,
        status: String,
    },
    CureStatus {
        pokemon: Pokemon,
        status: String,
    },
    CureTeam(Pokemon),
    Boost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    Unboost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    SetBoost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    ClearBoost(Pokemon),
    ClearAllBoost,
    ClearPositiveBoost(Pokemon),
    ClearNegativeBoost(Pokemon),
    InvertBoost(Pokemon),
    Weather {
        weather: String,
        upkeep: bool,
    },
    FieldStart(String),
    FieldEnd(String),
    SideStart {
        side: Side,
        condition: String,
    },
    SideEnd {
        side: Side,
        condition: String,
    },
    SwapSideConditions,
    VolatileStart {
        pokemon: Pokemon,
        effect: String,
    },
    VolatileEnd {
        pokemon: Pokemon,
        effect: String,
    },
    Item {
        pokemon: Pokemon,
        item: String,
        from: Option<String>,
    },
    EndItem {
        pokemon: Pokemon,
        item: String,
        from: Option<String>,
    },
    Ability {
        pokemon: Pokemon,
        ability: String,
        from: Option<String>,
    },
    Transform {
        pokemon: Pokemon,
        into: String,
    },
    Terastallize {
        pokemon: Pokemon,
        tera_type: String,
    },
    Message(String),

    /// Anything not modelled above, kept verbatim
    Raw(String),
}

impl ServerMessage {
    /// Whether this message changes battle state (as opposed to chat, timers or UI hints)
    pub fn is_battle_delta(&self) -> bool {
        !matches!(
            self,
            ServerMessage::Challstr(_)
                | ServerMessage::UpdateUser { .. }
                | ServerMessage::NameTaken { .. }
                | ServerMessage::Popup(_)
                | ServerMessage::Pm { .. }
                | ServerMessage::UpdateChallenges(_)
                | ServerMessage::UpdateSearch(_)
                | ServerMessage::Init(_)
                | ServerMessage::Deinit
                | ServerMessage::Title(_)
                | ServerMessage::Error(_)
                | ServerMessage::Request(_)
                | ServerMessage::Inactive(_)
                | ServerMessage::Raw(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Chat,
    Battle,
}

/// Payload of `|updatechallenges|`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    /// Challenger id to format
    #[serde(default)]
    pub challenges_from: HashMap<String, String>,
    #[serde(default)]
    pub challenge_to: Option<OutgoingChallenge>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutgoingChallenge {
    pub to: String,
    pub format: String,
}

/// Payload of `|updatesearch|`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SearchState {
    #[serde(default)]
    pub searching: Vec<String>,
    /// Room id to title for battles in progress
    #[serde(default)]
    pub games: Option<HashMap<String, String>>,
}

/// Parse a single line from the server into a ServerMessage
pub fn parse_server_message(line: &str) -> Result<ServerMessage> {
    let line = line.trim_end_matches(['\r', '\n']);

    if !line.starts_with('|') {
        return Ok(ServerMessage::Raw(line.to_string()));
    }

    let parts: Vec<&str> = line.split('|').collect();
    let fields = Fields::new(&parts);

    match parts.get(1).copied().unwrap_or_default() {
        // Global
        "challstr" => global::parse_challstr(&fields),
        "updateuser" => global::parse_updateuser(&fields),
        "nametaken" => global::parse_nametaken(&fields),
        "popup" => Ok(ServerMessage::Popup(fields.rest(2))),
        "pm" => global::parse_pm(&fields),
        "updatechallenges" => global::parse_updatechallenges(&fields),
        "updatesearch" => global::parse_updatesearch(&fields),
        "init" => global::parse_init(&fields),
        "deinit" => Ok(ServerMessage::Deinit),
        "title" => Ok(ServerMessage::Title(fields.rest(2))),
        "error" => Ok(ServerMessage::Error(fields.rest(2))),

        // Battle initialization
        "player" => battle_init::parse_player(&fields),
        "teamsize" => battle_init::parse_teamsize(&fields),
        "gametype" => battle_init::parse_gametype(&fields),
        "gen" => battle_init::parse_gen(&fields),
        "tier" => Ok(ServerMessage::Tier(fields.text(2))),
        "clearpoke" => Ok(ServerMessage::ClearPoke),
        "poke" => battle_init::parse_poke(&fields),
        "teampreview" => Ok(ServerMessage::TeamPreview(
            fields.get(2).and_then(|s| s.parse().ok()),
        )),
        "start" => Ok(ServerMessage::BattleStart),

        // Battle progress
        "request" => battle_progress::parse_request(&fields),
        "inactive" => Ok(ServerMessage::Inactive(fields.rest(2))),
        "upkeep" => Ok(ServerMessage::Upkeep),
        "turn" => battle_progress::parse_turn(&fields),
        "win" => Ok(ServerMessage::Win(fields.text(2))),
        "tie" => Ok(ServerMessage::Tie),

        // Major actions
        "move" => battle_major::parse_move(&fields),
        "switch" => battle_major::parse_switch(&fields),
        "drag" => battle_major::parse_drag(&fields),
        "replace" => battle_major::parse_replace(&fields),
        "detailschange" => battle_major::parse_detailschange(&fields),
        "-formechange" => battle_major::parse_formechange(&fields),
        "faint" => Ok(ServerMessage::Faint(fields.pokemon(2)?)),
        "cant" => battle_major::parse_cant(&fields),

        // Minor actions
        "-damage" => battle_minor::parse_damage(&fields),
        "-heal" => battle_minor::parse_heal(&fields),
        "-sethp" => battle_minor::parse_sethp(&fields),
        "-status" => battle_minor::parse_status(&fields),
        "-curestatus" => battle_minor::parse_curestatus(&fields),
        "-cureteam" => Ok(ServerMessage::CureTeam(fields.pokemon(2)?)),
        "-boost" | "-unboost" | "-setboost" => battle_minor::parse_boost(&fields),
        "-clearboost" => Ok(ServerMessage::ClearBoost(fields.pokemon(2)?)),
        "-clearallboost" => Ok(ServerMessage::ClearAllBoost),
        "-clearpositiveboost" => Ok(ServerMessage::ClearPositiveBoost(fields.pokemon(2)?)),
        "-clearnegativeboost" => Ok(ServerMessage::ClearNegativeBoost(fields.pokemon(2)?)),
        "-invertboost" => Ok(ServerMessage::InvertBoost(fields.pokemon(2)?)),
        "-weather" => battle_minor::parse_weather(&fields),
        "-fieldstart" => Ok(ServerMessage::FieldStart(fields.text(2))),
        "-fieldend" => Ok(ServerMessage::FieldEnd(fields.text(2))),
        "-sidestart" | "-sideend" => battle_minor::parse_side_condition(&fields),
        "-swapsideconditions" => Ok(ServerMessage::SwapSideConditions),
        "-start" | "-end" => battle_minor::parse_volatile(&fields),
        "-item" | "-enditem" => battle_minor::parse_item(&fields),
        "-ability" => battle_minor::parse_ability(&fields),
        "-transform" => battle_minor::parse_transform(&fields),
        "-terastallize" => battle_minor::parse_terastallize(&fields),
        "-message" => Ok(ServerMessage::Message(fields.rest(2))),

        _ => Ok(ServerMessage::Raw(line.to_string())),
    }
}
