//! JSON body of `|request|` messages

use serde::{Deserialize, Deserializer};

use super::battle::{HpStatus, Player, PokemonDetails};

/// A decision prompt for one player
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    /// Request id echoed back with the choice
    pub rqid: Option<u64>,

    /// Active creatures and their move slots
    #[serde(default)]
    pub active: Option<Vec<ActivePokemon>>,

    pub side: Option<SideInfo>,

    /// Per active slot, whether a replacement must be chosen
    #[serde(default)]
    pub force_switch: Option<Vec<bool>>,

    #[serde(default)]
    pub team_preview: bool,

    /// Nothing to choose; the foe is deciding
    #[serde(default)]
    pub wait: bool,

    #[serde(default)]
    pub no_cancel: bool,
}

impl BattleRequest {
    /// Whether a choice must be sent in response
    pub fn needs_decision(&self) -> bool {
        !self.wait && (self.team_preview || self.is_force_switch() || self.active.is_some())
    }

    pub fn is_force_switch(&self) -> bool {
        self.force_switch
            .as_ref()
            .is_some_and(|slots| slots.iter().any(|&b| b))
    }

    pub fn player(&self) -> Option<Player> {
        self.side.as_ref().and_then(SideInfo::player)
    }

    /// The first active slot, which is the only one in singles
    pub fn active_slot(&self) -> Option<&ActivePokemon> {
        self.active.as_ref().and_then(|slots| slots.first())
    }

    /// Party entries in request order (the order `switch N` refers to)
    pub fn party(&self) -> &[SidePokemon] {
        self.side.as_ref().map_or(&[], |side| side.pokemon.as_slice())
    }

    /// Party entries that could be switched in: 1-based position and entry
    pub fn available_switches(&self) -> Vec<(usize, &SidePokemon)> {
        self.party()
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.active && !p.is_fainted())
            .map(|(i, p)| (i + 1, p))
            .collect()
    }
}

/// One active creature's options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePokemon {
    #[serde(default)]
    pub moves: Vec<MoveSlot>,

    #[serde(default)]
    pub trapped: bool,

    #[serde(default)]
    pub maybe_trapped: bool,

    #[serde(default)]
    pub can_terastallize: Option<String>,
}

impl ActivePokemon {
    /// Usable move slots: 1-based slot number and slot
    pub fn available_moves(&self) -> Vec<(usize, &MoveSlot)> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_usable())
            .map(|(i, m)| (i + 1, m))
            .collect()
    }

    pub fn can_switch(&self) -> bool {
        !self.trapped
    }
}

/// A move slot on the active creature
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub name: String,

    pub id: String,

    /// Absent for locked-in moves, Struggle and Recharge
    #[serde(default)]
    pub pp: Option<u32>,

    #[serde(default, rename = "maxpp")]
    pub max_pp: Option<u32>,

    #[serde(default)]
    pub target: String,

    /// The server sends either `true`/`false` or the name of the disabling effect
    #[serde(default, deserialize_with = "flag_or_source")]
    pub disabled: bool,
}

impl MoveSlot {
    pub fn is_usable(&self) -> bool {
        !self.disabled && self.pp.is_none_or(|pp| pp > 0)
    }
}

fn flag_or_source<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Disabled {
        Flag(bool),
        Source(String),
    }

    Ok(match Option::<Disabled>::deserialize(deserializer)? {
        Some(Disabled::Flag(flag)) => flag,
        Some(Disabled::Source(source)) => !source.is_empty(),
        None => false,
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SideInfo {
    pub name: String,

    /// "p1" or "p2"
    pub id: String,

    #[serde(default)]
    pub pokemon: Vec<SidePokemon>,
}

impl SideInfo {
    pub fn player(&self) -> Option<Player> {
        Player::parse(&self.id)
    }
}

/// A party entry with full private information
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidePokemon {
    /// "p1: Nickname"
    pub ident: String,

    pub details: String,

    /// "HP/MAXHP STATUS" or "0 fnt"
    pub condition: String,

    #[serde(default)]
    pub active: bool,

    /// Absent in some requests; stats stay unknown then
    #[serde(default)]
    pub stats: Option<PokemonStats>,

    /// Move ids in slot order
    #[serde(default)]
    pub moves: Vec<String>,

    #[serde(default)]
    pub ability: String,

    #[serde(default)]
    pub item: String,

    #[serde(default)]
    pub teratype: Option<String>,
}

impl SidePokemon {
    pub fn is_fainted(&self) -> bool {
        self.condition_parsed().is_some_and(|hp| hp.is_fainted())
    }

    pub fn condition_parsed(&self) -> Option<HpStatus> {
        HpStatus::parse(&self.condition)
    }

    /// Nickname part of the ident
    pub fn name(&self) -> &str {
        self.ident
            .split_once(": ")
            .map_or(self.ident.as_str(), |(_, name)| name)
    }

    pub fn parsed_details(&self) -> PokemonDetails {
        PokemonDetails::parse(&self.details)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PokemonStats {
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request() -> BattleRequest {
        let json = r#"{
            "active": [{
                "moves": [
                    {"move": "Thunderbolt", "id": "thunderbolt", "pp": 24, "maxpp": 24, "target": "normal", "disabled": false},
                    {"move": "Protect", "id": "protect", "pp": 0, "maxpp": 16, "target": "self", "disabled": false},
                    {"move": "Surf", "id": "surf", "pp": 10, "maxpp": 24, "target": "normal", "disabled": "Torment"}
                ]
            }],
            "side": {
                "name": "Agent",
                "id": "p1",
                "pokemon": [
                    {"ident": "p1: Sparky", "details": "Pikachu, L88, M", "condition": "200/211", "active": true,
                     "stats": {"atk": 180, "def": 120, "spa": 200, "spd": 150, "spe": 280},
                     "moves": ["thunderbolt", "protect", "surf"], "ability": "static", "item": "lightball"},
                    {"ident": "p1: Garchomp", "details": "Garchomp, L80, F", "condition": "0 fnt", "active": false,
                     "stats": {"atk": 260, "def": 200, "spa": 160, "spd": 170, "spe": 210},
                     "moves": ["earthquake"], "ability": "roughskin", "item": ""},
                    {"ident": "p1: Toxapex", "details": "Toxapex, L84", "condition": "250/250 tox", "active": false,
                     "stats": {"atk": 120, "def": 300, "spa": 110, "spd": 260, "spe": 80},
                     "moves": ["recover"], "ability": "regenerator", "item": "blacksludge"}
                ]
            },
            "rqid": 7
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_move_request() {
        let request = create_test_request();

        assert_eq!(request.rqid, Some(7));
        assert!(request.needs_decision());
        assert!(!request.is_force_switch());
        assert_eq!(request.player(), Some(Player::P1));

        let active = request.active_slot().unwrap();
        assert_eq!(active.moves.len(), 3);
        assert!(active.moves[2].disabled);

        let usable: Vec<usize> = active.available_moves().iter().map(|(slot, _)| *slot).collect();
        assert_eq!(usable, vec![1]);
    }

    #[test]
    fn test_available_switches_skip_active_and_fainted() {
        let request = create_test_request();
        let switches: Vec<(usize, &str)> = request
            .available_switches()
            .into_iter()
            .map(|(pos, p)| (pos, p.name()))
            .collect();

        assert_eq!(switches, vec![(3, "Toxapex")]);
    }

    #[test]
    fn test_locked_move_without_pp() {
        let json = r#"{"active":[{"moves":[{"move":"Outrage","id":"outrage"}],"trapped":true}],
                       "side":{"name":"A","id":"p2","pokemon":[]},"rqid":3}"#;
        let request: BattleRequest = serde_json::from_str(json).unwrap();
        let active = request.active_slot().unwrap();

        assert_eq!(active.moves[0].pp, None);
        assert!(active.moves[0].is_usable());
        assert!(!active.can_switch());
    }

    #[test]
    fn test_force_switch_and_wait() {
        let json = r#"{"forceSwitch":[true],"side":{"name":"A","id":"p1","pokemon":[]},"rqid":9}"#;
        let request: BattleRequest = serde_json::from_str(json).unwrap();
        assert!(request.is_force_switch());
        assert!(request.needs_decision());

        let json = r#"{"wait":true,"side":{"name":"A","id":"p1","pokemon":[]}}"#;
        let request: BattleRequest = serde_json::from_str(json).unwrap();
        assert!(!request.needs_decision());
    }

    #[test]
    fn test_side_pokemon_accessors() {
        let request = create_test_request();
        let party = request.party();

        assert_eq!(party[0].name(), "Sparky");
        assert_eq!(party[0].parsed_details().species, "Pikachu");
        assert!(party[1].is_fainted());
        assert_eq!(
            party[2].condition_parsed().and_then(|hp| hp.status),
            Some("tox".to_string())
        );
    }
}
