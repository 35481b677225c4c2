//! Identifiers and value strings shared by battle messages

/// Player slot in a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    P1,
    P2,
    P3,
    P4,
}

impl Player {
    /// Parse `p1`..`p4`; trailing position letters or text are ignored ("p2a", "p1: Name")
    pub fn parse(s: &str) -> Option<Self> {
        match s.get(..2)? {
            "p1" => Some(Player::P1),
            "p2" => Some(Player::P2),
            "p3" => Some(Player::P3),
            "p4" => Some(Player::P4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
            Player::P3 => "p3",
            Player::P4 => "p4",
        }
    }

    /// The other player of a two-player battle
    pub fn foe(&self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
            Player::P3 => Player::P4,
            Player::P4 => Player::P3,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creature reference such as `p1a: Pikachu` (active) or `p1: Pikachu` (party)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
    pub player: Player,
    /// Position letter for active references
    pub position: Option<char>,
    /// Nickname as shown to both players
    pub name: String,
}

impl Pokemon {
    pub fn parse(s: &str) -> Option<Self> {
        let (pos_part, name) = s.split_once(": ")?;
        let player = Player::parse(pos_part)?;
        let position = pos_part.chars().nth(2).filter(|c| c.is_ascii_lowercase());

        Some(Pokemon {
            player,
            position,
            name: name.to_string(),
        })
    }
}

/// Details string: species, level, gender, shininess, tera type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub shiny: bool,
    pub tera_type: Option<String>,
}

impl PokemonDetails {
    /// Parse "Pikachu, L50, M, shiny" or a team-preview wildcard such as "Urshifu-*"
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(", ");
        let mut details = PokemonDetails {
            species: parts.next().unwrap_or_default().to_string(),
            ..Default::default()
        };

        for part in parts {
            match part {
                "M" => details.gender = Some('M'),
                "F" => details.gender = Some('F'),
                "shiny" => details.shiny = true,
                _ => {
                    if let Some(level) = part.strip_prefix('L') {
                        details.level = level.parse().ok();
                    } else if let Some(tera) = part.strip_prefix("tera:") {
                        details.tera_type = Some(tera.to_string());
                    }
                }
            }
        }

        details
    }

    /// Whether a (possibly wildcard) species matches a concrete one.
    /// `Urshifu-*` matches `Urshifu` and every `Urshifu-` forme.
    pub fn species_matches(pattern: &str, species: &str) -> bool {
        match pattern.strip_suffix("-*") {
            Some(base) => {
                species == base
                    || species
                        .strip_prefix(base)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            None => pattern == species,
        }
    }
}

/// HP and status condition ("100/100", "50/100 slp", "0 fnt")
#[derive(Debug, Clone, PartialEq)]
pub struct HpStatus {
    /// Raw HP for our own side, out of 100 (or 48) for the foe
    pub current: u32,
    pub max: Option<u32>,
    pub status: Option<String>,
}

impl HpStatus {
    pub fn parse(s: &str) -> Option<Self> {
        let mut words = s.split_whitespace();
        let hp = words.next()?;
        let status = words.next().map(str::to_string);

        let (current, max) = match hp.split_once('/') {
            Some((current, max)) => (current.parse().ok()?, Some(max.parse().ok()?)),
            None => (hp.parse().ok()?, None),
        };

        Some(HpStatus {
            current,
            max,
            status,
        })
    }

    pub fn is_fainted(&self) -> bool {
        self.status.as_deref() == Some("fnt") || (self.current == 0 && self.max.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Singles,
    Doubles,
    Triples,
    Multi,
    FreeForAll,
}

impl GameType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "singles" => Some(GameType::Singles),
            "doubles" => Some(GameType::Doubles),
            "triples" => Some(GameType::Triples),
            "multi" => Some(GameType::Multi),
            "freeforall" => Some(GameType::FreeForAll),
            _ => None,
        }
    }

    /// Active creatures per side
    pub fn active_slots(&self) -> usize {
        match self {
            GameType::Singles | GameType::FreeForAll => 1,
            GameType::Doubles | GameType::Multi => 2,
            GameType::Triples => 3,
        }
    }
}

/// Boostable stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Accuracy,
    Evasion,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Atk,
        Stat::Def,
        Stat::Spa,
        Stat::Spd,
        Stat::Spe,
        Stat::Accuracy,
        Stat::Evasion,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "atk" => Some(Stat::Atk),
            "def" => Some(Stat::Def),
            "spa" => Some(Stat::Spa),
            "spd" => Some(Stat::Spd),
            "spe" => Some(Stat::Spe),
            "accuracy" => Some(Stat::Accuracy),
            "evasion" => Some(Stat::Evasion),
            _ => None,
        }
    }
}

/// Side reference for side conditions ("p1: Alice")
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub player: Player,
    pub raw: String,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        Some(Side {
            player: Player::parse(s)?,
            raw: s.to_string(),
        })
    }
}

/// Lowercase alphanumeric id used by the server to compare names
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pokemon_reference() {
        let active = Pokemon::parse("p2a: Great Tusk").unwrap();
        assert_eq!(active.player, Player::P2);
        assert_eq!(active.position, Some('a'));
        assert_eq!(active.name, "Great Tusk");

        let party = Pokemon::parse("p1: Pikachu").unwrap();
        assert_eq!(party.position, None);

        assert!(Pokemon::parse("Pikachu").is_none());
    }

    #[test]
    fn test_parse_details() {
        let details = PokemonDetails::parse("Iron Valiant, L79, tera:Fairy");
        assert_eq!(details.species, "Iron Valiant");
        assert_eq!(details.level, Some(79));
        assert_eq!(details.tera_type.as_deref(), Some("Fairy"));
        assert_eq!(details.gender, None);

        let details = PokemonDetails::parse("Pikachu, L50, F, shiny");
        assert_eq!(details.gender, Some('F'));
        assert!(details.shiny);
    }

    #[test]
    fn test_species_wildcard() {
        assert!(PokemonDetails::species_matches("Urshifu-*", "Urshifu-Rapid-Strike"));
        assert!(PokemonDetails::species_matches("Urshifu-*", "Urshifu"));
        assert!(!PokemonDetails::species_matches("Urshifu-*", "Urshifuu"));
        assert!(PokemonDetails::species_matches("Pikachu", "Pikachu"));
        assert!(!PokemonDetails::species_matches("Pikachu", "Raichu"));
    }

    #[test]
    fn test_parse_hp_status() {
        let hp = HpStatus::parse("50/100 slp").unwrap();
        assert_eq!(hp.current, 50);
        assert_eq!(hp.max, Some(100));
        assert_eq!(hp.status.as_deref(), Some("slp"));
        assert!(!hp.is_fainted());

        let fainted = HpStatus::parse("0 fnt").unwrap();
        assert!(fainted.is_fainted());
        assert_eq!(fainted.max, None);

        assert!(HpStatus::parse("").is_none());
        assert!(HpStatus::parse("abc/100").is_none());
    }

    #[test]
    fn test_to_id() {
        assert_eq!(to_id(" Agent Smith!"), "agentsmith");
        assert_eq!(to_id("Bot-42"), "bot42");
    }

    #[test]
    fn test_player_foe() {
        assert_eq!(Player::P1.foe(), Player::P2);
        assert_eq!(Player::parse("p2: Bob").map(|p| p.foe()), Some(Player::P1));
    }
}
