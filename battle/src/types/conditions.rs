//! Weather, terrain and side conditions

/// Strip an effect prefix and normalise an effect name for matching:
/// "move: Stealth Rock" -> "stealthrock"
pub(crate) fn effect_id(s: &str) -> String {
    let clean = s
        .strip_prefix("move: ")
        .or_else(|| s.strip_prefix("ability: "))
        .or_else(|| s.strip_prefix("item: "))
        .unwrap_or(s);
    clean
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weather {
    Sun,
    Rain,
    Sand,
    Hail,
    Snow,
    HarshSun,
    HeavyRain,
    StrongWinds,
}

impl Weather {
    /// Every variant, in encoding order
    pub const ALL: [Weather; 8] = [
        Weather::Sun,
        Weather::Rain,
        Weather::Sand,
        Weather::Hail,
        Weather::Snow,
        Weather::HarshSun,
        Weather::HeavyRain,
        Weather::StrongWinds,
    ];

    pub fn from_protocol(s: &str) -> Option<Self> {
        match effect_id(s).as_str() {
            "sunnyday" | "sun" => Some(Weather::Sun),
            "raindance" | "rain" => Some(Weather::Rain),
            "sandstorm" | "sand" => Some(Weather::Sand),
            "hail" => Some(Weather::Hail),
            "snow" | "snowscape" => Some(Weather::Snow),
            "desolateland" | "harshsun" => Some(Weather::HarshSun),
            "primordialsea" | "heavyrain" => Some(Weather::HeavyRain),
            "deltastream" | "strongwinds" => Some(Weather::StrongWinds),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Electric,
    Grassy,
    Misty,
    Psychic,
}

impl Terrain {
    pub const ALL: [Terrain; 4] = [
        Terrain::Electric,
        Terrain::Grassy,
        Terrain::Misty,
        Terrain::Psychic,
    ];

    pub fn from_protocol(s: &str) -> Option<Self> {
        match effect_id(s).as_str() {
            "electricterrain" => Some(Terrain::Electric),
            "grassyterrain" => Some(Terrain::Grassy),
            "mistyterrain" => Some(Terrain::Misty),
            "psychicterrain" => Some(Terrain::Psychic),
            _ => None,
        }
    }
}

/// Conditions attached to one side of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideCondition {
    Reflect,
    LightScreen,
    AuroraVeil,
    Spikes,
    ToxicSpikes,
    StealthRock,
    StickyWeb,
    Tailwind,
    Safeguard,
    Mist,
}

impl SideCondition {
    pub const ALL: [SideCondition; 10] = [
        SideCondition::Reflect,
        SideCondition::LightScreen,
        SideCondition::AuroraVeil,
        SideCondition::Spikes,
        SideCondition::ToxicSpikes,
        SideCondition::StealthRock,
        SideCondition::StickyWeb,
        SideCondition::Tailwind,
        SideCondition::Safeguard,
        SideCondition::Mist,
    ];

    pub fn from_protocol(s: &str) -> Option<Self> {
        match effect_id(s).as_str() {
            "reflect" => Some(SideCondition::Reflect),
            "lightscreen" => Some(SideCondition::LightScreen),
            "auroraveil" => Some(SideCondition::AuroraVeil),
            "spikes" => Some(SideCondition::Spikes),
            "toxicspikes" => Some(SideCondition::ToxicSpikes),
            "stealthrock" => Some(SideCondition::StealthRock),
            "stickyweb" => Some(SideCondition::StickyWeb),
            "tailwind" => Some(SideCondition::Tailwind),
            "safeguard" => Some(SideCondition::Safeguard),
            "mist" => Some(SideCondition::Mist),
            _ => None,
        }
    }

    pub fn max_layers(&self) -> u8 {
        match self {
            SideCondition::Spikes => 3,
            SideCondition::ToxicSpikes => 2,
            _ => 1,
        }
    }

    pub fn is_hazard(&self) -> bool {
        matches!(
            self,
            SideCondition::Spikes
                | SideCondition::ToxicSpikes
                | SideCondition::StealthRock
                | SideCondition::StickyWeb
        )
    }
}

/// Layer count of an active side condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideConditionState {
    pub layers: u8,
}

impl SideConditionState {
    pub fn new() -> Self {
        Self { layers: 1 }
    }

    /// Add a layer; false once the condition is at its maximum
    pub fn add_layer(&mut self, condition: SideCondition) -> bool {
        if self.layers < condition.max_layers() {
            self.layers += 1;
            true
        } else {
            false
        }
    }
}

impl Default for SideConditionState {
    fn default() -> Self {
        Self::new()
    }
}
