//! Status conditions (volatile and non-volatile)

use super::conditions::effect_id;

/// Non-volatile status conditions (persist through switching)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Status {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    BadPoison, // Toxic
    Sleep,
}

impl Status {
    /// Every variant, in encoding order
    pub const ALL: [Status; 6] = [
        Status::Burn,
        Status::Freeze,
        Status::Paralysis,
        Status::Poison,
        Status::BadPoison,
        Status::Sleep,
    ];

    /// Parse from protocol string ("brn", "frz", "par", "psn", "tox", "slp")
    pub fn from_protocol(s: &str) -> Option<Self> {
        match s {
            "brn" => Some(Status::Burn),
            "frz" => Some(Status::Freeze),
            "par" => Some(Status::Paralysis),
            "psn" => Some(Status::Poison),
            "tox" => Some(Status::BadPoison),
            "slp" => Some(Status::Sleep),
            _ => None,
        }
    }

    pub fn to_protocol(&self) -> &'static str {
        match self {
            Status::Burn => "brn",
            Status::Freeze => "frz",
            Status::Paralysis => "par",
            Status::Poison => "psn",
            Status::BadPoison => "tox",
            Status::Sleep => "slp",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_protocol())
    }
}

/// Volatile conditions (cleared on switching)
///
/// Only the effects that feed the observation get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Volatile {
    Substitute,
    Confusion,
    LeechSeed,
    Taunt,
    Encore,
    Other(String),
}

impl Volatile {
    /// Parse from a `-start`/`-end` effect, with or without a "move: " prefix
    pub fn from_protocol(s: &str) -> Self {
        match effect_id(s).as_str() {
            "substitute" => Volatile::Substitute,
            "confusion" => Volatile::Confusion,
            "leechseed" => Volatile::LeechSeed,
            "taunt" => Volatile::Taunt,
            "encore" => Volatile::Encore,
            other => Volatile::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_protocol() {
        assert_eq!(Status::from_protocol("brn"), Some(Status::Burn));
        assert_eq!(Status::from_protocol("tox"), Some(Status::BadPoison));
        assert_eq!(Status::from_protocol("slp"), Some(Status::Sleep));
        assert_eq!(Status::from_protocol("fnt"), None);
        assert_eq!(Status::from_protocol(""), None);
    }

    #[test]
    fn test_status_round_trips_through_protocol() {
        for status in Status::ALL {
            assert_eq!(Status::from_protocol(status.to_protocol()), Some(status));
        }
    }

    #[test]
    fn test_volatile_from_protocol() {
        assert_eq!(Volatile::from_protocol("Substitute"), Volatile::Substitute);
        assert_eq!(Volatile::from_protocol("move: Taunt"), Volatile::Taunt);
        assert_eq!(Volatile::from_protocol("confusion"), Volatile::Confusion);
        assert_eq!(Volatile::from_protocol("move: Leech Seed"), Volatile::LeechSeed);
        assert_eq!(
            Volatile::from_protocol("move: Yawn"),
            Volatile::Other("yawn".to_string())
        );
    }
}
