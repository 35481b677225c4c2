//! Creature state types

use std::collections::HashSet;

use sdgym_protocol::{HpStatus, PokemonDetails};

use super::stats::{StatBlock, StatStages};
use super::status::{Status, Volatile};

/// Move slots a creature can have
pub const MAX_MOVES: usize = 4;

/// One known move of a creature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveState {
    /// Move id ("thunderbolt")
    pub id: String,
    /// Display name, as revealed by the log or the request
    pub name: String,
    /// Remaining PP, known for the agent's side only
    pub pp: Option<u32>,
    pub max_pp: Option<u32>,
    pub disabled: bool,
}

impl MoveState {
    pub fn revealed(name: &str) -> Self {
        Self {
            id: sdgym_protocol::to_id(name),
            name: name.to_string(),
            pp: None,
            max_pp: None,
            disabled: false,
        }
    }

    /// Remaining PP as a fraction of max, when both are known
    pub fn pp_fraction(&self) -> Option<f32> {
        match (self.pp, self.max_pp) {
            (Some(pp), Some(max)) if max > 0 => Some(pp as f32 / max as f32),
            _ => None,
        }
    }
}

/// Creature state during battle
#[derive(Debug, Clone)]
pub struct PokemonState {
    /// Name used in `p1a: NAME` references. `None` for a team preview placeholder.
    pub name: Option<String>,

    /// Species, including forme. Preview placeholders may hold a wildcard like "Urshifu-*".
    pub species: String,

    pub level: u8,

    // === HP ===
    /// Current HP (percentage for the opponent, exact for the agent). `None` until revealed.
    pub hp_current: Option<u32>,

    /// Maximum HP (100 for the opponent's percentage view)
    pub hp_max: Option<u32>,

    // === Status ===
    pub status: Option<Status>,

    /// Sticky: once fainted, a creature stays fainted for the rest of the episode
    pub fainted: bool,

    pub active: bool,

    /// Seen on the field (switch, drag or request)
    pub revealed: bool,

    // === Cleared on switch ===
    pub boosts: StatStages,
    pub volatiles: HashSet<Volatile>,
    pub transformed: bool,

    // === Revealed information ===
    pub moves: Vec<MoveState>,
    pub stats: Option<StatBlock>,
    pub ability: Option<String>,
    pub item: Option<String>,
    pub tera_type: Option<String>,
    pub terastallized: bool,
}

impl PokemonState {
    fn blank(species: &str) -> Self {
        Self {
            name: None,
            species: species.to_string(),
            level: 100,
            hp_current: None,
            hp_max: None,
            status: None,
            fainted: false,
            active: false,
            revealed: false,
            boosts: StatStages::new(),
            volatiles: HashSet::new(),
            transformed: false,
            moves: Vec::new(),
            stats: None,
            ability: None,
            item: None,
            tera_type: None,
            terastallized: false,
        }
    }

    /// Species-only entry from team preview, upgraded in place once the creature appears
    pub fn placeholder(details: &PokemonDetails) -> Self {
        let mut state = Self::blank(&details.species);
        state.level = details.level.unwrap_or(100);
        state
    }

    /// A creature seen on the field for the first time
    pub fn revealed(name: &str, details: &PokemonDetails) -> Self {
        let mut state = Self::placeholder(details);
        state.reveal(name, details);
        state
    }

    /// Fill in identity from a switch-in, keeping everything already known
    pub fn reveal(&mut self, name: &str, details: &PokemonDetails) {
        self.name = Some(name.to_string());
        self.species = details.species.clone();
        if let Some(level) = details.level {
            self.level = level;
        }
        if details.tera_type.is_some() {
            self.tera_type = details.tera_type.clone();
        }
        self.revealed = true;
    }

    pub fn is_placeholder(&self) -> bool {
        self.name.is_none()
    }

    /// Reference name, falling back to species for placeholders
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.species)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// HP as a fraction of max, `None` when not yet observed
    pub fn hp_fraction(&self) -> Option<f32> {
        if self.fainted {
            return Some(0.0);
        }
        match (self.hp_current, self.hp_max) {
            (Some(current), Some(max)) if max > 0 => Some(current as f32 / max as f32),
            _ => None,
        }
    }

    /// Whether an HP report fits the declared maximum
    pub fn hp_within_bounds(&self, hp: &HpStatus) -> bool {
        match hp.max.or(self.hp_max) {
            Some(max) => hp.current <= max,
            None => true,
        }
    }

    /// Apply HP and status from a protocol `HP/MAX STATUS` field
    pub fn apply_hp_status(&mut self, hp: &HpStatus) {
        self.hp_current = Some(hp.current);
        if let Some(max) = hp.max {
            self.hp_max = Some(max);
        }
        match hp.status.as_deref() {
            Some("fnt") => self.mark_fainted(),
            Some(status) => self.status = Status::from_protocol(status),
            None if hp.max.is_some() => self.status = None,
            None => {}
        }
        if hp.current == 0 {
            self.mark_fainted();
        }
    }

    pub fn mark_fainted(&mut self) {
        self.fainted = true;
        self.hp_current = Some(0);
        self.status = None;
    }

    /// Record a move seen in the battle log. Returns false when the move was already known
    /// or every slot is taken.
    pub fn reveal_move(&mut self, move_name: &str) -> bool {
        let id = sdgym_protocol::to_id(move_name);
        if self.moves.len() >= MAX_MOVES || self.moves.iter().any(|m| m.id == id) {
            return false;
        }
        self.moves.push(MoveState::revealed(move_name));
        true
    }

    pub fn has_volatile(&self, v: &Volatile) -> bool {
        self.volatiles.contains(v)
    }

    pub fn on_switch_in(&mut self) {
        self.active = true;
        self.revealed = true;
    }

    pub fn on_switch_out(&mut self) {
        self.active = false;
        self.boosts.clear();
        self.volatiles.clear();
        self.transformed = false;
    }

    pub fn is_alive(&self) -> bool {
        !self.fainted
    }
}
