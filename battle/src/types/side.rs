//! Side (player) state

use std::collections::HashMap;

use sdgym_protocol::{Player, PokemonDetails};

use super::conditions::{SideCondition, SideConditionState};
use super::pokemon::PokemonState;

/// Roster size when the server has not announced one
pub const DEFAULT_TEAM_SIZE: usize = 6;

/// One player's side of the battle
#[derive(Debug, Clone)]
pub struct SideState {
    pub player: Player,

    pub username: String,

    /// Creatures in the order they were introduced (preview or first switch-in)
    pub pokemon: Vec<PokemonState>,

    /// Roster indices in the server's party order, known for the agent's side only
    pub party_order: Vec<usize>,

    /// Announced by `|teamsize|`
    pub team_size: Option<usize>,

    /// Roster index of the creature in each active position
    pub active_indices: Vec<Option<usize>>,

    /// Hazards, screens and the like
    pub conditions: HashMap<SideCondition, SideConditionState>,
}

impl SideState {
    pub fn new(player: Player, username: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
            pokemon: Vec::new(),
            party_order: Vec::new(),
            team_size: None,
            active_indices: vec![None],
            conditions: HashMap::new(),
        }
    }

    /// Set the number of active positions (1 for singles, 2 for doubles)
    pub fn set_active_slots(&mut self, count: usize) {
        self.active_indices.resize(count, None);
    }

    pub fn roster_limit(&self) -> usize {
        self.team_size.unwrap_or(DEFAULT_TEAM_SIZE)
    }

    pub fn active(&self, slot: usize) -> Option<&PokemonState> {
        self.active_index(slot).and_then(|idx| self.pokemon.get(idx))
    }

    pub fn active_index(&self, slot: usize) -> Option<usize> {
        self.active_indices.get(slot).copied().flatten()
    }

    /// The first active creature (singles)
    pub fn active_pokemon(&self) -> Option<&PokemonState> {
        self.active(0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.pokemon.iter().position(|p| p.has_name(name))
    }

    /// First unresolved preview placeholder whose species pattern matches
    pub fn find_placeholder(&self, species: &str) -> Option<usize> {
        self.pokemon.iter().position(|p| {
            p.is_placeholder() && PokemonDetails::species_matches(&p.species, species)
        })
    }

    /// Creatures in party order when the server told us one, roster order otherwise
    pub fn party(&self) -> Vec<&PokemonState> {
        if self.party_order.is_empty() {
            self.pokemon.iter().collect()
        } else {
            self.party_order
                .iter()
                .filter_map(|&idx| self.pokemon.get(idx))
                .collect()
        }
    }

    /// Put a creature into an active position, switching out whoever was there
    pub fn set_active(&mut self, slot: usize, index: usize) {
        if slot >= self.active_indices.len() {
            self.set_active_slots(slot + 1);
        }
        if let Some(previous) = self.active_indices[slot]
            && previous != index
            && let Some(poke) = self.pokemon.get_mut(previous)
        {
            poke.on_switch_out();
        }
        self.active_indices[slot] = Some(index);
        if let Some(poke) = self.pokemon.get_mut(index) {
            poke.on_switch_in();
        }
    }

    pub fn alive_count(&self) -> usize {
        self.pokemon.iter().filter(|p| p.is_alive()).count()
    }

    pub fn fainted_count(&self) -> usize {
        self.pokemon.iter().filter(|p| p.fainted).count()
    }

    /// Creatures never seen count as alive
    pub fn remaining_count(&self) -> usize {
        self.roster_limit()
            .saturating_sub(self.pokemon.len())
            .saturating_add(self.alive_count())
    }

    pub fn all_fainted(&self) -> bool {
        !self.pokemon.is_empty() && self.pokemon.iter().all(|p| p.fainted)
    }

    pub fn has_condition(&self, cond: SideCondition) -> bool {
        self.conditions.contains_key(&cond)
    }

    /// Layers for a condition (0 if not present)
    pub fn condition_layers(&self, cond: SideCondition) -> u8 {
        self.conditions.get(&cond).map_or(0, |s| s.layers)
    }

    /// Start a condition or stack another layer; false if nothing changed
    pub fn add_condition(&mut self, cond: SideCondition) -> bool {
        match self.conditions.get_mut(&cond) {
            Some(state) => state.add_layer(cond),
            None => {
                self.conditions.insert(cond, SideConditionState::new());
                true
            }
        }
    }

    pub fn remove_condition(&mut self, cond: SideCondition) -> bool {
        self.conditions.remove(&cond).is_some()
    }

    pub fn has_hazards(&self) -> bool {
        self.conditions.keys().any(|c| c.is_hazard())
    }
}
