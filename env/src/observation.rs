//! Fixed-length observation vectors
//!
//! The layout depends only on `team_size` and the species catalog. Blocks, in order:
//!
//! | block              | per entry                                                          |
//! |--------------------|--------------------------------------------------------------------|
//! | own creatures      | present, hp, fainted, active, level, terastallized, status (8), stats (5), boosts (7), volatiles (5), moves (4 x known/pp), species (C + 2) |
//! | opponent creatures | present, revealed, hp, fainted, active, level, terastallized, status (8), boosts (7), volatiles (5), moves known (4), species (C + 2) |
//! | field              | weather (9), terrain (5), trick/magic/wonder room, gravity, own side conditions (10), opponent side conditions (10), turn, own remaining, opponent remaining |
//!
//! Each creature block is repeated `team_size` times. Own creatures follow request party
//! order, opponent creatures follow the order they became known.
//!
//! Unknown scalars are [`UNKNOWN`]. Status one-hots carry `none` and `unknown` buckets, species
//! one-hots carry `unknown` and `other` buckets. A creature slot with nothing known about it
//! has `present = 0`, every other scalar at [`UNKNOWN`] and only the `unknown` buckets set.
//! Everything else lies in `[0, 1]`, except boosts which lie in `[-1, 1]`.

use std::collections::HashMap;

use sdgym_battle::{
    MAX_MOVES, PokemonState, SideCondition, SideState, Status, Terrain, TrackedBattle, Volatile,
    Weather,
};
use sdgym_protocol::{Player, to_id};
use serde::Serialize;

/// Sentinel for scalars that are not observable
pub const UNKNOWN: f32 = -1.0;

const STAT_SCALE: f32 = 1000.0;
const LEVEL_SCALE: f32 = 100.0;
const TURN_SCALE: f32 = 100.0;
const BOOST_SCALE: f32 = 6.0;

const STATUS_BUCKETS: usize = Status::ALL.len() + 2;
const STAT_COUNT: usize = 5;
const BOOST_COUNT: usize = 7;

const TRACKED_VOLATILES: [Volatile; 5] = [
    Volatile::Substitute,
    Volatile::Confusion,
    Volatile::LeechSeed,
    Volatile::Taunt,
    Volatile::Encore,
];

const OWN_SCALARS: usize = 6;
const OPPONENT_SCALARS: usize = 7;
const FIELD_LEN: usize = (Weather::ALL.len() + 1)
    + (Terrain::ALL.len() + 1)
    + 4
    + 2 * SideCondition::ALL.len()
    + 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation(Vec<f32>);

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSpace {
    pub shape: Vec<usize>,
    pub low: f32,
    pub high: f32,
}

#[derive(Debug, Clone)]
pub struct ObservationEncoder {
    team_size: usize,
    catalog: HashMap<String, usize>,
    catalog_len: usize,
}

impl ObservationEncoder {
    /// `species_catalog` entries are matched by id, so "Great Tusk" and "greattusk" are equal
    pub fn new(team_size: usize, species_catalog: &[String]) -> Self {
        let mut catalog = HashMap::new();
        for species in species_catalog {
            let next = catalog.len();
            catalog.entry(to_id(species)).or_insert(next);
        }
        let catalog_len = catalog.len();
        Self {
            team_size,
            catalog,
            catalog_len,
        }
    }

    fn species_buckets(&self) -> usize {
        self.catalog_len + 2
    }

    fn own_block_len(&self) -> usize {
        OWN_SCALARS
            + STATUS_BUCKETS
            + STAT_COUNT
            + BOOST_COUNT
            + TRACKED_VOLATILES.len()
            + 2 * MAX_MOVES
            + self.species_buckets()
    }

    fn opponent_block_len(&self) -> usize {
        OPPONENT_SCALARS
            + STATUS_BUCKETS
            + BOOST_COUNT
            + TRACKED_VOLATILES.len()
            + MAX_MOVES
            + self.species_buckets()
    }

    pub fn len(&self) -> usize {
        self.team_size * (self.own_block_len() + self.opponent_block_len()) + FIELD_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn space(&self) -> ObservationSpace {
        ObservationSpace {
            shape: vec![self.len()],
            low: -1.0,
            high: 1.0,
        }
    }

    /// Encode the battle as seen by `perspective`. Pure: equal snapshots give equal vectors.
    pub fn encode(&self, battle: &TrackedBattle, perspective: Player) -> Observation {
        let mut out = Vec::with_capacity(self.len());
        let me = battle.get_side(perspective);
        let foe = battle.get_side(perspective.foe());

        let own: Vec<&PokemonState> = me.map(SideState::party).unwrap_or_default();
        for slot in 0..self.team_size {
            match own.get(slot) {
                Some(pokemon) => self.push_own(&mut out, pokemon),
                None => self.push_unknown(&mut out, self.own_block_len(), OWN_SCALARS),
            }
        }

        for slot in 0..self.team_size {
            match foe.and_then(|side| side.pokemon.get(slot)) {
                Some(pokemon) => self.push_opponent(&mut out, pokemon),
                None => self.push_unknown(&mut out, self.opponent_block_len(), OPPONENT_SCALARS),
            }
        }

        self.push_field(&mut out, battle, me, foe);
        debug_assert_eq!(out.len(), self.len());
        Observation(out)
    }

    fn push_own(&self, out: &mut Vec<f32>, pokemon: &PokemonState) {
        out.push(1.0);
        out.push(pokemon.hp_fraction().unwrap_or(UNKNOWN));
        out.push(flag(pokemon.fainted));
        out.push(flag(pokemon.active));
        out.push(f32::from(pokemon.level) / LEVEL_SCALE);
        out.push(flag(pokemon.terastallized));
        push_status(out, Some(pokemon.status));

        match pokemon.stats {
            Some(stats) => out.extend(
                stats
                    .as_array()
                    .iter()
                    .map(|&v| (v as f32 / STAT_SCALE).min(1.0)),
            ),
            None => out.extend([UNKNOWN; STAT_COUNT]),
        }
        push_boosts(out, pokemon);
        push_volatiles(out, pokemon);

        for slot in 0..MAX_MOVES {
            match pokemon.moves.get(slot) {
                Some(m) => {
                    out.push(1.0);
                    out.push(m.pp_fraction().unwrap_or(UNKNOWN));
                }
                None => out.extend([0.0, UNKNOWN]),
            }
        }
        self.push_species(out, &pokemon.species);
    }

    fn push_opponent(&self, out: &mut Vec<f32>, pokemon: &PokemonState) {
        out.push(1.0);
        out.push(flag(pokemon.revealed));
        out.push(pokemon.hp_fraction().unwrap_or(UNKNOWN));
        out.push(flag(pokemon.fainted));
        out.push(flag(pokemon.active));
        out.push(f32::from(pokemon.level) / LEVEL_SCALE);
        out.push(flag(pokemon.terastallized));
        // An unrevealed creature's status is hidden, a revealed one's is public
        push_status(out, pokemon.revealed.then_some(pokemon.status));
        push_boosts(out, pokemon);
        push_volatiles(out, pokemon);
        for slot in 0..MAX_MOVES {
            out.push(flag(slot < pokemon.moves.len()));
        }
        self.push_species(out, &pokemon.species);
    }

    fn push_unknown(&self, out: &mut Vec<f32>, block_len: usize, scalars: usize) {
        let start = out.len();
        out.push(0.0);
        out.resize(start + block_len, UNKNOWN);

        // One-hots stay one-hot: clear them and set the unknown bucket
        let species_start = start + block_len - self.species_buckets();
        out[species_start..].fill(0.0);
        out[species_start + self.catalog_len] = 1.0;

        let status_start = start + scalars;
        out[status_start..status_start + STATUS_BUCKETS].fill(0.0);
        out[status_start + STATUS_BUCKETS - 1] = 1.0;
    }

    fn push_species(&self, out: &mut Vec<f32>, species: &str) {
        let bucket = self
            .species_index(species)
            .unwrap_or(self.catalog_len + 1);
        out.extend(one_hot(self.species_buckets(), bucket));
    }

    fn species_index(&self, species: &str) -> Option<usize> {
        self.catalog.get(&to_id(species)).copied().or_else(|| {
            let base = species.split_once('-').map(|(base, _)| base)?;
            self.catalog.get(&to_id(base)).copied()
        })
    }

    fn push_field(
        &self,
        out: &mut Vec<f32>,
        battle: &TrackedBattle,
        me: Option<&SideState>,
        foe: Option<&SideState>,
    ) {
        let field = &battle.field;
        out.extend(one_hot(
            Weather::ALL.len() + 1,
            field
                .weather
                .and_then(|w| Weather::ALL.iter().position(|&x| x == w))
                .unwrap_or(Weather::ALL.len()),
        ));
        out.extend(one_hot(
            Terrain::ALL.len() + 1,
            field
                .terrain
                .and_then(|t| Terrain::ALL.iter().position(|&x| x == t))
                .unwrap_or(Terrain::ALL.len()),
        ));
        out.extend([
            flag(field.trick_room),
            flag(field.magic_room),
            flag(field.wonder_room),
            flag(field.gravity),
        ]);

        for side in [me, foe] {
            for condition in SideCondition::ALL {
                out.push(match side {
                    Some(side) => {
                        f32::from(side.condition_layers(condition))
                            / f32::from(condition.max_layers())
                    }
                    None => UNKNOWN,
                });
            }
        }

        out.push((battle.turn as f32 / TURN_SCALE).min(1.0));
        for side in [me, foe] {
            out.push(match side {
                Some(side) => side.remaining_count().min(self.team_size) as f32 / self.team_size as f32,
                None => UNKNOWN,
            });
        }
    }
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

fn one_hot(len: usize, index: usize) -> Vec<f32> {
    let mut v = vec![0.0; len];
    if let Some(slot) = v.get_mut(index) {
        *slot = 1.0;
    }
    v
}

/// `None` means the status is not observable
fn push_status(out: &mut Vec<f32>, status: Option<Option<Status>>) {
    let index = match status {
        Some(Some(status)) => Status::ALL
            .iter()
            .position(|&s| s == status)
            .unwrap_or(Status::ALL.len()),
        Some(None) => Status::ALL.len(),
        None => Status::ALL.len() + 1,
    };
    out.extend(one_hot(STATUS_BUCKETS, index));
}

fn push_boosts(out: &mut Vec<f32>, pokemon: &PokemonState) {
    out.extend(
        pokemon
            .boosts
            .as_array()
            .iter()
            .map(|&b| f32::from(b) / BOOST_SCALE),
    );
}

fn push_volatiles(out: &mut Vec<f32>, pokemon: &PokemonState) {
    out.extend(TRACKED_VOLATILES.iter().map(|v| flag(pokemon.has_volatile(v))));
}
