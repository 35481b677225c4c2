//! Stat stages and stat blocks

use sdgym_protocol::{PokemonStats, Stat};

/// Stat stages, -6 to +6, indexed in [`Stat::ALL`] order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatStages([i8; 7]);

fn slot(stat: Stat) -> usize {
    match stat {
        Stat::Atk => 0,
        Stat::Def => 1,
        Stat::Spa => 2,
        Stat::Spd => 3,
        Stat::Spe => 4,
        Stat::Accuracy => 5,
        Stat::Evasion => 6,
    }
}

impl StatStages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: Stat) -> i8 {
        self.0[slot(stat)]
    }

    /// Set stage for a stat (clamped to -6..+6)
    pub fn set(&mut self, stat: Stat, value: i8) {
        self.0[slot(stat)] = value.clamp(-6, 6);
    }

    /// Apply a boost, returns the change actually applied
    pub fn boost(&mut self, stat: Stat, amount: i8) -> i8 {
        let current = self.get(stat);
        self.set(stat, current.saturating_add(amount));
        self.get(stat) - current
    }

    pub fn unboost(&mut self, stat: Stat, amount: i8) -> i8 {
        self.boost(stat, amount.saturating_neg())
    }

    pub fn clear(&mut self) {
        self.0 = [0; 7];
    }

    pub fn clear_positive(&mut self) {
        self.0.iter_mut().filter(|s| **s > 0).for_each(|s| *s = 0);
    }

    pub fn clear_negative(&mut self) {
        self.0.iter_mut().filter(|s| **s < 0).for_each(|s| *s = 0);
    }

    /// Topsy-Turvy
    pub fn invert(&mut self) {
        self.0.iter_mut().for_each(|s| *s = -*s);
    }

    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|s| *s == 0)
    }

    /// Stages in [`Stat::ALL`] order
    pub fn as_array(&self) -> [i8; 7] {
        self.0
    }
}

/// Calculated stats of one creature, known only for the agent's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBlock {
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

impl StatBlock {
    pub fn as_array(&self) -> [u32; 5] {
        [self.atk, self.def, self.spa, self.spd, self.spe]
    }
}

impl From<&PokemonStats> for StatBlock {
    fn from(stats: &PokemonStats) -> Self {
        Self {
            atk: stats.atk,
            def: stats.def,
            spa: stats.spa,
            spd: stats.spd,
            spe: stats.spe,
        }
    }
}
