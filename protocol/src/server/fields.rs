//! Positional access to the `|`-separated fields of a protocol line

use std::str::FromStr;

use anyhow::Result;

use super::battle::{HpStatus, Player, Pokemon, PokemonDetails, Stat};
use crate::ParseError;

/// Fields of one protocol line. Index 0 is the empty string before the
/// leading `|`, index 1 is the message type.
pub(crate) struct Fields<'a> {
    parts: &'a [&'a str],
}

impl<'a> Fields<'a> {
    pub(crate) fn new(parts: &'a [&'a str]) -> Self {
        Self { parts }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&'a str> {
        self.parts.get(index).copied()
    }

    /// Field as an owned string, empty when absent
    pub(crate) fn text(&self, index: usize) -> String {
        self.get(index).unwrap_or_default().to_string()
    }

    /// Field as an owned string, `None` when absent or empty
    pub(crate) fn opt(&self, index: usize) -> Option<String> {
        self.get(index)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Everything from `index` onwards, re-joined (payloads such as JSON may contain `|`)
    pub(crate) fn rest(&self, index: usize) -> String {
        self.parts.get(index..).map(|p| p.join("|")).unwrap_or_default()
    }

    pub(crate) fn required(&self, index: usize, what: &str) -> Result<&'a str> {
        self.get(index)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ParseError::MissingField(what.to_string()).into())
    }

    pub(crate) fn number<T: FromStr>(&self, index: usize, what: &str) -> Result<T> {
        let raw = self.required(index, what)?;
        raw.parse()
            .map_err(|_| ParseError::InvalidFormat(format!("{what}: {raw}")).into())
    }

    pub(crate) fn player(&self, index: usize) -> Result<Player> {
        let raw = self.required(index, "player")?;
        Player::parse(raw).ok_or_else(|| ParseError::InvalidFormat(format!("player: {raw}")).into())
    }

    pub(crate) fn pokemon(&self, index: usize) -> Result<Pokemon> {
        let raw = self.required(index, "pokemon")?;
        Pokemon::parse(raw)
            .ok_or_else(|| ParseError::InvalidFormat(format!("pokemon: {raw}")).into())
    }

    pub(crate) fn maybe_pokemon(&self, index: usize) -> Option<Pokemon> {
        self.get(index).and_then(Pokemon::parse)
    }

    pub(crate) fn details(&self, index: usize) -> PokemonDetails {
        self.get(index).map(PokemonDetails::parse).unwrap_or_default()
    }

    pub(crate) fn hp(&self, index: usize) -> Option<HpStatus> {
        self.get(index).and_then(HpStatus::parse)
    }

    pub(crate) fn stat(&self, index: usize) -> Result<Stat> {
        let raw = self.required(index, "stat")?;
        Stat::parse(raw).ok_or_else(|| ParseError::InvalidFormat(format!("stat: {raw}")).into())
    }

    /// Value of a trailing `[tag] value` annotation such as `[from] item: Leftovers`
    pub(crate) fn tag(&self, tag: &str) -> Option<String> {
        self.parts.iter().skip(2).find_map(|part| {
            part.strip_prefix(tag)
                .map(|value| value.trim_start().to_string())
        })
    }

    /// Whether a bare flag such as `[miss]` or `[upkeep]` is present
    pub(crate) fn flag(&self, flag: &str) -> bool {
        self.parts.iter().skip(2).any(|part| *part == flag)
    }
}
