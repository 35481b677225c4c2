//! Global field state

use super::conditions::{Terrain, Weather, effect_id};

/// Conditions affecting both sides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub weather: Option<Weather>,
    pub terrain: Option<Terrain>,
    pub trick_room: bool,
    pub magic_room: bool,
    pub wonder_room: bool,
    pub gravity: bool,
}

impl FieldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `|-weather|`. Upkeep messages restate the current weather and are ignored.
    pub fn apply_weather(&mut self, weather: &str, upkeep: bool) {
        if !upkeep {
            self.weather = Weather::from_protocol(weather);
        }
    }

    pub fn apply_field_start(&mut self, condition: &str) {
        if let Some(terrain) = Terrain::from_protocol(condition) {
            self.terrain = Some(terrain);
            return;
        }
        if let Some(flag) = self.room_flag(condition) {
            *flag = true;
        }
    }

    pub fn apply_field_end(&mut self, condition: &str) {
        if Terrain::from_protocol(condition).is_some() {
            self.terrain = None;
            return;
        }
        if let Some(flag) = self.room_flag(condition) {
            *flag = false;
        }
    }

    fn room_flag(&mut self, condition: &str) -> Option<&mut bool> {
        match effect_id(condition).as_str() {
            "trickroom" => Some(&mut self.trick_room),
            "magicroom" => Some(&mut self.magic_room),
            "wonderroom" => Some(&mut self.wonder_room),
            "gravity" => Some(&mut self.gravity),
            _ => None,
        }
    }
}
