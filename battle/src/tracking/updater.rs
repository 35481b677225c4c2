//! Applying ServerMessages and requests to the tracked battle

use sdgym_protocol::{
    BattleRequest, HpStatus, MoveSlot, Player, Pokemon, PokemonDetails, ServerMessage, to_id,
};

use super::battle::{TrackedBattle, position_to_slot};
use super::error::StateConsistencyError;
use super::phase::BattlePhase;
use crate::types::{
    MAX_MOVES, MoveState, PokemonState, SideCondition, SideState, StatBlock, Status, Volatile,
};

type Result<T> = std::result::Result<T, StateConsistencyError>;

impl TrackedBattle {
    /// Apply one server message in arrival order.
    ///
    /// Messages that carry no battle state are ignored, as are deltas arriving before the
    /// battle starts or after it ends. Desynchronisation is reported as an error.
    pub fn apply(&mut self, msg: &ServerMessage) -> Result<()> {
        if !msg.is_battle_delta() {
            return Ok(());
        }
        if self.phase.is_ended() {
            tracing::debug!(room = %self.room_id, ?msg, "ignoring event after battle end");
            return Ok(());
        }
        if self.phase == BattlePhase::AwaitingStart && !is_setup_event(msg) {
            tracing::warn!(room = %self.room_id, ?msg, "ignoring event before battle start");
            return Ok(());
        }

        self.advance_phase(msg);
        self.apply_delta(msg)
    }

    /// The agent has sent a choice for the pending decision
    pub fn choice_submitted(&mut self) {
        if !self.phase.is_ended() {
            self.phase = BattlePhase::Resolving;
        }
    }

    /// A request that needs an answer is ready (force switches arrive without a `|turn|`)
    pub fn mark_awaiting_decision(&mut self) {
        if !self.phase.is_ended() {
            self.phase = BattlePhase::AwaitingDecision;
        }
    }

    fn advance_phase(&mut self, msg: &ServerMessage) {
        self.phase = match (msg, self.phase) {
            (ServerMessage::Win(_) | ServerMessage::Tie, _) => BattlePhase::Ended,
            (ServerMessage::Turn(_), _) => BattlePhase::AwaitingDecision,
            (
                ServerMessage::BattleStart
                | ServerMessage::Switch { .. }
                | ServerMessage::Drag { .. }
                | ServerMessage::Replace { .. },
                BattlePhase::AwaitingStart,
            ) => BattlePhase::InTurn,
            (_, BattlePhase::AwaitingDecision | BattlePhase::Resolving) => BattlePhase::InTurn,
            (_, phase) => phase,
        };
    }

    fn apply_delta(&mut self, msg: &ServerMessage) -> Result<()> {
        match msg {
            // === Battle initialization ===
            ServerMessage::BattlePlayer { player, username, .. } => {
                if username.is_empty() {
                    return Ok(());
                }
                self.get_or_create_side(*player, username);
                if self.perspective().is_none() && self.is_agent(username) {
                    self.set_perspective(*player);
                }
            }

            ServerMessage::TeamSize { player, size } => {
                self.get_or_create_side(*player, "").team_size = Some(usize::from(*size));
            }

            ServerMessage::GameType(game_type) => self.set_game_type(*game_type),

            ServerMessage::Gen(generation) => self.generation = *generation,

            ServerMessage::Tier(tier) => self.tier = tier.clone(),

            ServerMessage::ClearPoke => {
                for side in self.sides_mut() {
                    side.pokemon.retain(|p| !p.is_placeholder());
                }
            }

            ServerMessage::Poke { player, details, .. } => {
                let side = self.get_or_create_side(*player, "");
                let known = side
                    .pokemon
                    .iter()
                    .any(|p| PokemonDetails::species_matches(&details.species, &p.species));
                if !known {
                    let limit = side.roster_limit();
                    if side.pokemon.len() >= limit {
                        return Err(StateConsistencyError::RosterOverflow {
                            side: *player,
                            limit,
                        });
                    }
                    side.pokemon.push(PokemonState::placeholder(details));
                }
            }

            ServerMessage::Turn(turn) => self.turn = *turn,

            ServerMessage::Win(winner) => self.winner = Some(winner.clone()),

            ServerMessage::Tie => self.tie = true,

            ServerMessage::Message(text) => {
                let quitter = text
                    .strip_suffix(" forfeited.")
                    .or_else(|| text.strip_suffix(" lost due to inactivity."));
                if let Some(name) = quitter {
                    self.forfeited_by = Some(name.to_string());
                }
            }

            // === Major actions ===
            ServerMessage::Switch { pokemon, details, hp_status }
            | ServerMessage::Drag { pokemon, details, hp_status }
            | ServerMessage::Replace { pokemon, details, hp_status } => {
                self.introduce(pokemon, details, hp_status.as_ref())?;
            }

            ServerMessage::DetailsChange { pokemon, details, hp_status } => {
                self.creature_mut(pokemon)?.species = details.species.clone();
                self.apply_hp(pokemon, hp_status.as_ref())?;
            }

            ServerMessage::FormeChange { pokemon, species, hp_status } => {
                self.creature_mut(pokemon)?.species = species.clone();
                self.apply_hp(pokemon, hp_status.as_ref())?;
            }

            ServerMessage::Faint(pokemon) => self.creature_mut(pokemon)?.mark_fainted(),

            ServerMessage::Move { pokemon, move_name, from, .. } => {
                let agent_side = self.perspective() == Some(pokemon.player);
                let poke = self.creature_mut(pokemon)?;
                // Moves called by other moves and moves used while transformed are not the
                // creature's own
                let own_move = from.is_none() && !poke.transformed && to_id(move_name) != "struggle";
                if !agent_side && own_move {
                    poke.reveal_move(move_name);
                }
            }

            ServerMessage::Cant { pokemon, .. } => {
                self.creature_mut(pokemon)?;
            }

            // === HP ===
            ServerMessage::Damage { pokemon, hp_status, .. }
            | ServerMessage::Heal { pokemon, hp_status, .. }
            | ServerMessage::SetHp { pokemon, hp_status } => {
                self.apply_hp(pokemon, hp_status.as_ref())?;
            }

            // === Status ===
            ServerMessage::Status { pokemon, status } => {
                self.creature_mut(pokemon)?.status = Status::from_protocol(status);
            }

            ServerMessage::CureStatus { pokemon, .. } => self.creature_mut(pokemon)?.status = None,

            ServerMessage::CureTeam(pokemon) => {
                if let Some(side) = self.get_side_mut(pokemon.player) {
                    side.pokemon.iter_mut().for_each(|p| p.status = None);
                }
            }

            // === Boosts ===
            ServerMessage::Boost { pokemon, stat, amount } => {
                self.creature_mut(pokemon)?.boosts.boost(*stat, *amount);
            }

            ServerMessage::Unboost { pokemon, stat, amount } => {
                self.creature_mut(pokemon)?.boosts.unboost(*stat, *amount);
            }

            ServerMessage::SetBoost { pokemon, stat, amount } => {
                self.creature_mut(pokemon)?.boosts.set(*stat, *amount);
            }

            ServerMessage::ClearBoost(pokemon) => self.creature_mut(pokemon)?.boosts.clear(),

            ServerMessage::ClearAllBoost => {
                for side in self.sides_mut() {
                    for poke in side.pokemon.iter_mut().filter(|p| p.active) {
                        poke.boosts.clear();
                    }
                }
            }

            ServerMessage::ClearPositiveBoost(pokemon) => {
                self.creature_mut(pokemon)?.boosts.clear_positive();
            }

            ServerMessage::ClearNegativeBoost(pokemon) => {
                self.creature_mut(pokemon)?.boosts.clear_negative();
            }

            ServerMessage::InvertBoost(pokemon) => self.creature_mut(pokemon)?.boosts.invert(),

            // === Field ===
            ServerMessage::Weather { weather, upkeep } => self.field.apply_weather(weather, *upkeep),

            ServerMessage::FieldStart(condition) => self.field.apply_field_start(condition),

            ServerMessage::FieldEnd(condition) => self.field.apply_field_end(condition),

            ServerMessage::SideStart { side, condition } => {
                if let Some(cond) = SideCondition::from_protocol(condition) {
                    self.get_or_create_side(side.player, "").add_condition(cond);
                }
            }

            ServerMessage::SideEnd { side, condition } => {
                if let (Some(cond), Some(state)) = (
                    SideCondition::from_protocol(condition),
                    self.get_side_mut(side.player),
                ) {
                    state.remove_condition(cond);
                }
            }

            ServerMessage::SwapSideConditions => {
                let [p1, p2, ..] = &mut self.sides;
                if let (Some(p1), Some(p2)) = (p1.as_mut(), p2.as_mut()) {
                    std::mem::swap(&mut p1.conditions, &mut p2.conditions);
                }
            }

            // === Volatiles ===
            ServerMessage::VolatileStart { pokemon, effect } => {
                self.creature_mut(pokemon)?
                    .volatiles
                    .insert(Volatile::from_protocol(effect));
            }

            ServerMessage::VolatileEnd { pokemon, effect } => {
                self.creature_mut(pokemon)?
                    .volatiles
                    .remove(&Volatile::from_protocol(effect));
            }

            // === Revealed details ===
            ServerMessage::Item { pokemon, item, .. } => {
                self.creature_mut(pokemon)?.item = Some(item.clone());
            }

            ServerMessage::EndItem { pokemon, .. } => self.creature_mut(pokemon)?.item = None,

            ServerMessage::Ability { pokemon, ability, .. } => {
                self.creature_mut(pokemon)?.ability = Some(ability.clone());
            }

            ServerMessage::Transform { pokemon, .. } => self.creature_mut(pokemon)?.transformed = true,

            ServerMessage::Terastallize { pokemon, tera_type } => {
                let poke = self.creature_mut(pokemon)?;
                poke.terastallized = true;
                poke.tera_type = Some(tera_type.clone());
            }

            _ => {}
        }
        Ok(())
    }

    /// Sync the agent's side from a request, matching creatures by name
    pub fn apply_request(&mut self, request: &BattleRequest) -> Result<()> {
        let Some(info) = request.side.as_ref() else {
            return Ok(());
        };
        let Some(player) = info.player() else {
            tracing::warn!(room = %self.room_id, id = %info.id, "request for unknown side");
            return Ok(());
        };
        self.set_perspective(player);

        let active_moves = request.active_slot().map(|a| a.moves.as_slice()).unwrap_or_default();
        let side = self.get_or_create_side(player, &info.name);
        let limit = side.roster_limit().max(info.pokemon.len());
        let mut order = Vec::with_capacity(info.pokemon.len());
        let mut active_slot = 0;

        for entry in &info.pokemon {
            let details = entry.parsed_details();
            let idx = resolve_creature(side, entry.name(), &details, limit)?;
            let poke = &mut side.pokemon[idx];
            poke.reveal(entry.name(), &details);

            if let Some(hp) = entry.condition_parsed() {
                check_hp(player, poke, &hp)?;
                poke.apply_hp_status(&hp);
            }
            if entry.is_fainted() {
                poke.mark_fainted();
            }
            if let Some(stats) = &entry.stats {
                poke.stats = Some(StatBlock::from(stats));
            }
            poke.ability = Some(entry.ability.clone()).filter(|a| !a.is_empty());
            poke.item = Some(entry.item.clone()).filter(|i| !i.is_empty());
            if entry.teratype.is_some() {
                poke.tera_type = entry.teratype.clone();
            }
            poke.moves = sync_moves(&poke.moves, &entry.moves, entry.active.then_some(active_moves));

            order.push(idx);
            if entry.active {
                if side.active_index(active_slot) != Some(idx) {
                    side.set_active(active_slot, idx);
                }
                active_slot += 1;
            }
        }

        side.party_order = order;
        if side.team_size.is_none() && !info.pokemon.is_empty() {
            side.team_size = Some(info.pokemon.len());
        }
        Ok(())
    }

    fn introduce(
        &mut self,
        pokemon: &Pokemon,
        details: &PokemonDetails,
        hp: Option<&HpStatus>,
    ) -> Result<()> {
        let slot = position_to_slot(pokemon.position.unwrap_or('a'));
        let side = self.get_or_create_side(pokemon.player, "");
        let limit = side.roster_limit();
        let idx = resolve_creature(side, &pokemon.name, details, limit)?;

        let poke = &mut side.pokemon[idx];
        poke.reveal(&pokemon.name, details);
        if let Some(hp) = hp {
            check_hp(pokemon.player, poke, hp)?;
            poke.apply_hp_status(hp);
        }
        side.set_active(slot, idx);
        Ok(())
    }

    fn creature_mut(&mut self, pokemon: &Pokemon) -> Result<&mut PokemonState> {
        let side = self
            .get_side_mut(pokemon.player)
            .ok_or_else(|| unknown_creature(pokemon))?;
        let idx = side
            .find_by_name(&pokemon.name)
            .ok_or_else(|| unknown_creature(pokemon))?;
        Ok(&mut side.pokemon[idx])
    }

    fn apply_hp(&mut self, pokemon: &Pokemon, hp: Option<&HpStatus>) -> Result<()> {
        let poke = self.creature_mut(pokemon)?;
        if let Some(hp) = hp {
            check_hp(pokemon.player, poke, hp)?;
            poke.apply_hp_status(hp);
        }
        Ok(())
    }
}

fn is_setup_event(msg: &ServerMessage) -> bool {
    matches!(
        msg,
        ServerMessage::BattlePlayer { .. }
            | ServerMessage::TeamSize { .. }
            | ServerMessage::GameType(_)
            | ServerMessage::Gen(_)
            | ServerMessage::Tier(_)
            | ServerMessage::ClearPoke
            | ServerMessage::Poke { .. }
            | ServerMessage::TeamPreview(_)
            | ServerMessage::BattleStart
            | ServerMessage::Switch { .. }
            | ServerMessage::Drag { .. }
            | ServerMessage::Replace { .. }
            | ServerMessage::Turn(_)
            | ServerMessage::Message(_)
            | ServerMessage::Win(_)
            | ServerMessage::Tie
    )
}

fn unknown_creature(pokemon: &Pokemon) -> StateConsistencyError {
    StateConsistencyError::UnknownCreature {
        side: pokemon.player,
        name: pokemon.name.clone(),
    }
}

fn check_hp(side: Player, poke: &PokemonState, hp: &HpStatus) -> Result<()> {
    if poke.hp_within_bounds(hp) {
        return Ok(());
    }
    Err(StateConsistencyError::HpOutOfBounds {
        side,
        name: poke.display_name().to_string(),
        current: hp.current,
        max: hp.max.or(poke.hp_max).unwrap_or_default(),
    })
}

/// Roster index for a creature: known by name, a preview placeholder, or a new entry
fn resolve_creature(
    side: &mut SideState,
    name: &str,
    details: &PokemonDetails,
    limit: usize,
) -> Result<usize> {
    if let Some(idx) = side.find_by_name(name) {
        return Ok(idx);
    }
    if let Some(idx) = side.find_placeholder(&details.species) {
        return Ok(idx);
    }
    if side.pokemon.len() >= limit {
        return Err(StateConsistencyError::RosterOverflow {
            side: side.player,
            limit,
        });
    }
    side.pokemon.push(PokemonState::placeholder(details));
    Ok(side.pokemon.len() - 1)
}

/// Rebuild move slots from request ids, keeping PP learned earlier for benched creatures
fn sync_moves(known: &[MoveState], ids: &[String], active: Option<&[MoveSlot]>) -> Vec<MoveState> {
    ids.iter()
        .take(MAX_MOVES)
        .map(|id| {
            let mut state = known
                .iter()
                .find(|m| &m.id == id)
                .cloned()
                .unwrap_or_else(|| MoveState {
                    id: id.clone(),
                    name: id.clone(),
                    pp: None,
                    max_pp: None,
                    disabled: false,
                });
            match active.and_then(|slots| slots.iter().find(|s| &s.id == id)) {
                Some(slot) => {
                    state.name = slot.name.clone();
                    state.pp = slot.pp;
                    state.max_pp = slot.max_pp;
                    state.disabled = slot.disabled;
                }
                None => state.disabled = false,
            }
            state
        })
        .collect()
}
