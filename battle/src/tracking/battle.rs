//! TrackedBattle - the in-process mirror of one battle

use sdgym_protocol::{GameType, Player, to_id};

use super::phase::{BattlePhase, Outcome};
use crate::types::{FieldState, SideState};

/// A battle reconstructed from server messages, seen from the agent's side
#[derive(Debug, Clone)]
pub struct TrackedBattle {
    // === Battle metadata ===
    /// Room id, e.g. "battle-gen9randombattle-1234"
    pub room_id: String,

    /// Username the agent logged in with
    pub agent_name: String,

    pub game_type: Option<GameType>,

    pub generation: u8,

    pub tier: String,

    /// Current turn number (0 = not started)
    pub turn: u32,

    pub phase: BattlePhase,

    // === State ===
    pub field: FieldState,

    /// Indexed by [`player_to_index`]
    pub(crate) sides: [Option<SideState>; 4],

    perspective: Option<Player>,

    // === Outcome ===
    pub winner: Option<String>,

    pub tie: bool,

    /// Username of the player who forfeited or timed out
    pub forfeited_by: Option<String>,
}

impl TrackedBattle {
    pub fn new(room_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            agent_name: agent_name.into(),
            game_type: None,
            generation: 9,
            tier: String::new(),
            turn: 0,
            phase: BattlePhase::AwaitingStart,
            field: FieldState::new(),
            sides: [None, None, None, None],
            perspective: None,
            winner: None,
            tie: false,
            forfeited_by: None,
        }
    }

    /// Read-only snapshot of the current state
    pub fn current_state(&self) -> TrackedBattle {
        self.clone()
    }

    pub fn set_perspective(&mut self, player: Player) {
        self.perspective = Some(player);
    }

    pub fn perspective(&self) -> Option<Player> {
        self.perspective
    }

    pub fn me(&self) -> Option<&SideState> {
        self.perspective.and_then(|p| self.get_side(p))
    }

    pub fn opponent(&self) -> Option<&SideState> {
        self.perspective.and_then(|p| self.get_side(p.foe()))
    }

    pub fn get_side(&self, player: Player) -> Option<&SideState> {
        self.sides[player_to_index(player)].as_ref()
    }

    pub fn get_side_mut(&mut self, player: Player) -> Option<&mut SideState> {
        self.sides[player_to_index(player)].as_mut()
    }

    /// Get or create a side; a known username is never replaced by an empty one
    pub fn get_or_create_side(&mut self, player: Player, username: &str) -> &mut SideState {
        let slots = self.game_type.map_or(1, |g| g.active_slots());
        let side = self.sides[player_to_index(player)].get_or_insert_with(|| {
            let mut side = SideState::new(player, username);
            side.set_active_slots(slots);
            side
        });
        if !username.is_empty() {
            side.username = username.to_string();
        }
        side
    }

    pub fn has_side(&self, player: Player) -> bool {
        self.sides[player_to_index(player)].is_some()
    }

    pub fn sides(&self) -> impl Iterator<Item = &SideState> {
        self.sides.iter().filter_map(|s| s.as_ref())
    }

    pub fn sides_mut(&mut self) -> impl Iterator<Item = &mut SideState> {
        self.sides.iter_mut().filter_map(|s| s.as_mut())
    }

    pub fn set_game_type(&mut self, game_type: GameType) {
        self.game_type = Some(game_type);
        let slots = game_type.active_slots();
        for side in self.sides_mut() {
            side.set_active_slots(slots);
        }
    }

    pub fn is_agent(&self, username: &str) -> bool {
        !username.is_empty() && to_id(username) == to_id(&self.agent_name)
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_ended()
    }

    /// Outcome relative to the agent
    pub fn outcome(&self) -> Outcome {
        if !self.is_ended() {
            return Outcome::Ongoing;
        }
        if self.tie {
            return Outcome::Tie;
        }
        let Some(winner) = self.winner.as_deref() else {
            return Outcome::Tie;
        };
        let agent_won = self.is_agent(winner);
        match (&self.forfeited_by, agent_won) {
            (Some(_), agent_won) => Outcome::Forfeited { agent_won },
            (None, true) => Outcome::Won,
            (None, false) => Outcome::Lost,
        }
    }
}

pub fn player_to_index(player: Player) -> usize {
    match player {
        Player::P1 => 0,
        Player::P2 => 1,
        Player::P3 => 2,
        Player::P4 => 3,
    }
}

/// Active position letter to slot index
pub fn position_to_slot(pos: char) -> usize {
    match pos {
        'b' => 1,
        'c' => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_battle() -> TrackedBattle {
        let mut battle = TrackedBattle::new("battle-gen9randombattle-1", "Agent");
        battle.get_or_create_side(Player::P1, "Agent");
        battle.get_or_create_side(Player::P2, "Rival");
        battle.set_perspective(Player::P1);
        battle
    }

    #[test]
    fn test_new_battle() {
        let battle = TrackedBattle::new("battle-x", "Agent");
        assert_eq!(battle.turn, 0);
        assert_eq!(battle.phase, BattlePhase::AwaitingStart);
        assert_eq!(battle.outcome(), Outcome::Ongoing);
        assert!(battle.perspective().is_none());
        assert!(battle.me().is_none());
    }

    #[test]
    fn test_me_and_opponent() {
        let battle = create_test_battle();
        assert_eq!(battle.me().unwrap().username, "Agent");
        assert_eq!(battle.opponent().unwrap().username, "Rival");
    }

    #[test]
    fn test_get_or_create_side_keeps_username() {
        let mut battle = TrackedBattle::new("battle-x", "Agent");
        battle.get_or_create_side(Player::P2, "Rival");
        battle.get_or_create_side(Player::P2, "");
        assert_eq!(battle.get_side(Player::P2).unwrap().username, "Rival");
    }

    #[test]
    fn test_set_game_type() {
        let mut battle = create_test_battle();
        battle.set_game_type(GameType::Doubles);
        assert_eq!(battle.me().unwrap().active_indices.len(), 2);
    }

    #[test]
    fn test_outcome_is_agent_relative() {
        let mut battle = create_test_battle();
        battle.phase = BattlePhase::Ended;
        battle.winner = Some("agent".to_string());
        assert_eq!(battle.outcome(), Outcome::Won);

        battle.winner = Some("Rival".to_string());
        assert_eq!(battle.outcome(), Outcome::Lost);

        battle.forfeited_by = Some("Agent".to_string());
        assert_eq!(battle.outcome(), Outcome::Forfeited { agent_won: false });

        battle.winner = None;
        battle.tie = true;
        assert_eq!(battle.outcome(), Outcome::Tie);
    }

    #[test]
    fn test_current_state_is_a_snapshot() {
        let mut battle = create_test_battle();
        let snapshot = battle.current_state();
        battle.turn = 5;
        assert_eq!(snapshot.turn, 0);
    }

    #[test]
    fn test_position_to_slot() {
        assert_eq!(position_to_slot('a'), 0);
        assert_eq!(position_to_slot('b'), 1);
        assert_eq!(position_to_slot('c'), 2);
        assert_eq!(position_to_slot('d'), 0);
    }
}
