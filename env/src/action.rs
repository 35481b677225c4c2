//! Discrete action space over move and switch slots
//!
//! Index layout is fixed by configuration, never by battle state:
//!
//! ```text
//! [0, M)        move slot i + 1
//! [M, M + K)    j-th benched creature in request party order
//! ```
//!
//! with `M = 4` and `K = team_size - 1`. An index that names a slot the current request lacks
//! is masked, not removed. If two party entries could satisfy one switch index the lowest
//! party position wins; in singles the layout makes this impossible.

use sdgym_battle::{MAX_MOVES, SideState};
use sdgym_client::{BattleRequest, Choice};
use serde::Serialize;

use crate::error::InvalidAction;

pub const MOVE_SLOTS: usize = MAX_MOVES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionSpace {
    pub n: usize,
}

#[derive(Debug, Clone)]
pub struct ActionMapper {
    switch_slots: usize,
}

impl ActionMapper {
    pub fn new(team_size: usize) -> Self {
        Self {
            switch_slots: team_size.saturating_sub(1),
        }
    }

    pub fn len(&self) -> usize {
        MOVE_SLOTS + self.switch_slots
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn space(&self) -> ActionSpace {
        ActionSpace { n: self.len() }
    }

    /// Legality of every index for this request.
    ///
    /// `me` is the tracked agent side; a creature that ever fainted there stays illegal as a
    /// switch target even if the request disagrees.
    pub fn legal_mask(&self, request: &BattleRequest, me: Option<&SideState>) -> Vec<bool> {
        let mut mask = vec![false; self.len()];
        if request.wait || request.team_preview {
            return mask;
        }

        if !request.is_force_switch()
            && let Some(active) = request.active_slot()
        {
            for (slot, legal) in mask.iter_mut().take(MOVE_SLOTS).enumerate() {
                *legal = active.moves.get(slot).is_some_and(|m| m.is_usable());
            }
        }

        let trapped = request
            .active_slot()
            .is_some_and(|active| !active.can_switch());
        if trapped && !request.is_force_switch() {
            return mask;
        }

        let party = request.party();
        for (j, position) in self.switch_targets(request).into_iter().enumerate() {
            let entry = &party[position - 1];
            let fainted_before = me.is_some_and(|side| {
                side.find_by_name(entry.name())
                    .is_some_and(|idx| side.pokemon[idx].fainted)
            });
            mask[MOVE_SLOTS + j] = !entry.is_fainted() && !fainted_before;
        }
        mask
    }

    /// Map an index to a command, refusing masked indices
    pub fn decode(
        &self,
        index: usize,
        request: &BattleRequest,
        me: Option<&SideState>,
    ) -> Result<Choice, InvalidAction> {
        if index >= self.len() {
            return Err(InvalidAction::OutOfRange {
                index,
                n: self.len(),
            });
        }
        if !self.legal_mask(request, me)[index] {
            return Err(InvalidAction::Masked { index });
        }

        if index < MOVE_SLOTS {
            return Ok(Choice::Move(index + 1));
        }
        self.switch_targets(request)
            .get(index - MOVE_SLOTS)
            .map(|&position| Choice::Switch(position))
            .ok_or(InvalidAction::Masked { index })
    }

    /// Index of a command, if the layout has one for it
    pub fn encode(&self, choice: &Choice, request: &BattleRequest) -> Option<usize> {
        match choice {
            Choice::Move(slot) if (1..=MOVE_SLOTS).contains(slot) => Some(slot - 1),
            Choice::Switch(position) => self
                .switch_targets(request)
                .iter()
                .position(|p| p == position)
                .map(|j| MOVE_SLOTS + j),
            _ => None,
        }
    }

    /// Every legal index with its command
    pub fn legal_choices(&self, request: &BattleRequest, me: Option<&SideState>) -> Vec<(usize, Choice)> {
        self.legal_mask(request, me)
            .into_iter()
            .enumerate()
            .filter(|(_, legal)| *legal)
            .filter_map(|(index, _)| {
                self.decode(index, request, me)
                    .ok()
                    .map(|choice| (index, choice))
            })
            .collect()
    }

    /// 1-based party positions of benched creatures, in request order, capped at K
    fn switch_targets(&self, request: &BattleRequest) -> Vec<usize> {
        request
            .party()
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.active)
            .map(|(i, _)| i + 1)
            .take(self.switch_slots)
            .collect()
    }
}

/// Lowest legal index
pub fn first_legal(mask: &[bool]) -> Option<usize> {
    mask.iter().position(|&legal| legal)
}
