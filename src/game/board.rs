//! A player's board: confirmed ships plus the shots fired against them

use super::fleet::{PlacedShip, Position};

/// A resolved shot against a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    pub position: Position,
    pub hit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    ships: Vec<PlacedShip>,
    shots: Vec<Shot>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a layout has been confirmed for this board
    pub fn is_placed(&self) -> bool {
        !self.ships.is_empty()
    }

    /// Install a validated layout. Callers check `is_placed` first; a
    /// layout is never replaced.
    pub(crate) fn place(&mut self, ships: Vec<PlacedShip>) {
        debug_assert!(!self.is_placed(), "board layout set twice");
        self.ships = ships;
    }

    pub fn ships(&self) -> &[PlacedShip] {
        &self.ships
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn was_targeted(&self, position: Position) -> bool {
        self.shots.iter().any(|s| s.position == position)
    }

    pub fn all_sunk(&self) -> bool {
        self.is_placed() && self.ships.iter().all(PlacedShip::is_sunk)
    }

    /// Ship cells not hit yet
    pub fn remaining_cells(&self) -> usize {
        self.ships
            .iter()
            .flat_map(|s| s.cells.iter())
            .filter(|c| !c.hit)
            .count()
    }

    pub(crate) fn ships_mut(&mut self) -> &mut [PlacedShip] {
        &mut self.ships
    }

    pub(crate) fn record_shot(&mut self, shot: Shot) {
        self.shots.push(shot);
    }
}
