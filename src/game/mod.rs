//! Game rules: fleet model, placement validation, attack resolution and the
//! match state machine

pub mod board;
pub mod combat;
pub mod fleet;
pub mod r#match;
pub mod placement;

pub use board::{Board, Shot};
pub use combat::{AttackError, AttackOutcome, AttackResolver, SunkShip};
pub use fleet::{
    PlacedShip, Position, ShipPlacement, ShipSpec, BOARD_SIZE, FLEET, FLEET_CELLS, FLEET_SHIPS,
    MAX_SHIP_LENGTH,
};
pub use placement::{PlacementError, PlacementValidator, Violation};
pub use r#match::{
    GameMatch, MatchCommand, MatchError, MatchHandle, MatchPhase, MatchPlayer, MatchRegistry,
    MatchState, MatchSummary, PlacementOutcome,
};

#[cfg(test)]
pub(crate) mod test_fleets {
    use uuid::Uuid;

    use super::fleet::{Position, ShipPlacement};
    use super::r#match::{MatchPlayer, MatchState};

    pub fn layout(ships: &[&[(i32, i32)]]) -> Vec<ShipPlacement> {
        ships
            .iter()
            .map(|cells| {
                ShipPlacement::new(cells.iter().map(|&(x, y)| Position::new(x, y)).collect())
            })
            .collect()
    }

    /// Carrier on the top row, everything else packed below it
    pub fn standard_fleet() -> Vec<ShipPlacement> {
        layout(&[
            &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)],
            &[(0, 2), (1, 2), (2, 2), (3, 2)],
            &[(5, 2), (6, 2), (7, 2)],
            &[(0, 4), (1, 4), (2, 4)],
            &[(4, 4), (5, 4)],
            &[(7, 4), (8, 4)],
            &[(0, 6), (1, 6)],
            &[(3, 6)],
            &[(5, 6)],
            &[(7, 6)],
            &[(9, 6)],
        ])
    }

    /// Leaves (0, 0) empty and has a submarine at (3, 3)
    pub fn opponent_fleet() -> Vec<ShipPlacement> {
        layout(&[
            &[(5, 0), (6, 0), (7, 0), (8, 0), (9, 0)],
            &[(6, 2), (7, 2), (8, 2), (9, 2)],
            &[(0, 5), (1, 5), (2, 5)],
            &[(6, 4), (7, 4), (8, 4)],
            &[(0, 7), (1, 7)],
            &[(4, 5), (4, 6)],
            &[(8, 6), (8, 7)],
            &[(3, 3)],
            &[(0, 2)],
            &[(6, 9)],
            &[(2, 9)],
        ])
    }

    /// A match in the battle phase: player 0 holds the standard fleet and
    /// player 1 the opponent fleet
    pub fn battle_ready() -> MatchState {
        let mut state = MatchState::new(
            Uuid::new_v4(),
            MatchPlayer::new(Uuid::new_v4(), "Alice"),
            MatchPlayer::new(Uuid::new_v4(), "Bob"),
        );
        state
            .submit_placement(0, &standard_fleet())
            .expect("standard fleet is valid");
        state
            .submit_placement(1, &opponent_fleet())
            .expect("opponent fleet is valid");
        state
    }
}
