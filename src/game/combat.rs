//! Attack resolution - hit, sunk and win detection plus the turn rule

use serde::{Deserialize, Serialize};

use super::board::Shot;
use super::fleet::{PlacedShip, Position};
use super::r#match::{MatchPhase, MatchState};

/// A ship that went down with the last shot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunkShip {
    pub ship_id: usize,
    pub name: String,
    pub length: usize,
    pub positions: Vec<Position>,
}

impl From<&PlacedShip> for SunkShip {
    fn from(ship: &PlacedShip) -> Self {
        Self {
            ship_id: ship.id,
            name: ship.spec.name.to_string(),
            length: ship.spec.length,
            positions: ship.positions(),
        }
    }
}

/// Result of a resolved attack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub position: Position,
    pub hit: bool,
    pub sunk: Option<SunkShip>,
    /// Set when this shot destroyed the last defending ship
    pub winner: Option<usize>,
    /// Index of the player allowed to fire next
    pub next_turn: usize,
}

/// Why an attack was refused. State is untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    #[error("attacks are only accepted during the battle")]
    NotInBattle,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("position {0} is outside the board")]
    OutOfBounds(Position),

    #[error("position {0} was already targeted")]
    AlreadyTargeted(Position),
}

impl AttackError {
    pub fn code(&self) -> &'static str {
        match self {
            AttackError::NotInBattle => "not_in_battle",
            AttackError::NotYourTurn => "not_your_turn",
            AttackError::OutOfBounds(_) => "out_of_bounds",
            AttackError::AlreadyTargeted(_) => "already_targeted",
        }
    }
}

/// The only writer of hit flags, turn and the winning transition
pub struct AttackResolver;

impl AttackResolver {
    /// Resolve a shot by `attacker` against the opposing board.
    ///
    /// A miss passes the turn; a hit keeps it with the attacker.
    pub fn resolve(
        state: &mut MatchState,
        attacker: usize,
        position: Position,
    ) -> Result<AttackOutcome, AttackError> {
        if state.phase != MatchPhase::Battle {
            return Err(AttackError::NotInBattle);
        }
        if state.turn != attacker {
            return Err(AttackError::NotYourTurn);
        }
        if !position.in_bounds() {
            return Err(AttackError::OutOfBounds(position));
        }

        let defender = 1 - attacker;
        let board = &mut state.boards[defender];
        if board.was_targeted(position) {
            return Err(AttackError::AlreadyTargeted(position));
        }

        let mut hit = false;
        let mut sunk = None;
        for ship in board.ships_mut() {
            let Some(cell) = ship
                .cells
                .iter_mut()
                .find(|c| c.position == position && !c.hit)
            else {
                continue;
            };

            cell.hit = true;
            hit = true;
            if ship.is_sunk() {
                sunk = Some(SunkShip::from(&*ship));
            }
            break;
        }

        board.record_shot(Shot { position, hit });

        let mut winner = None;
        if hit {
            if board.all_sunk() {
                winner = Some(attacker);
                state.phase = MatchPhase::Finished;
            }
        } else {
            state.turn = defender;
        }

        Ok(AttackOutcome {
            position,
            hit,
            sunk,
            winner,
            next_turn: state.turn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fleet::FLEET_CELLS;
    use crate::game::test_fleets::{battle_ready, opponent_fleet};

    #[test]
    fn hit_and_sink_keeps_turn() {
        let mut state = battle_ready();
        let outcome = AttackResolver::resolve(&mut state, 0, Position::new(3, 3)).unwrap();
        assert!(outcome.hit);
        let sunk = outcome.sunk.unwrap();
        assert_eq!(sunk.name, "Submarine");
        assert_eq!(sunk.positions, vec![Position::new(3, 3)]);
        assert_eq!(outcome.next_turn, 0);
        assert_eq!(outcome.winner, None);
    }

    #[test]
    fn repeat_target_is_rejected_without_side_effects() {
        let mut state = battle_ready();
        AttackResolver::resolve(&mut state, 0, Position::new(3, 3)).unwrap();
        let shots_before = state.board(1).shots().len();

        let err = AttackResolver::resolve(&mut state, 0, Position::new(3, 3)).unwrap_err();
        assert_eq!(err, AttackError::AlreadyTargeted(Position::new(3, 3)));
        assert_eq!(state.board(1).shots().len(), shots_before);
        assert_eq!(state.turn(), Some(0));
    }

    #[test]
    fn miss_passes_turn() {
        let mut state = battle_ready();
        let outcome = AttackResolver::resolve(&mut state, 0, Position::new(0, 0)).unwrap();
        assert!(!outcome.hit);
        assert_eq!(outcome.next_turn, 1);
        assert_eq!(
            AttackResolver::resolve(&mut state, 0, Position::new(1, 1)),
            Err(AttackError::NotYourTurn)
        );
    }

    #[test]
    fn hit_without_sinking() {
        let mut state = battle_ready();
        // carrier of the defending fleet starts at (5, 0)
        let outcome = AttackResolver::resolve(&mut state, 0, Position::new(5, 0)).unwrap();
        assert!(outcome.hit);
        assert!(outcome.sunk.is_none());
    }

    #[test]
    fn rejects_out_of_bounds() {
        let mut state = battle_ready();
        assert_eq!(
            AttackResolver::resolve(&mut state, 0, Position::new(10, 2)),
            Err(AttackError::OutOfBounds(Position::new(10, 2)))
        );
        assert!(state.board(1).shots().is_empty());
    }

    #[test]
    fn sinking_every_ship_wins() {
        let mut state = battle_ready();
        let targets: Vec<Position> = opponent_fleet()
            .into_iter()
            .flat_map(|s| s.positions)
            .collect();
        assert_eq!(targets.len(), FLEET_CELLS);

        let (last, rest) = targets.split_last().unwrap();
        for &position in rest {
            let outcome = AttackResolver::resolve(&mut state, 0, position).unwrap();
            assert!(outcome.hit);
            assert_eq!(outcome.winner, None);
        }

        let outcome = AttackResolver::resolve(&mut state, 0, *last).unwrap();
        assert_eq!(outcome.winner, Some(0));
        assert_eq!(state.phase(), MatchPhase::Finished);
        assert_eq!(state.board(1).remaining_cells(), 0);
        assert_eq!(
            AttackResolver::resolve(&mut state, 0, Position::new(0, 0)),
            Err(AttackError::NotInBattle)
        );
    }
}
