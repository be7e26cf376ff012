//! Server-side fleet placement validation
//!
//! Every rule is checked independently and all violations are reported
//! together, so a client can fix its layout in one round trip.

use std::collections::{BTreeMap, BTreeSet};

use super::fleet::{
    PlacedShip, Position, ShipPlacement, ShipSpec, FLEET, FLEET_SHIPS, MAX_SHIP_LENGTH,
};

/// A single reason a layout was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error(
        "layout has {ships} ships and a longest ship of {longest} cells; \
         at most {} ships of up to {} cells are allowed",
        FLEET_SHIPS,
        MAX_SHIP_LENGTH
    )]
    Oversized { ships: usize, longest: usize },

    #[error("ship {ship} has no cells")]
    EmptyShip { ship: usize },

    #[error("expected {expected} {name}(s) of length {length}, found {found}")]
    WrongCount {
        name: &'static str,
        length: usize,
        expected: usize,
        found: usize,
    },

    #[error("ship {ship} has a cell outside the board at {position}")]
    OutOfBounds { ship: usize, position: Position },

    #[error("ships {first} and {second} overlap at {position}")]
    Overlap {
        first: usize,
        second: usize,
        position: Position,
    },

    #[error("ship {ship} is not in a straight line")]
    NotStraight { ship: usize },

    #[error("ship {ship} has gaps between its cells")]
    NotContiguous { ship: usize },

    #[error("ship {ship} touches ship {other}")]
    Adjacent { ship: usize, other: usize },
}

/// A rejected layout with every rule it broke
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fleet placement ({} violations)", .violations.len())]
pub struct PlacementError {
    pub violations: Vec<Violation>,
}

impl PlacementError {
    /// Human-readable reasons, in the order they were found
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

/// Which ships claim each in-bounds cell
type Occupancy = BTreeMap<Position, Vec<usize>>;

/// Fleet placement validator
pub struct PlacementValidator;

impl PlacementValidator {
    /// Validate a submitted layout, producing the board's ships on success
    pub fn validate(ships: &[ShipPlacement]) -> Result<Vec<PlacedShip>, PlacementError> {
        // Bounded input keeps the pairwise checks below cheap
        if let Some(oversized) = Self::check_size(ships) {
            return Err(PlacementError {
                violations: vec![oversized],
            });
        }

        let mut violations = Vec::new();

        let specs = Self::check_composition(ships, &mut violations);
        Self::check_bounds(ships, &mut violations);

        let occupancy = Self::occupancy(ships);
        Self::check_overlap(&occupancy, &mut violations);
        Self::check_shape(ships, &mut violations);
        Self::check_adjacency(ships, &occupancy, &mut violations);

        if !violations.is_empty() {
            return Err(PlacementError { violations });
        }

        Ok(ships
            .iter()
            .zip(specs)
            .enumerate()
            .filter_map(|(id, (ship, spec))| {
                spec.map(|spec| PlacedShip::new(id, spec, &ship.positions))
            })
            .collect())
    }

    /// More ships than a fleet holds, or a ship longer than any in it
    fn check_size(ships: &[ShipPlacement]) -> Option<Violation> {
        let longest = ships.iter().map(|s| s.positions.len()).max().unwrap_or(0);
        (ships.len() > FLEET_SHIPS || longest > MAX_SHIP_LENGTH).then_some(Violation::Oversized {
            ships: ships.len(),
            longest,
        })
    }

    /// Compare ship counts per length against the fleet table
    fn check_composition(
        ships: &[ShipPlacement],
        violations: &mut Vec<Violation>,
    ) -> Vec<Option<&'static ShipSpec>> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        let mut specs = Vec::with_capacity(ships.len());

        for (ship, placement) in ships.iter().enumerate() {
            let length = placement.positions.len();
            let spec = ShipSpec::for_length(length);
            // Every length up to MAX_SHIP_LENGTH is in the table, so only
            // an empty ship has no entry
            match spec {
                Some(_) => *counts.entry(length).or_default() += 1,
                None => violations.push(Violation::EmptyShip { ship }),
            }
            specs.push(spec);
        }

        for spec in FLEET.iter() {
            let found = counts.get(&spec.length).copied().unwrap_or(0);
            if found != spec.count {
                violations.push(Violation::WrongCount {
                    name: spec.name,
                    length: spec.length,
                    expected: spec.count,
                    found,
                });
            }
        }

        specs
    }

    fn check_bounds(ships: &[ShipPlacement], violations: &mut Vec<Violation>) {
        for (ship, placement) in ships.iter().enumerate() {
            for &position in &placement.positions {
                if !position.in_bounds() {
                    violations.push(Violation::OutOfBounds { ship, position });
                }
            }
        }
    }

    fn occupancy(ships: &[ShipPlacement]) -> Occupancy {
        let mut occupancy = Occupancy::new();
        for (ship, placement) in ships.iter().enumerate() {
            for &position in placement.positions.iter().filter(|p| p.in_bounds()) {
                let owners = occupancy.entry(position).or_default();
                // A ship repeating its own cell is a shape problem, not an overlap
                if owners.last() != Some(&ship) {
                    owners.push(ship);
                }
            }
        }
        occupancy
    }

    fn check_overlap(occupancy: &Occupancy, violations: &mut Vec<Violation>) {
        for (&position, owners) in occupancy {
            for pair in owners.windows(2) {
                violations.push(Violation::Overlap {
                    first: pair[0],
                    second: pair[1],
                    position,
                });
            }
        }
    }

    /// Multi-cell ships must form a straight, gap-free run
    fn check_shape(ships: &[ShipPlacement], violations: &mut Vec<Violation>) {
        for (ship, placement) in ships.iter().enumerate() {
            let cells = &placement.positions;
            if cells.len() < 2 {
                continue;
            }

            let horizontal = cells.iter().all(|p| p.y == cells[0].y);
            let vertical = cells.iter().all(|p| p.x == cells[0].x);

            let mut run: Vec<i32> = if horizontal {
                cells.iter().map(|p| p.x).collect()
            } else if vertical {
                cells.iter().map(|p| p.y).collect()
            } else {
                violations.push(Violation::NotStraight { ship });
                continue;
            };

            run.sort_unstable();
            if run.windows(2).any(|w| w[1] - w[0] != 1) {
                violations.push(Violation::NotContiguous { ship });
            }
        }
    }

    /// No cell may touch another ship, diagonals included
    fn check_adjacency(
        ships: &[ShipPlacement],
        occupancy: &Occupancy,
        violations: &mut Vec<Violation>,
    ) {
        let mut touching: BTreeSet<(usize, usize)> = BTreeSet::new();

        for (ship, placement) in ships.iter().enumerate() {
            for position in placement.positions.iter().filter(|p| p.in_bounds()) {
                for neighbor in position.neighbors() {
                    let Some(owners) = occupancy.get(&neighbor) else {
                        continue;
                    };
                    for &other in owners.iter().filter(|&&o| o != ship) {
                        touching.insert((ship.min(other), ship.max(other)));
                    }
                }
            }
        }

        violations.extend(
            touching
                .into_iter()
                .map(|(ship, other)| Violation::Adjacent { ship, other }),
        );
    }
}
