//! Grid and fleet definitions shared by placement, combat and the wire protocol

use serde::{Deserialize, Serialize};

/// Side length of the square board
pub const BOARD_SIZE: i32 = 10;

/// A cell coordinate on the board.
///
/// Signed so that out-of-range values sent by a client survive
/// deserialization and can be reported instead of rejected at the framing
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check that both coordinates lie on the board
    pub fn in_bounds(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    /// The up to eight in-bounds cells surrounding this one
    pub fn neighbors(&self) -> impl Iterator<Item = Position> + '_ {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(|(dx, dy)| Position::new(self.x + dx, self.y + dy))
            .filter(Position::in_bounds)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One entry of the fleet composition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipSpec {
    pub name: &'static str,
    pub length: usize,
    /// How many ships of this kind each player must place
    pub count: usize,
}

/// Ships every player places, longest first
pub const FLEET: [ShipSpec; 5] = [
    ShipSpec { name: "Carrier", length: 5, count: 1 },
    ShipSpec { name: "Battleship", length: 4, count: 1 },
    ShipSpec { name: "Cruiser", length: 3, count: 2 },
    ShipSpec { name: "Destroyer", length: 2, count: 3 },
    ShipSpec { name: "Submarine", length: 1, count: 4 },
];

/// Number of ships in a complete fleet
pub const FLEET_SHIPS: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < FLEET.len() {
        total += FLEET[i].count;
        i += 1;
    }
    total
};

/// Cells in the longest ship of the fleet
pub const MAX_SHIP_LENGTH: usize = {
    let mut longest = 0;
    let mut i = 0;
    while i < FLEET.len() {
        if FLEET[i].length > longest {
            longest = FLEET[i].length;
        }
        i += 1;
    }
    longest
};

/// Number of cells a complete fleet occupies
pub const FLEET_CELLS: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < FLEET.len() {
        total += FLEET[i].count * FLEET[i].length;
        i += 1;
    }
    total
};

impl ShipSpec {
    /// Look up the fleet entry for a ship of the given length
    pub fn for_length(length: usize) -> Option<&'static ShipSpec> {
        FLEET.iter().find(|spec| spec.length == length)
    }
}

/// A ship layout as submitted by a client.
///
/// Only the cells are trusted input; anything else a client attaches
/// (sizes, orientation, hit markers) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    #[serde(default)]
    pub name: Option<String>,
    pub positions: Vec<Position>,
}

impl ShipPlacement {
    pub fn new(positions: Vec<Position>) -> Self {
        Self {
            name: None,
            positions,
        }
    }
}

/// A single occupied cell of a placed ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipCell {
    pub position: Position,
    pub hit: bool,
}

/// A validated ship on a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedShip {
    /// Index of the ship in the submitted layout
    pub id: usize,
    pub spec: &'static ShipSpec,
    pub cells: Vec<ShipCell>,
}

impl PlacedShip {
    pub fn new(id: usize, spec: &'static ShipSpec, positions: &[Position]) -> Self {
        Self {
            id,
            spec,
            cells: positions
                .iter()
                .map(|&position| ShipCell {
                    position,
                    hit: false,
                })
                .collect(),
        }
    }

    pub fn is_sunk(&self) -> bool {
        self.cells.iter().all(|c| c.hit)
    }

    pub fn occupies(&self, position: Position) -> bool {
        self.cells.iter().any(|c| c.position == position)
    }

    pub fn positions(&self) -> Vec<Position> {
        self.cells.iter().map(|c| c.position).collect()
    }
}
