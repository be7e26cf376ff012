//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{Position, ShipPlacement, SunkShip};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Ask to be paired with an opponent
    Ready {
        /// Display name shown to the opponent
        #[serde(default)]
        name: Option<String>,
    },

    /// Submit the fleet layout for a match
    PlaceShips {
        match_id: Uuid,
        ships: Vec<ShipPlacement>,
    },

    /// Fire at a cell of the opponent's board
    Attack {
        match_id: Uuid,
        position: Position,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player_id: Uuid,
        server_time: u64,
    },

    /// No opponent yet, stay in the queue
    Waiting,

    /// Paired with an opponent
    Matched {
        match_id: Uuid,
        opponent_name: String,
        /// The receiving player's own id
        player_id: Uuid,
        is_first_player: bool,
    },

    /// Fleet layout stored
    PlacementAccepted {
        match_id: Uuid,
    },

    /// Fleet layout refused, sent to the submitter only
    PlacementRejected {
        match_id: Uuid,
        reasons: Vec<String>,
    },

    /// Both fleets placed
    BattleStart {
        match_id: Uuid,
        first_player_id: Uuid,
    },

    /// An attack was resolved
    AttackResult {
        match_id: Uuid,
        position: Position,
        hit: bool,
        sunk: Option<SunkShip>,
        next_player_id: Uuid,
        attacker_id: Uuid,
    },

    /// Every ship of one side is sunk
    GameOver {
        match_id: Uuid,
        winner_id: Uuid,
        winner_name: String,
    },

    /// The other participant disconnected; the match is over
    OpponentLeft {
        match_id: Uuid,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
