//! Match state machine, the per-match actor and the registry of live matches

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::PlayerHandle;
use crate::ws::protocol::ServerMsg;

use super::board::Board;
use super::combat::{AttackError, AttackOutcome, AttackResolver};
use super::fleet::{Position, ShipPlacement};
use super::placement::{PlacementError, PlacementValidator};

/// Match phase. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MatchPhase {
    /// Players are placing their fleets
    Placement = 0,
    /// Alternating attacks
    Battle = 1,
    /// Won or abandoned
    Finished = 2,
}

impl MatchPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Placement,
            1 => Self::Battle,
            _ => Self::Finished,
        }
    }
}

/// A participant as seen by the match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlayer {
    pub player_id: Uuid,
    pub display_name: String,
}

impl MatchPlayer {
    pub fn new(player_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            player_id,
            display_name: display_name.into(),
        }
    }
}

/// Result of an accepted fleet submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The other player has not placed yet
    AwaitingOpponent,
    /// Both fleets are in; `first` fires first
    BattleStarted { first: usize },
}

/// Errors from match-level operations other than attacks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("match has already finished")]
    Finished,

    #[error("fleets can only be placed before the battle starts")]
    NotInPlacement,

    #[error("your fleet is already placed")]
    AlreadyPlaced,

    #[error(transparent)]
    InvalidPlacement(#[from] PlacementError),
}

impl MatchError {
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Finished => "match_finished",
            MatchError::NotInPlacement => "not_in_placement",
            MatchError::AlreadyPlaced => "already_placed",
            MatchError::InvalidPlacement(_) => "invalid_placement",
        }
    }
}

/// Authoritative state of one match (owned by its actor)
#[derive(Debug, Clone)]
pub struct MatchState {
    id: Uuid,
    players: [MatchPlayer; 2],
    pub(super) boards: [Board; 2],
    pub(super) phase: MatchPhase,
    pub(super) turn: usize,
    created_at: DateTime<Utc>,
}

impl MatchState {
    pub fn new(id: Uuid, first: MatchPlayer, second: MatchPlayer) -> Self {
        Self {
            id,
            players: [first, second],
            boards: [Board::new(), Board::new()],
            phase: MatchPhase::Placement,
            turn: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Whose turn it is; only meaningful during the battle
    pub fn turn(&self) -> Option<usize> {
        (self.phase == MatchPhase::Battle).then_some(self.turn)
    }

    pub fn players(&self) -> &[MatchPlayer; 2] {
        &self.players
    }

    pub fn player(&self, index: usize) -> &MatchPlayer {
        &self.players[index]
    }

    pub fn board(&self, index: usize) -> &Board {
        &self.boards[index]
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn index_of(&self, player_id: Uuid) -> Option<usize> {
        self.players.iter().position(|p| p.player_id == player_id)
    }

    /// Validate and store a player's fleet, starting the battle once both
    /// fleets are in.
    pub fn submit_placement(
        &mut self,
        index: usize,
        ships: &[ShipPlacement],
    ) -> Result<PlacementOutcome, MatchError> {
        match self.phase {
            MatchPhase::Placement => {}
            MatchPhase::Battle => return Err(MatchError::NotInPlacement),
            MatchPhase::Finished => return Err(MatchError::Finished),
        }
        if self.boards[index].is_placed() {
            return Err(MatchError::AlreadyPlaced);
        }

        let fleet = PlacementValidator::validate(ships)?;
        self.boards[index].place(fleet);

        if self.boards.iter().all(Board::is_placed) {
            self.phase = MatchPhase::Battle;
            self.turn = 0;
            return Ok(PlacementOutcome::BattleStarted { first: self.turn });
        }

        Ok(PlacementOutcome::AwaitingOpponent)
    }

    pub fn attack(
        &mut self,
        index: usize,
        position: Position,
    ) -> Result<AttackOutcome, AttackError> {
        AttackResolver::resolve(self, index, position)
    }

    /// End the match because a participant left. Returns false if it had
    /// already finished.
    pub fn abandon(&mut self) -> bool {
        if self.phase == MatchPhase::Finished {
            return false;
        }
        self.phase = MatchPhase::Finished;
        true
    }
}

/// Commands routed into a match actor
#[derive(Debug, Clone)]
pub enum MatchCommand {
    PlaceShips {
        player_id: Uuid,
        ships: Vec<ShipPlacement>,
    },
    Attack {
        player_id: Uuid,
        position: Position,
    },
    Disconnect {
        player_id: Uuid,
    },
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub players: [MatchPlayer; 2],
    pub created_at: DateTime<Utc>,
    pub command_tx: mpsc::Sender<MatchCommand>,
    phase: Arc<AtomicU8>,
}

impl MatchHandle {
    /// Last phase published by the actor
    pub fn phase(&self) -> MatchPhase {
        MatchPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    pub fn has_player(&self, player_id: &Uuid) -> bool {
        self.players.iter().any(|p| &p.player_id == player_id)
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            match_id: self.id,
            players: self.players.iter().map(|p| p.display_name.clone()).collect(),
            phase: self.phase(),
            created_at: self.created_at,
        }
    }
}

/// Public view of a live match
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub players: Vec<String>,
    pub phase: MatchPhase,
    pub created_at: DateTime<Utc>,
}

/// Registry of all active matches and who plays in them
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
    participants: DashMap<Uuid, Uuid>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
            participants: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        for player in &handle.players {
            self.participants.insert(player.player_id, handle.id);
        }
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        let (_, handle) = self.matches.remove(id)?;
        for player in &handle.players {
            self.participants
                .remove_if(&player.player_id, |_, match_id| match_id == id);
        }
        Some(handle)
    }

    /// The match a player currently takes part in
    pub fn match_for(&self, player_id: &Uuid) -> Option<MatchHandle> {
        let match_id = *self.participants.get(player_id)?;
        self.get(&match_id)
    }

    pub fn contains_player(&self, player_id: &Uuid) -> bool {
        self.participants.contains_key(player_id)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn summaries(&self) -> Vec<MatchSummary> {
        let mut summaries: Vec<MatchSummary> =
            self.matches.iter().map(|m| m.value().summary()).collect();
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative match actor. Commands are applied strictly one at a
/// time, so no caller ever sees a half-applied turn.
pub struct GameMatch {
    state: MatchState,
    commands: mpsc::Receiver<MatchCommand>,
    outbound: [PlayerHandle; 2],
    registry: Arc<MatchRegistry>,
    phase: Arc<AtomicU8>,
}

impl GameMatch {
    /// Create a new match; `players[0]` fires first once the battle starts
    pub fn new(
        id: Uuid,
        players: [MatchPlayer; 2],
        outbound: [PlayerHandle; 2],
        registry: Arc<MatchRegistry>,
        command_buffer: usize,
    ) -> (Self, MatchHandle) {
        let (command_tx, commands) = mpsc::channel(command_buffer.max(1));
        let phase = Arc::new(AtomicU8::new(MatchPhase::Placement as u8));

        let [first, second] = players;
        let state = MatchState::new(id, first, second);

        let handle = MatchHandle {
            id,
            players: state.players().clone(),
            created_at: state.created_at(),
            command_tx,
            phase: phase.clone(),
        };

        let game_match = Self {
            state,
            commands,
            outbound,
            registry,
            phase,
        };

        (game_match, handle)
    }

    /// Process commands until the match finishes
    pub async fn run(mut self) {
        info!(match_id = %self.state.id(), "Match started");

        while let Some(command) = self.commands.recv().await {
            self.apply(command);

            if self.state.phase() == MatchPhase::Finished {
                break;
            }
        }

        if self.state.phase() != MatchPhase::Finished {
            warn!(match_id = %self.state.id(), "Command channel closed before match finished");
            self.state.abandon();
            self.finish();
        }

        info!(match_id = %self.state.id(), "Match ended");
    }

    fn apply(&mut self, command: MatchCommand) {
        match command {
            MatchCommand::PlaceShips { player_id, ships } => {
                if let Some(index) = self.participant(player_id) {
                    self.handle_placement(index, &ships);
                }
            }
            MatchCommand::Attack {
                player_id,
                position,
            } => {
                if let Some(index) = self.participant(player_id) {
                    self.handle_attack(index, position);
                }
            }
            MatchCommand::Disconnect { player_id } => {
                if let Some(index) = self.participant(player_id) {
                    self.handle_disconnect(index);
                }
            }
        }
    }

    fn participant(&self, player_id: Uuid) -> Option<usize> {
        let index = self.state.index_of(player_id);
        if index.is_none() {
            warn!(
                match_id = %self.state.id(),
                player_id = %player_id,
                "Command from a player outside this match"
            );
        }
        index
    }

    /// Handle a fleet submission
    fn handle_placement(&mut self, index: usize, ships: &[ShipPlacement]) {
        let match_id = self.state.id();
        let player_id = self.state.player(index).player_id;

        match self.state.submit_placement(index, ships) {
            Ok(outcome) => {
                info!(match_id = %match_id, player_id = %player_id, "Fleet placed");
                self.outbound[index].send(ServerMsg::PlacementAccepted { match_id });

                if let PlacementOutcome::BattleStarted { first } = outcome {
                    self.publish_phase();
                    let first_player_id = self.state.player(first).player_id;
                    self.broadcast(ServerMsg::BattleStart {
                        match_id,
                        first_player_id,
                    });
                    info!(match_id = %match_id, first_player_id = %first_player_id, "Battle started");
                }
            }
            Err(MatchError::InvalidPlacement(err)) => {
                warn!(
                    match_id = %match_id,
                    player_id = %player_id,
                    violations = err.violations.len(),
                    "Fleet placement rejected"
                );
                self.outbound[index].send(ServerMsg::PlacementRejected {
                    match_id,
                    reasons: err.reasons(),
                });
            }
            Err(err) => {
                warn!(match_id = %match_id, player_id = %player_id, error = %err, "Placement refused");
                self.outbound[index].send(ServerMsg::error(err.code(), err.to_string()));
            }
        }
    }

    /// Handle an attack
    fn handle_attack(&mut self, index: usize, position: Position) {
        let match_id = self.state.id();
        let attacker_id = self.state.player(index).player_id;

        let outcome = match self.state.attack(index, position) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    match_id = %match_id,
                    player_id = %attacker_id,
                    error = %err,
                    "Attack rejected"
                );
                self.outbound[index].send(ServerMsg::error(err.code(), err.to_string()));
                return;
            }
        };

        debug!(
            match_id = %match_id,
            player_id = %attacker_id,
            x = position.x,
            y = position.y,
            hit = outcome.hit,
            "Attack resolved"
        );

        self.broadcast(ServerMsg::AttackResult {
            match_id,
            position: outcome.position,
            hit: outcome.hit,
            sunk: outcome.sunk.clone(),
            next_player_id: self.state.player(outcome.next_turn).player_id,
            attacker_id,
        });

        if let Some(winner) = outcome.winner {
            self.finish();
            let winner = self.state.player(winner).clone();
            info!(
                match_id = %match_id,
                winner_id = %winner.player_id,
                "Match won"
            );
            self.broadcast(ServerMsg::GameOver {
                match_id,
                winner_id: winner.player_id,
                winner_name: winner.display_name,
            });
        }
    }

    /// A participant dropped: end the match without a winner
    fn handle_disconnect(&mut self, index: usize) {
        let match_id = self.state.id();
        if !self.state.abandon() {
            return;
        }

        self.finish();
        info!(
            match_id = %match_id,
            player_id = %self.state.player(index).player_id,
            "Match abandoned after disconnect"
        );
        self.outbound[1 - index].send(ServerMsg::OpponentLeft { match_id });
    }

    /// Take the match out of the registry. Runs before the terminal event
    /// goes out so clients never observe a finished match as live.
    fn finish(&mut self) {
        self.publish_phase();
        self.registry.remove(&self.state.id());
    }

    fn publish_phase(&self) {
        self.phase.store(self.state.phase() as u8, Ordering::Relaxed);
    }

    fn broadcast(&self, msg: ServerMsg) {
        for handle in &self.outbound {
            handle.send(msg.clone());
        }
    }
}
