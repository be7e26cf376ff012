//! Session coordinator - connections, matchmaking and routing into matches

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{GameMatch, MatchCommand, MatchPlayer, MatchRegistry, MatchSummary};
use crate::matchmaking::{MatchmakingQueue, Pairing, QueueError, WaitingPlayer};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::connection::PlayerHandle;

/// Routing-level failures, answered to the sender as `error` messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("unknown connection")]
    UnknownPlayer,

    #[error("match {0} does not exist or has already ended")]
    UnknownMatch(Uuid),

    #[error("not a participant of match {0}")]
    NotInMatch(Uuid),

    #[error("already waiting for an opponent")]
    AlreadyQueued,

    #[error("already playing a match")]
    AlreadyInMatch,

    #[error("match {0} is no longer accepting commands")]
    MatchUnavailable(Uuid),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::UnknownPlayer => "unknown_player",
            SessionError::UnknownMatch(_) => "unknown_match",
            SessionError::NotInMatch(_) => "not_in_match",
            SessionError::AlreadyQueued => "already_queued",
            SessionError::AlreadyInMatch => "already_in_match",
            SessionError::MatchUnavailable(_) => "match_unavailable",
        }
    }
}

impl From<QueueError> for SessionError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::AlreadyQueued => SessionError::AlreadyQueued,
        }
    }
}

/// Process-wide session state
pub struct SessionCoordinator {
    queue: Mutex<MatchmakingQueue>,
    registry: Arc<MatchRegistry>,
    /// Outbound handles of every open connection
    connections: DashMap<Uuid, PlayerHandle>,
    command_buffer: usize,
}

impl SessionCoordinator {
    pub fn new(registry: Arc<MatchRegistry>, command_buffer: usize) -> Self {
        Self {
            queue: Mutex::new(MatchmakingQueue::new()),
            registry,
            connections: DashMap::new(),
            command_buffer,
        }
    }

    /// Register a new connection. The receiver yields everything the
    /// server sends to this player, starting with `welcome`.
    pub fn connect(&self) -> (Uuid, mpsc::UnboundedReceiver<ServerMsg>) {
        let player_id = Uuid::new_v4();
        let (handle, rx) = PlayerHandle::new(player_id);

        handle.send(ServerMsg::Welcome {
            player_id,
            server_time: unix_millis(),
        });
        self.connections.insert(player_id, handle);

        info!(player_id = %player_id, "Player connected");
        (player_id, rx)
    }

    /// Route one inbound message. Failures are reported to the sender and
    /// never affect other players.
    pub async fn handle_message(&self, player_id: Uuid, msg: ClientMsg) {
        let result = match msg {
            ClientMsg::Ready { name } => self.ready(player_id, name.as_deref()),
            ClientMsg::PlaceShips { match_id, ships } => {
                self.route(match_id, MatchCommand::PlaceShips { player_id, ships }, player_id)
                    .await
            }
            ClientMsg::Attack { match_id, position } => {
                self.route(match_id, MatchCommand::Attack { player_id, position }, player_id)
                    .await
            }
            ClientMsg::Ping { t } => {
                self.send_to(&player_id, ServerMsg::Pong { t });
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!(player_id = %player_id, error = %err, "Rejected client message");
            self.send_to(&player_id, ServerMsg::error(err.code(), err.to_string()));
        }
    }

    /// Clean up after a dropped connection
    pub async fn disconnect(&self, player_id: Uuid) {
        // Leave the queue first so pairing never picks a closed connection
        let was_queued = self.queue.lock().remove(&player_id).is_some();

        if let Some(handle) = self.registry.match_for(&player_id) {
            let command = MatchCommand::Disconnect { player_id };
            if handle.command_tx.send(command).await.is_err() {
                debug!(player_id = %player_id, match_id = %handle.id, "Match already stopped");
            }
        }

        self.connections.remove(&player_id);
        info!(player_id = %player_id, was_queued, "Player disconnected");
    }

    /// Join matchmaking, pairing with the longest-waiting player if any
    fn ready(&self, player_id: Uuid, name: Option<&str>) -> Result<(), SessionError> {
        let arriving_handle = self.handle(&player_id).ok_or(SessionError::UnknownPlayer)?;

        // Pairing and registration happen under this lock, so a player is
        // always either queued, registered in a match, or neither.
        let mut queue = self.queue.lock();
        if self.registry.contains_player(&player_id) {
            return Err(SessionError::AlreadyInMatch);
        }

        let mut arriving = WaitingPlayer::new(player_id, name);
        loop {
            match queue.enqueue_or_pair(arriving)? {
                Pairing::Waiting => {
                    info!(player_id = %player_id, queue_size = queue.len(), "Player waiting for opponent");
                    arriving_handle.send(ServerMsg::Waiting);
                    return Ok(());
                }
                Pairing::Paired {
                    waiting,
                    arriving: player,
                } => match self.handle(&waiting.player_id) {
                    Some(waiting_handle) => {
                        self.start_match(waiting, waiting_handle, player, arriving_handle);
                        return Ok(());
                    }
                    None => {
                        warn!(player_id = %waiting.player_id, "Dropped stale queue entry");
                        arriving = player;
                    }
                },
            }
        }
    }

    /// Create and spawn a match. The longest-waiting player is index 0.
    fn start_match(
        &self,
        first: WaitingPlayer,
        first_handle: PlayerHandle,
        second: WaitingPlayer,
        second_handle: PlayerHandle,
    ) {
        let match_id = Uuid::new_v4();
        let players = [
            MatchPlayer::new(first.player_id, first.display_name.clone()),
            MatchPlayer::new(second.player_id, second.display_name.clone()),
        ];

        let (game_match, handle) = GameMatch::new(
            match_id,
            players,
            [first_handle.clone(), second_handle.clone()],
            self.registry.clone(),
            self.command_buffer,
        );

        self.registry.insert(handle);
        tokio::spawn(game_match.run());

        first_handle.send(ServerMsg::Matched {
            match_id,
            opponent_name: second.display_name.clone(),
            player_id: first.player_id,
            is_first_player: true,
        });
        second_handle.send(ServerMsg::Matched {
            match_id,
            opponent_name: first.display_name.clone(),
            player_id: second.player_id,
            is_first_player: false,
        });

        info!(
            match_id = %match_id,
            first = %first.display_name,
            second = %second.display_name,
            waited_ms = first.wait_time().as_millis() as u64,
            "Created new match"
        );
    }

    /// Forward a command to the match the sender plays in
    async fn route(
        &self,
        match_id: Uuid,
        command: MatchCommand,
        player_id: Uuid,
    ) -> Result<(), SessionError> {
        let handle = self
            .registry
            .get(&match_id)
            .ok_or(SessionError::UnknownMatch(match_id))?;

        if !handle.has_player(&player_id) {
            return Err(SessionError::NotInMatch(match_id));
        }

        handle
            .command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::MatchUnavailable(match_id))
    }

    fn handle(&self, player_id: &Uuid) -> Option<PlayerHandle> {
        self.connections.get(player_id).map(|h| h.value().clone())
    }

    fn send_to(&self, player_id: &Uuid, msg: ServerMsg) {
        match self.connections.get(player_id) {
            Some(handle) => handle.send(msg),
            None => debug!(player_id = %player_id, "No connection for outbound message"),
        }
    }

    /// Get current queue size
    pub fn queue_size(&self) -> usize {
        self.queue.lock().len()
    }

    /// Check if player is in queue
    pub fn is_in_queue(&self, player_id: &Uuid) -> bool {
        self.queue.lock().contains(player_id)
    }

    pub fn connected_players(&self) -> usize {
        self.connections.len()
    }

    pub fn active_matches(&self) -> usize {
        self.registry.active_matches()
    }

    /// Get player's current match ID
    pub fn player_match(&self, player_id: &Uuid) -> Option<Uuid> {
        self.registry.match_for(player_id).map(|h| h.id)
    }

    pub fn match_summaries(&self) -> Vec<MatchSummary> {
        self.registry.summaries()
    }
}
