//! Outbound handle for a connected player

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Sending half of a player's outbound queue. Delivery is fire-and-forget:
/// a closed connection never fails the sender.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub player_id: Uuid,
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl PlayerHandle {
    pub fn new(player_id: Uuid) -> (Self, mpsc::UnboundedReceiver<ServerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { player_id, tx }, rx)
    }

    pub fn send(&self, msg: ServerMsg) {
        if self.tx.send(msg).is_err() {
            debug!(player_id = %self.player_id, "Outbound channel closed, dropping message");
        }
    }
}
