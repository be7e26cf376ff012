//! Matchmaking queue implementation

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Longest display name kept from a `ready` message
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

/// Player in the matchmaking queue
#[derive(Debug, Clone)]
pub struct WaitingPlayer {
    pub player_id: Uuid,
    pub display_name: String,
    pub queued_at: Instant,
}

impl WaitingPlayer {
    pub fn new(player_id: Uuid, requested_name: Option<&str>) -> Self {
        Self {
            player_id,
            display_name: display_name(player_id, requested_name),
            queued_at: Instant::now(),
        }
    }

    /// How long this player has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// Trimmed, length-capped name, or a default derived from the player id
pub fn display_name(player_id: Uuid, requested: Option<&str>) -> String {
    let name: String = requested
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(MAX_DISPLAY_NAME_CHARS)
        .collect();

    if name.is_empty() {
        format!("Player_{}", &player_id.simple().to_string()[..8])
    } else {
        name
    }
}

/// Result of a `ready` request
#[derive(Debug)]
pub enum Pairing {
    /// Queue was empty, the player now waits at its tail
    Waiting,
    /// The head of the queue was popped; it becomes player 0
    Paired {
        waiting: WaitingPlayer,
        arriving: WaitingPlayer,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("player is already waiting for an opponent")]
    AlreadyQueued,
}

/// FIFO queue of players waiting for an opponent
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    queue: VecDeque<WaitingPlayer>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair with the longest-waiting player, or start waiting
    pub fn enqueue_or_pair(&mut self, player: WaitingPlayer) -> Result<Pairing, QueueError> {
        if self.contains(&player.player_id) {
            return Err(QueueError::AlreadyQueued);
        }

        match self.queue.pop_front() {
            Some(waiting) => Ok(Pairing::Paired {
                waiting,
                arriving: player,
            }),
            None => {
                self.queue.push_back(player);
                Ok(Pairing::Waiting)
            }
        }
    }

    /// Remove a player from the queue
    pub fn remove(&mut self, player_id: &Uuid) -> Option<WaitingPlayer> {
        let pos = self.queue.iter().position(|p| &p.player_id == player_id)?;
        self.queue.remove(pos)
    }

    /// Check if a player is in the queue
    pub fn contains(&self, player_id: &Uuid) -> bool {
        self.queue.iter().any(|p| &p.player_id == player_id)
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> WaitingPlayer {
        WaitingPlayer::new(Uuid::new_v4(), None)
    }

    #[test]
    fn first_player_waits_second_is_paired() {
        let mut queue = MatchmakingQueue::new();
        let a = player();
        let b = player();

        assert!(matches!(queue.enqueue_or_pair(a.clone()), Ok(Pairing::Waiting)));
        assert_eq!(queue.len(), 1);

        match queue.enqueue_or_pair(b.clone()).unwrap() {
            Pairing::Paired { waiting, arriving } => {
                assert_eq!(waiting.player_id, a.player_id);
                assert_eq!(arriving.player_id, b.player_id);
            }
            Pairing::Waiting => panic!("second player should be paired"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn pairs_in_arrival_order() {
        let mut queue = MatchmakingQueue::new();
        let a = player();
        queue.enqueue_or_pair(a.clone()).unwrap();
        // a stale duplicate cannot jump the line
        assert_eq!(queue.enqueue_or_pair(a.clone()).unwrap_err(), QueueError::AlreadyQueued);
        assert_eq!(queue.len(), 1);

        let Pairing::Paired { waiting, .. } = queue.enqueue_or_pair(player()).unwrap() else {
            panic!("expected a pairing");
        };
        assert_eq!(waiting.player_id, a.player_id);
    }

    #[test]
    fn removed_player_is_not_paired() {
        let mut queue = MatchmakingQueue::new();
        let a = player();
        queue.enqueue_or_pair(a.clone()).unwrap();
        assert!(queue.remove(&a.player_id).is_some());
        assert!(queue.remove(&a.player_id).is_none());
        assert!(matches!(queue.enqueue_or_pair(player()), Ok(Pairing::Waiting)));
    }

    #[test]
    fn display_names_are_sanitized() {
        let id = Uuid::new_v4();
        assert_eq!(display_name(id, Some("  Ana  ")), "Ana");
        assert!(display_name(id, Some("   ")).starts_with("Player_"));
        assert!(display_name(id, None).starts_with("Player_"));
        let long = "x".repeat(100);
        assert_eq!(display_name(id, Some(&long)).len(), MAX_DISPLAY_NAME_CHARS);
    }
}
