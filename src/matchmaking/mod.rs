//! Matchmaking - pairs players in arrival order

pub mod queue;

pub use queue::{MatchmakingQueue, Pairing, QueueError, WaitingPlayer};
