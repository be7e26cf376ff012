//! Naval duel server - authoritative two-player naval battle sessions
//!
//! - Matchmaking: first come, first paired
//! - Server-side fleet placement validation
//! - Turn-based attack resolution, one serial actor per match
//! - WebSocket transport with a JSON protocol

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod matchmaking;
pub mod session;
pub mod util;
pub mod ws;
