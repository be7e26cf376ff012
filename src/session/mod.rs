//! Session coordination - the registry of connections, the waiting queue
//! and the active matches

pub mod connection;
pub mod coordinator;

pub use connection::PlayerHandle;
pub use coordinator::{SessionCoordinator, SessionError};
