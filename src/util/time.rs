//! Wall-clock and uptime helpers

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

static STARTED: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the Unix epoch, sent to clients in `welcome`
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Mark the moment the server came up. Later calls keep the first value.
pub fn init_server_time() {
    STARTED.get_or_init(Instant::now);
}

/// Time since `init_server_time`, zero if it was never called
pub fn uptime() -> Duration {
    STARTED.get().map(Instant::elapsed).unwrap_or_default()
}
