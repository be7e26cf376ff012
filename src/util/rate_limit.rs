//! Inbound message throttling for a single connection

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket over a connection's client messages. Messages over the
/// quota are dropped and counted.
pub struct MessageLimiter {
    limiter: DirectLimiter,
    dropped: u64,
}

impl MessageLimiter {
    /// A zero rate is treated as one message per second
    pub fn per_second(messages: u32) -> Self {
        let rate = NonZeroU32::new(messages).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            dropped: 0,
        }
    }

    /// Whether the next message may be processed
    pub fn admit(&mut self) -> bool {
        let allowed = self.limiter.check().is_ok();
        if !allowed {
            self.dropped += 1;
        }
        allowed
    }

    /// Messages refused so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
