// src/retry.rs

//! Reconnect retry policies.
//!
//! A [`RetryPolicy`] is a pure decision function consulted by the channel's
//! recovery loop: given the number of reconnect attempts already made, it
//! either yields the delay to wait before the next attempt or gives up.
//! The policy performs no I/O and holds no per-episode state; the channel
//! owns the attempt counter and resets it on every successful reconnect.

use std::time::Duration;

/// Decision strategy for the bounded recovery loop.
///
/// Implementations must be pure with respect to the attempt index: calling
/// `next_delay` twice with the same argument yields the same answer.
pub trait RetryPolicy: Send + Sync {
    /// Delay to wait before reconnect attempt `attempt` (zero-based count of
    /// attempts already made), or `None` to give up.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Uniform (non-exponential) backoff with a fixed attempt cap.
///
/// This is the baseline policy: up to `max_attempts` reconnect attempts,
/// each preceded by the same `delay`.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    max_attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    /// Create a policy with an explicit cap and inter-attempt delay.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for FixedDelay {
    /// Baseline configuration: 3 attempts, 1 second apart.
    fn default() -> Self {
        // ---
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        // ---
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

/// Policy that never retries: the first transmit failure is terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl RetryPolicy for NoReconnect {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}
