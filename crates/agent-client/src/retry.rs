use std::time::Duration;

/// Jitter-free bounded exponential backoff policy for stream reconnects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Reconnect attempts allowed per turn before giving up.
    pub max_attempts: u32,
    /// Delay before the first reconnect; doubles on every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit bounds.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Disables reconnection: the first fault is terminal.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay scheduled before reconnect number `attempt` (zero-based).
    ///
    /// Growth is uncapped within the attempt budget; callers wanting a
    /// ceiling should lower `max_attempts` or `base_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether another reconnect may be scheduled after `attempt` spent
    /// attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Connectivity of the active turn, published on every transition.
///
/// Advisory only: consumers may ignore it and it never gates the event
/// path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport session yet.
    Idle,
    /// A transport session is being opened.
    Connecting,
    /// The endpoint accepted the request; events are flowing.
    Connected,
    /// The session faulted; a reconnect is scheduled.
    Reconnecting,
    /// The turn ended gracefully.
    Disconnected,
    /// The retry budget is exhausted; the turn is over.
    Failed,
}
