//! # Bus Configuration
//!
//! One `BusConfig` value is built per process and handed to both the
//! `Connecter` and the `Subscriber`; there is no package-level state.

use std::time::Duration;

/// Default bound on one request/reply call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default subscription age before the forced reconnect.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Default interval between presence polls.
pub const DEFAULT_PRESENCE_POLL: Duration = Duration::from_millis(50);

/// Tunables shared by both sides of the bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// How long one RPC call may wait for its reply.
    pub call_timeout: Duration,
    /// How long a subscription lives before its forced reconnect fires.
    pub max_age: Duration,
    /// How often `await_presence` re-pings.
    pub presence_poll: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_age: DEFAULT_MAX_AGE,
            presence_poll: DEFAULT_PRESENCE_POLL,
        }
    }
}

impl BusConfig {
    /// The production defaults: 10s calls, 2h sessions, 50ms presence polls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Override the forced-reconnect age.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Override the presence poll interval.
    #[must_use]
    pub fn with_presence_poll(mut self, interval: Duration) -> Self {
        self.presence_poll = interval;
        self
    }
}
