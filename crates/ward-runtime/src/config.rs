//! Coordinator configuration.
//!
//! The defaults carry the operational contract: a 30 second grant TTL,
//! a 1 second settle delay on terminate, and a 1 minute bound on the
//! drain wait. Tests shrink all three to keep wall-clock time down.

use std::time::Duration;
use ward_relation::RetryPolicy;

/// Behavioral configuration for one coordinator instance.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ward_runtime::CoordinatorConfig;
///
/// let config = CoordinatorConfig::default()
///     .with_grant_ttl(Duration::from_secs(120));
/// assert_eq!(config.grant_ttl, Duration::from_secs(120));
/// assert_eq!(config.settle_delay, Duration::from_secs(1));
/// assert_eq!(config.drain_timeout, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Default lifetime of a temporary grant.
    pub grant_ttl: Duration,
    /// Pause after a terminate signal so in-flight work can surface.
    pub settle_delay: Duration,
    /// Upper bound on waiting for outstanding grant tasks at shutdown.
    ///
    /// Exceeding it is a reported failure
    /// ([`CoordinatorError::DrainTimeout`](crate::CoordinatorError)),
    /// never a silent success.
    pub drain_timeout: Duration,
    /// Retry policy applied to every store mutation.
    pub retry: RetryPolicy,
    /// Capacity of the inbound signal channel.
    pub signal_buffer: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            grant_ttl: Duration::from_secs(30),
            settle_delay: Duration::from_secs(1),
            drain_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            signal_buffer: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Sets the default grant TTL.
    #[must_use]
    pub fn with_grant_ttl(mut self, ttl: Duration) -> Self {
        self.grant_ttl = ttl;
        self
    }

    /// Sets the settle delay applied on terminate.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the bounded drain wait.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Sets the store retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the signal channel capacity.
    #[must_use]
    pub fn with_signal_buffer(mut self, buffer: usize) -> Self {
        self.signal_buffer = buffer.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_contract() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.grant_ttl, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_secs(1));
        assert_eq!(config.drain_timeout, Duration::from_secs(60));
    }

    #[test]
    fn builders_override_fields() {
        let config = CoordinatorConfig::default()
            .with_grant_ttl(Duration::from_millis(50))
            .with_settle_delay(Duration::from_millis(5))
            .with_drain_timeout(Duration::from_millis(200))
            .with_signal_buffer(8);
        assert_eq!(config.grant_ttl, Duration::from_millis(50));
        assert_eq!(config.settle_delay, Duration::from_millis(5));
        assert_eq!(config.drain_timeout, Duration::from_millis(200));
        assert_eq!(config.signal_buffer, 8);
    }

    #[test]
    fn signal_buffer_floor_is_one() {
        assert_eq!(
            CoordinatorConfig::default().with_signal_buffer(0).signal_buffer,
            1
        );
    }
}
