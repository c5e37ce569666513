//! Coordinator-level errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`CoordinatorError::DrainTimeout`] | `COORD_DRAIN_TIMEOUT` | No |
//! | [`CoordinatorError::SignalChannelClosed`] | `COORD_SIGNAL_CHANNEL_CLOSED` | No |
//!
//! Background grant-task failures never surface here — they are logged
//! inside the task and reported as completion events. The only
//! escalation is the bounded drain wait expiring: the actor still
//! terminates, but the condition must be observable to operators.

use std::time::Duration;
use thiserror::Error;
use ward_types::{ErrorCode, GrantId};

/// Coordinator failure.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ward_runtime::CoordinatorError;
/// use ward_types::ErrorCode;
///
/// let err = CoordinatorError::DrainTimeout {
///     outstanding: vec![],
///     timeout: Duration::from_secs(60),
/// };
/// assert_eq!(err.code(), "COORD_DRAIN_TIMEOUT");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum CoordinatorError {
    /// Outstanding grant tasks did not finish inside the bounded wait.
    ///
    /// The actor terminated anyway; the listed grants kept their
    /// detached tasks and stayed in the final snapshot so a resumed
    /// actor can finish their revokes.
    #[error("drain timed out after {timeout:?} with {} grant task(s) outstanding", outstanding.len())]
    DrainTimeout {
        /// Grants that missed the deadline.
        outstanding: Vec<GrantId>,
        /// The bounded wait that expired.
        timeout: Duration,
    },

    /// The signal channel is closed; the coordinator is gone.
    #[error("coordinator signal channel closed")]
    SignalChannelClosed,
}

impl ErrorCode for CoordinatorError {
    fn code(&self) -> &'static str {
        match self {
            Self::DrainTimeout { .. } => "COORD_DRAIN_TIMEOUT",
            Self::SignalChannelClosed => "COORD_SIGNAL_CHANNEL_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(
            &[
                CoordinatorError::DrainTimeout {
                    outstanding: vec![GrantId::new()],
                    timeout: Duration::from_secs(60),
                },
                CoordinatorError::SignalChannelClosed,
            ],
            "COORD_",
        );
    }

    #[test]
    fn drain_timeout_display_counts_grants() {
        let err = CoordinatorError::DrainTimeout {
            outstanding: vec![GrantId::new(), GrantId::new()],
            timeout: Duration::from_secs(60),
        };
        assert!(err.to_string().contains("2 grant task(s)"));
    }
}
