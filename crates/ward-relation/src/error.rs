//! Relation-store errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`StoreError::Transient`] | `RELATION_TRANSIENT` | Yes |
//! | [`StoreError::Conflict`] | `RELATION_CONFLICT` | No |
//! | [`StoreError::Exhausted`] | `RELATION_RETRY_EXHAUSTED` | No |
//!
//! # Taxonomy
//!
//! - `Transient` — network/backend hiccup; the retry policy will try
//!   again with backoff.
//! - `Conflict` — the store already holds the desired state (duplicate
//!   add, missing delete). Callers normalize this to success with
//!   [`normalize_conflict`](crate::normalize_conflict); it must never
//!   escape the client boundary.
//! - `Exhausted` — the bounded retry budget is spent. The failed
//!   mutation is logged with full tuple context for manual
//!   reconciliation.

use crate::tuple::RelationTuple;
use thiserror::Error;
use ward_types::ErrorCode;

/// Relation-store operation error.
///
/// # Example
///
/// ```
/// use ward_relation::StoreError;
/// use ward_types::ErrorCode;
///
/// let err = StoreError::transient("add_tuple", "connection reset");
/// assert_eq!(err.code(), "RELATION_TRANSIENT");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend hiccup; the operation may succeed on retry.
    #[error("transient store error during {operation}: {reason}")]
    Transient {
        /// Store operation that failed, e.g. `"add_tuple"`.
        operation: &'static str,
        /// Backend-supplied reason.
        reason: String,
    },

    /// The store already holds the desired state.
    ///
    /// Raised by backends that report duplicate adds or missing
    /// deletes; normalized to success before it reaches the runtime.
    #[error("tuple already in desired state: {tuple}")]
    Conflict {
        /// The tuple whose write conflicted.
        tuple: RelationTuple,
    },

    /// Bounded retries were spent without success.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Store operation that failed.
        operation: &'static str,
        /// Number of attempts made.
        attempts: u32,
        /// Message of the final error.
        last: String,
    },
}

impl StoreError {
    /// Creates a [`StoreError::Transient`].
    #[must_use]
    pub fn transient(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Transient {
            operation,
            reason: reason.into(),
        }
    }

    /// Creates a [`StoreError::Conflict`].
    #[must_use]
    pub fn conflict(tuple: RelationTuple) -> Self {
        Self::Conflict { tuple }
    }

    /// Returns `true` for the conflict variant.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transient { .. } => "RELATION_TRANSIENT",
            Self::Conflict { .. } => "RELATION_CONFLICT",
            Self::Exhausted { .. } => "RELATION_RETRY_EXHAUSTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Conflict is not retried: the desired state already holds.
        matches!(self, Self::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_types::assert_error_codes;

    fn all_variants() -> Vec<StoreError> {
        vec![
            StoreError::transient("add_tuple", "reset"),
            StoreError::conflict(RelationTuple::viewer("bob", "doc")),
            StoreError::Exhausted {
                operation: "remove_tuple",
                attempts: 5,
                last: "reset".into(),
            },
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "RELATION_");
    }

    #[test]
    fn only_transient_is_recoverable() {
        for err in all_variants() {
            assert_eq!(
                err.is_recoverable(),
                matches!(err, StoreError::Transient { .. }),
                "unexpected recoverability for {err:?}"
            );
        }
    }
}
