//! Unified error interface for the ward workspace.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that
//! retry logic, logging, and operators all see the same contract:
//!
//! - **Machine-readable codes**: stable UPPER_SNAKE_CASE identifiers
//! - **Recoverability info**: whether a retry can possibly succeed
//!
//! # Example
//!
//! ```
//! use ward_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum StoreError {
//!     Transient(String),
//!     Exhausted,
//! }
//!
//! impl ErrorCode for StoreError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Transient(_) => "RELATION_TRANSIENT",
//!             Self::Exhausted => "RELATION_RETRY_EXHAUSTED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Transient(_))
//!     }
//! }
//!
//! assert!(StoreError::Transient("reset".into()).is_recoverable());
//! assert!(!StoreError::Exhausted.is_recoverable());
//! ```

/// Unified error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"ACCESS_UNAUTHORIZED"`
/// - **Domain-prefixed**: `"RELATION_"`, `"ACCESS_"`, `"COORD_"`,
///   `"SNAPSHOT_"`
/// - **Stable**: changing a code is a breaking change
///
/// # Recoverability
///
/// An error is recoverable when retrying the operation may succeed —
/// transient backend conditions, timeouts. It is not recoverable when
/// a retry cannot change the outcome: unknown document ids, denied
/// access, exhausted retry budgets.
pub trait ErrorCode {
    /// Returns the machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether a retry of the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows workspace conventions.
///
/// # Checks
///
/// 1. Code is non-empty
/// 2. Code starts with the expected domain prefix
/// 3. Code is UPPER_SNAKE_CASE (ASCII uppercase, digits, underscores)
///
/// # Panics
///
/// Panics with a descriptive message if validation fails. Intended for
/// use in tests.
pub fn assert_error_code(err: &dyn ErrorCode, prefix: &str) {
    let code = err.code();
    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(prefix),
        "error code {code:?} must start with prefix {prefix:?}"
    );
    assert!(
        code.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
        "error code {code:?} must be UPPER_SNAKE_CASE"
    );
}

/// Validates a slice of error variants against [`assert_error_code`]
/// and checks that codes are unique across variants.
///
/// # Panics
///
/// Panics if any variant fails validation or two variants share a code.
pub fn assert_error_codes<E: ErrorCode>(variants: &[E], prefix: &str) {
    let mut seen = std::collections::HashSet::new();
    for err in variants {
        assert_error_code(err, prefix);
        assert!(
            seen.insert(err.code()),
            "duplicate error code: {}",
            err.code()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum Sample {
        Good,
        AlsoGood,
    }

    impl ErrorCode for Sample {
        fn code(&self) -> &'static str {
            match self {
                Self::Good => "TEST_GOOD",
                Self::AlsoGood => "TEST_ALSO_GOOD",
            }
        }

        fn is_recoverable(&self) -> bool {
            false
        }
    }

    #[test]
    fn valid_codes_pass() {
        assert_error_codes(&[Sample::Good, Sample::AlsoGood], "TEST_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&Sample::Good, "OTHER_");
    }

    #[test]
    #[should_panic(expected = "duplicate error code")]
    fn duplicate_codes_panic() {
        assert_error_codes(&[Sample::Good, Sample::Good], "TEST_");
    }
}
