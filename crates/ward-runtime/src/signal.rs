//! Signal types for the coordinator.
//!
//! Signals are the only inbound interface of the coordinator. The
//! durable execution host delivers them at-least-once and in order per
//! actor instance; every handler below is safe under duplicate delivery
//! because all tuple mutations are idempotent.
//!
//! # Signal Flow
//!
//! ```text
//! ┌──────────────┐  Signal (mpsc)  ┌──────────────────┐
//! │   External   │ ──────────────► │   Coordinator    │ ──► AccessChecker
//! │    caller    │                 │   (main loop)    │ ──► TempGrantManager
//! └──────────────┘                 └──────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A set of operator intents over one (user, document) subject.
///
/// Multiple intents may be set on a single action; each one set is
/// honored independently. Absent intents are no-ops. Delivering the
/// same action twice converges to the same end state.
///
/// # Intents
///
/// | Intent | Effect |
/// |--------|--------|
/// | `check_approval` | Report the pending approval state for the subject |
/// | `temp_elevated` | Spawn a time-boxed viewer grant (grant → wait → revoke) |
/// | `add_permission` | Add a durable viewer tuple |
/// | `remove_permission` | Remove the viewer tuple |
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ward_runtime::Action;
///
/// let action = Action::temp_elevated("mleow", "secret/secretz.doc")
///     .with_ttl(Duration::from_secs(120));
/// assert!(action.temp_elevated);
/// assert!(!action.add_permission);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Acting user.
    pub user: String,
    /// Target document id.
    pub document: String,
    /// Report whether the subject has a pending approval request.
    pub check_approval: bool,
    /// Spawn a temporary viewer grant for the subject.
    pub temp_elevated: bool,
    /// Add a durable viewer tuple for the subject.
    pub add_permission: bool,
    /// Remove the viewer tuple for the subject.
    pub remove_permission: bool,
    /// TTL override for `temp_elevated`; the configured default applies
    /// when absent.
    pub ttl: Option<Duration>,
}

impl Action {
    /// Creates an action with no intents set.
    #[must_use]
    pub fn subject(user: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            document: document.into(),
            check_approval: false,
            temp_elevated: false,
            add_permission: false,
            remove_permission: false,
            ttl: None,
        }
    }

    /// Creates an action requesting a temporary viewer grant.
    #[must_use]
    pub fn temp_elevated(user: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            temp_elevated: true,
            ..Self::subject(user, document)
        }
    }

    /// Creates an action adding a durable viewer tuple.
    #[must_use]
    pub fn add_permission(user: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            add_permission: true,
            ..Self::subject(user, document)
        }
    }

    /// Creates an action removing the viewer tuple.
    #[must_use]
    pub fn remove_permission(user: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            remove_permission: true,
            ..Self::subject(user, document)
        }
    }

    /// Creates an action asking for the pending approval state.
    #[must_use]
    pub fn check_approval(user: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            check_approval: true,
            ..Self::subject(user, document)
        }
    }

    /// Sets a TTL override for `temp_elevated`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns `true` when no intent is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.check_approval || self.temp_elevated || self.add_permission || self.remove_permission)
    }
}

/// An inbound signal.
///
/// # Ordering
///
/// Signals are processed strictly in arrival order. A terminate signal
/// never cancels or reorders already-queued action signals — it only
/// stops acceptance of new work after the drain window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Dispatch the carried intents.
    Action(Action),

    /// Begin graceful termination.
    ///
    /// The boolean payload exists only for compatibility with callers
    /// that send one; its value is ignored.
    Terminate {
        /// Compatibility payload, ignored.
        force: bool,
    },
}

impl Signal {
    /// Creates the terminate signal.
    #[must_use]
    pub fn terminate() -> Self {
        Self::Terminate { force: false }
    }
}
