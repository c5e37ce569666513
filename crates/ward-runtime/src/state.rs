//! Coordinator state and persistence.
//!
//! The durable-execution engine this runtime stands in for would replay
//! an actor from its event history; here the equivalent is an explicit
//! persisted snapshot: `{state, org state, outstanding grants}` saved on
//! every transition and every change to the outstanding-grant set. A
//! process restart resumes from the snapshot — mid-drain or mid-grant —
//! without double-granting, because each grant carries a deterministic
//! idempotency id and its remaining TTL is recomputed from wall-clock
//! timestamps.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`SnapshotError::NotFound`] | `SNAPSHOT_NOT_FOUND` | No |
//! | [`SnapshotError::Storage`] | `SNAPSHOT_STORAGE` | Yes |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use ward_types::{ApprovalId, Document, ErrorCode, GrantId, OrgId};

/// Lifecycle state of a coordinator.
///
/// ```text
/// Running ──terminate──► Draining ──settle + grant join──► Terminated
/// ```
///
/// Draining still processes queued action signals; only `Terminated`
/// stops dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Accepting and dispatching signals.
    Running,
    /// Terminate received; settling, flushing queued signals, and
    /// waiting for outstanding grant tasks.
    Draining,
    /// All dispatch finished; the actor is done.
    Terminated,
}

impl std::fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// The state owned by one coordinator for one organization.
///
/// Owned exclusively by a single coordinator instance; never shared
/// across organizations. Documents and users are immutable after
/// seeding; only `pending_approvals` changes at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgState {
    /// Organization this state belongs to.
    pub org: OrgId,
    /// Known users.
    pub users: BTreeSet<String>,
    /// Documents, sorted by id.
    pub docs: Vec<Document>,
    /// Outstanding approval requests.
    pub pending_approvals: BTreeSet<ApprovalId>,
}

impl OrgState {
    /// Creates org state from seeded users and documents.
    #[must_use]
    pub fn new(org: OrgId, users: BTreeSet<String>, docs: Vec<Document>) -> Self {
        Self {
            org,
            users,
            docs,
            pending_approvals: BTreeSet::new(),
        }
    }
}

/// Persisted description of one temporary-grant task.
///
/// A `GrantSpec` exists only while its background task is alive (or
/// orphaned by a drain timeout, so a resumed actor can still finish the
/// revoke). The id is the deterministic idempotency key over
/// (user, document, issued-at).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSpec {
    /// Idempotency id of the grant task.
    pub id: GrantId,
    /// User receiving temporary access.
    pub user: String,
    /// Document being opened up.
    pub document: String,
    /// When the grant was issued.
    pub issued_at: DateTime<Utc>,
    /// Requested lifetime.
    pub ttl: Duration,
}

impl GrantSpec {
    /// Issues a new grant spec stamped with the current time.
    #[must_use]
    pub fn issue(user: impl Into<String>, document: impl Into<String>, ttl: Duration) -> Self {
        let user = user.into();
        let document = document.into();
        let issued_at = Utc::now();
        Self {
            id: GrantId::idempotency(&user, &document, issued_at.timestamp_millis()),
            user,
            document,
            issued_at,
            ttl,
        }
    }

    /// Returns the TTL left at `now`.
    ///
    /// Zero means the wait already elapsed: a resumed task goes
    /// straight to the revoke, never re-waits or re-grants.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = now
            .signed_duration_since(self.issued_at)
            .to_std()
            .unwrap_or_default();
        self.ttl.saturating_sub(elapsed)
    }
}

/// One persisted coordinator snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Lifecycle state at save time.
    pub state: CoordinatorState,
    /// Org state at save time.
    pub org: OrgState,
    /// Grant tasks that had not finished at save time.
    pub outstanding_grants: Vec<GrantSpec>,
}

/// Snapshot persistence error.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// No snapshot stored for the organization.
    #[error("no snapshot stored for {org}")]
    NotFound {
        /// Organization looked up.
        org: OrgId,
    },

    /// Backend failure while reading or writing.
    #[error("snapshot storage error: {reason}")]
    Storage {
        /// Backend-supplied reason.
        reason: String,
    },
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "SNAPSHOT_NOT_FOUND",
            Self::Storage { .. } => "SNAPSHOT_STORAGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

/// Snapshot storage abstraction.
///
/// Implementations must be thread-safe (`Send + Sync`). Saving is
/// best-effort from the coordinator's point of view: a failed save is
/// logged, never allowed to wedge the actor.
pub trait SnapshotStore: Send + Sync {
    /// Saves a snapshot, overwriting any previous one for the same org.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Storage`] on backend failure.
    fn save(
        &self,
        snapshot: &StateSnapshot,
    ) -> impl Future<Output = Result<(), SnapshotError>> + Send;

    /// Loads the latest snapshot for an organization.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`] when nothing was saved.
    fn load(&self, org: &OrgId)
        -> impl Future<Output = Result<StateSnapshot, SnapshotError>> + Send;
}

impl<T: SnapshotStore> SnapshotStore for Arc<T> {
    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), SnapshotError> {
        T::save(self, snapshot).await
    }

    async fn load(&self, org: &OrgId) -> Result<StateSnapshot, SnapshotError> {
        T::load(self, org).await
    }
}

/// In-memory snapshot store, one slot per organization.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slots: RwLock<HashMap<OrgId, StateSnapshot>>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), SnapshotError> {
        let mut slots = self.slots.write().map_err(|_| SnapshotError::Storage {
            reason: "snapshot slot lock poisoned".into(),
        })?;
        slots.insert(snapshot.org.org.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, org: &OrgId) -> Result<StateSnapshot, SnapshotError> {
        let slots = self.slots.read().map_err(|_| SnapshotError::Storage {
            reason: "snapshot slot lock poisoned".into(),
        })?;
        slots.get(org).cloned().ok_or_else(|| SnapshotError::NotFound {
            org: org.clone(),
        })
    }
}
