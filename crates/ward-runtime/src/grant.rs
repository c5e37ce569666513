//! Temporary grant lifecycle.
//!
//! Each elevation request becomes an independent background task:
//! grant → wait → revoke. Tasks run concurrently with the coordinator's
//! main loop and share only the relation store (an external,
//! independently concurrent resource); they touch no coordinator state.
//!
//! # Tracked Registry
//!
//! Tasks are never fire-and-forget. The manager keys every join handle
//! and [`GrantSpec`] by [`GrantId`] so the drain phase can enumerate
//! and await them deterministically, and so a duplicate spawn of the
//! same logical grant is a no-op.
//!
//! # Failure Semantics
//!
//! Store operations run under the retry policy. A spent budget on the
//! grant side means access was never granted — the task logs and ends.
//! A spent budget on the revoke side is a security-relevant leak: it is
//! logged at `error` with full tuple context for manual reconciliation,
//! and the spec stays in the registry so a resumed actor can finish the
//! revoke. Neither case crashes or blocks the coordinator.

use crate::state::GrantSpec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use ward_relation::{normalize_conflict, Relation, RelationStore, RelationTuple, RetryPolicy};
use ward_types::GrantId;

/// How a grant task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// Granted, waited, revoked — the normal lifecycle.
    Revoked,
    /// The initial grant never succeeded; no access was given.
    GrantFailed,
    /// The revoke failed after retries; access may still be live.
    RevokeFailed,
}

/// Completion report sent by a finished grant task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantEvent {
    /// Grant that finished.
    pub id: GrantId,
    /// How it ended.
    pub outcome: GrantOutcome,
}

/// Spawns and tracks temporary-grant background tasks.
pub struct TempGrantManager<S> {
    store: Arc<S>,
    retry: RetryPolicy,
    events_tx: mpsc::Sender<GrantEvent>,
    tasks: HashMap<GrantId, JoinHandle<()>>,
    specs: HashMap<GrantId, GrantSpec>,
}

impl<S: RelationStore + 'static> TempGrantManager<S> {
    /// Creates a manager and the receiver for completion events.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        retry: RetryPolicy,
        event_buffer: usize,
    ) -> (Self, mpsc::Receiver<GrantEvent>) {
        let (events_tx, events_rx) = mpsc::channel(event_buffer.max(1));
        (
            Self {
                store,
                retry,
                events_tx,
                tasks: HashMap::new(),
                specs: HashMap::new(),
            },
            events_rx,
        )
    }

    /// Spawns the grant task for a spec, waiting its full TTL.
    ///
    /// Returns `false` without spawning when the id is already tracked
    /// — the idempotency guard against duplicate delivery and resume.
    pub fn spawn(&mut self, spec: GrantSpec) -> bool {
        let wait = spec.ttl;
        self.spawn_with_wait(spec, wait)
    }

    /// Spawns the grant task with an explicit wait.
    ///
    /// Used on resume, where the wait is the TTL remaining rather than
    /// the full TTL. A zero wait still runs the task: the grant write is
    /// idempotent and the revoke must happen.
    pub fn spawn_with_wait(&mut self, spec: GrantSpec, wait: Duration) -> bool {
        if self.tasks.contains_key(&spec.id) {
            tracing::debug!(grant = %spec.id, "grant already tracked, spawn ignored");
            return false;
        }
        tracing::info!(
            grant = %spec.id,
            user = %spec.user,
            document = %spec.document,
            wait_ms = wait.as_millis() as u64,
            "grant task spawned"
        );
        let handle = tokio::spawn(run_grant(
            Arc::clone(&self.store),
            self.retry,
            spec.clone(),
            wait,
            self.events_tx.clone(),
        ));
        self.tasks.insert(spec.id, handle);
        self.specs.insert(spec.id, spec);
        true
    }

    /// Returns `true` if the grant is tracked.
    #[must_use]
    pub fn is_tracked(&self, id: GrantId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of tracked grant tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when no grant task is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the specs of all tracked grants, for snapshotting.
    #[must_use]
    pub fn outstanding(&self) -> Vec<GrantSpec> {
        let mut specs: Vec<GrantSpec> = self.specs.values().cloned().collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        specs
    }

    /// Removes a completed grant from the registry.
    ///
    /// Called when the grant's completion event arrives. Returns the
    /// spec, or `None` for an untracked id.
    pub fn reap(&mut self, id: GrantId) -> Option<GrantSpec> {
        self.tasks.remove(&id);
        self.specs.remove(&id)
    }

    /// Awaits every tracked task, bounded by `timeout` overall.
    ///
    /// Tasks that finish are removed. Tasks that miss the deadline are
    /// returned as the error value; their handles are dropped (the
    /// tasks keep running detached — aborting mid-revoke could leak
    /// access) and their specs are retained so the final snapshot lets
    /// a resumed actor finish the revoke.
    pub async fn drain(&mut self, timeout: Duration) -> Result<(), Vec<GrantId>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let ids: Vec<GrantId> = self.tasks.keys().copied().collect();
        let mut missed = Vec::new();

        for id in ids {
            let Some(handle) = self.tasks.remove(&id) else {
                continue;
            };
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(())) => {
                    self.specs.remove(&id);
                }
                Ok(Err(join_err)) => {
                    tracing::error!(grant = %id, error = %join_err, "grant task panicked");
                    self.specs.remove(&id);
                }
                Err(_) => {
                    tracing::warn!(grant = %id, "grant task missed the drain deadline");
                    missed.push(id);
                }
            }
        }

        if missed.is_empty() {
            Ok(())
        } else {
            missed.sort();
            Err(missed)
        }
    }
}

impl<S> std::fmt::Debug for TempGrantManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempGrantManager")
            .field("tracked", &self.tasks.len())
            .finish()
    }
}

/// One grant lifecycle: add viewer tuple, wait, remove viewer tuple.
async fn run_grant<S: RelationStore>(
    store: Arc<S>,
    retry: RetryPolicy,
    spec: GrantSpec,
    wait: Duration,
    events: mpsc::Sender<GrantEvent>,
) {
    let tuple = RelationTuple::viewer(&spec.user, &spec.document);

    let granted = normalize_conflict(retry.run("add_tuple", || store.add_tuple(&tuple)).await);
    if let Err(err) = granted {
        tracing::error!(
            grant = %spec.id,
            user = %spec.user,
            document = %spec.document,
            relation = %Relation::Viewer,
            operation = "add_tuple",
            error = %err,
            "temporary grant abandoned, access was never given"
        );
        report(&events, spec.id, GrantOutcome::GrantFailed).await;
        return;
    }
    tracing::info!(
        grant = %spec.id,
        user = %spec.user,
        document = %spec.document,
        wait_ms = wait.as_millis() as u64,
        "temporary access granted"
    );

    tokio::time::sleep(wait).await;

    let revoked = normalize_conflict(retry.run("remove_tuple", || store.remove_tuple(&tuple)).await);
    match revoked {
        Ok(()) => {
            tracing::info!(
                grant = %spec.id,
                user = %spec.user,
                document = %spec.document,
                "temporary access revoked"
            );
            report(&events, spec.id, GrantOutcome::Revoked).await;
        }
        Err(err) => {
            // Access is still live past its TTL. Log everything an
            // operator needs to reconstruct the mutation by hand.
            tracing::error!(
                grant = %spec.id,
                user = %spec.user,
                document = %spec.document,
                relation = %Relation::Viewer,
                operation = "remove_tuple",
                error = %err,
                "revoke failed, temporary access leaked"
            );
            report(&events, spec.id, GrantOutcome::RevokeFailed).await;
        }
    }
}

async fn report(events: &mpsc::Sender<GrantEvent>, id: GrantId, outcome: GrantOutcome) {
    // The coordinator may already be gone; its drain joins the handle
    // regardless, so a dropped event is harmless.
    if events.send(GrantEvent { id, outcome }).await.is_err() {
        tracing::debug!(grant = %id, "completion event dropped, coordinator gone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_relation::MemoryRelationStore;

    fn manager(
        store: Arc<MemoryRelationStore>,
    ) -> (TempGrantManager<MemoryRelationStore>, mpsc::Receiver<GrantEvent>) {
        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
        };
        TempGrantManager::new(store, retry, 16)
    }

    #[tokio::test(start_paused = true)]
    async fn grant_then_revoke() {
        let store = Arc::new(MemoryRelationStore::new());
        let (mut grants, mut events) = manager(store.clone());
        let tuple = RelationTuple::viewer("mleow", "secret/secretz.doc");

        let spec = GrantSpec::issue("mleow", "secret/secretz.doc", Duration::from_secs(30));
        assert!(grants.spawn(spec.clone()));

        // Granted within one write round trip.
        tokio::task::yield_now().await;
        assert!(store.contains(&tuple));

        tokio::time::advance(Duration::from_secs(31)).await;
        let event = events.recv().await.expect("completion event");
        assert_eq!(event.id, spec.id);
        assert_eq!(event.outcome, GrantOutcome::Revoked);
        assert!(!store.contains(&tuple));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_spawn_is_ignored() {
        let store = Arc::new(MemoryRelationStore::new());
        let (mut grants, _events) = manager(store);

        let spec = GrantSpec::issue("mleow", "doc", Duration::from_secs(30));
        assert!(grants.spawn(spec.clone()));
        assert!(!grants.spawn(spec));
        assert_eq!(grants.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_wait_still_revokes() {
        let store = Arc::new(MemoryRelationStore::new());
        // Pre-existing tuple, as a resumed grant would find.
        store
            .add_tuple(&RelationTuple::viewer("mleow", "doc"))
            .await
            .expect("add");
        let (mut grants, mut events) = manager(store.clone());

        let spec = GrantSpec::issue("mleow", "doc", Duration::from_secs(30));
        assert!(grants.spawn_with_wait(spec, Duration::ZERO));

        let event = events.recv().await.expect("completion event");
        assert_eq!(event.outcome, GrantOutcome::Revoked);
        assert!(!store.contains(&RelationTuple::viewer("mleow", "doc")));
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_completion() {
        let store = Arc::new(MemoryRelationStore::new());
        let (mut grants, _events) = manager(store);

        grants.spawn(GrantSpec::issue("mleow", "a.doc", Duration::from_millis(50)));
        grants.spawn(GrantSpec::issue("bob", "b.doc", Duration::from_millis(80)));

        grants
            .drain(Duration::from_secs(5))
            .await
            .expect("all tasks inside the deadline");
        assert!(grants.is_empty());
        assert!(grants.outstanding().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_reports_stragglers() {
        let store = Arc::new(MemoryRelationStore::new());
        let (mut grants, _events) = manager(store);

        let spec = GrantSpec::issue("mleow", "doc", Duration::from_secs(3600));
        grants.spawn(spec.clone());

        let missed = grants
            .drain(Duration::from_millis(100))
            .await
            .expect_err("task outlives the deadline");
        assert_eq!(missed, vec![spec.id]);
        // Spec retained for the final snapshot.
        assert_eq!(grants.outstanding(), vec![spec]);
    }

    #[tokio::test(start_paused = true)]
    async fn reap_removes_tracked_grant() {
        let store = Arc::new(MemoryRelationStore::new());
        let (mut grants, mut events) = manager(store);

        let spec = GrantSpec::issue("mleow", "doc", Duration::from_millis(10));
        grants.spawn(spec.clone());

        let event = events.recv().await.expect("completion event");
        let reaped = grants.reap(event.id).expect("tracked spec");
        assert_eq!(reaped, spec);
        assert!(grants.is_empty());
        assert!(grants.reap(event.id).is_none());
    }
}
