//! The action coordinator.
//!
//! One coordinator instance owns one organization's state and drives
//! the `Running → Draining → Terminated` lifecycle. A single logical
//! control flow owns [`OrgState`] — no other task mutates it — while
//! grant tasks run concurrently against the shared relation store.
//!
//! # Main Loop
//!
//! ```text
//! loop {
//!     select! { biased;
//!         1. Signal (priority): Action → dispatch intents,
//!                               Terminate → begin draining
//!         2. GrantEvent: reap finished grant task, persist snapshot
//!     }
//! }
//! ```
//!
//! # Draining
//!
//! Receipt of a terminate signal never drops or reorders queued work:
//! the coordinator persists a snapshot, waits a short settle delay so
//! in-flight signals surface, fully processes everything queued, then
//! awaits outstanding grant tasks under the bounded drain wait. Only
//! after that does it publish `Terminated` — with
//! [`CoordinatorError::DrainTimeout`] as the result when the bound was
//! exceeded.

use crate::checker::AccessChecker;
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::grant::{GrantEvent, GrantOutcome, TempGrantManager};
use crate::registry::DocumentRegistry;
use crate::signal::{Action, Signal};
use crate::state::{
    CoordinatorState, GrantSpec, OrgState, SnapshotStore, StateSnapshot,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use ward_relation::{normalize_conflict, RelationStore, RelationTuple};
use ward_types::{ApprovalId, Document, OrgId};

/// Cloneable handle for delivering signals and observing state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ward_relation::MemoryRelationStore;
/// use ward_runtime::{
///     Action, Coordinator, CoordinatorConfig, CoordinatorState, MemorySnapshotStore,
/// };
/// use ward_types::{Document, OrgId};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let (coordinator, handle) = Coordinator::new(
///     OrgId::new("GopherLab"),
///     vec![Document::owned("secret/secretz.doc", "bob", "Secretz")],
///     vec!["bob".into(), "mleow".into()],
///     Arc::new(MemoryRelationStore::new()),
///     MemorySnapshotStore::new(),
///     CoordinatorConfig::default(),
/// );
/// let actor = tokio::spawn(coordinator.run());
///
/// handle.action(Action::temp_elevated("mleow", "secret/secretz.doc")).await?;
/// handle.terminate().await?;
///
/// let mut state = handle.state_watch();
/// state.wait_for(|s| *s == CoordinatorState::Terminated).await?;
/// actor.await??;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    signals: mpsc::Sender<Signal>,
    state: watch::Receiver<CoordinatorState>,
}

impl CoordinatorHandle {
    /// Delivers an action signal.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::SignalChannelClosed`] when the
    /// coordinator is gone.
    pub async fn action(&self, action: Action) -> Result<(), CoordinatorError> {
        self.send(Signal::Action(action)).await
    }

    /// Delivers the terminate signal.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::SignalChannelClosed`] when the
    /// coordinator is gone.
    pub async fn terminate(&self) -> Result<(), CoordinatorError> {
        self.send(Signal::terminate()).await
    }

    /// Delivers a raw signal.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::SignalChannelClosed`] when the
    /// coordinator is gone.
    pub async fn send(&self, signal: Signal) -> Result<(), CoordinatorError> {
        self.signals
            .send(signal)
            .await
            .map_err(|_| CoordinatorError::SignalChannelClosed)
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Returns a watch receiver over the lifecycle state.
    ///
    /// The receiver keeps the last published value even after the
    /// coordinator finishes, so waiting for `Terminated` never races
    /// shutdown.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<CoordinatorState> {
        self.state.clone()
    }
}

/// The signal-driven access-control actor for one organization.
///
/// Construct with [`Coordinator::new`] (fresh seed) or
/// [`Coordinator::resume`] (from a persisted snapshot), grab whatever
/// [`AccessChecker`]s are needed via [`Coordinator::checker`], then
/// drive it to completion with [`Coordinator::run`].
pub struct Coordinator<S: RelationStore + 'static, P: SnapshotStore> {
    config: CoordinatorConfig,
    org: OrgState,
    registry: Arc<DocumentRegistry>,
    store: Arc<S>,
    checker: AccessChecker<S>,
    grants: TempGrantManager<S>,
    grant_events: mpsc::Receiver<GrantEvent>,
    snapshots: P,
    signal_rx: mpsc::Receiver<Signal>,
    state_tx: watch::Sender<CoordinatorState>,
    state: CoordinatorState,
    resume_grants: Vec<GrantSpec>,
    resumed: bool,
}

impl<S: RelationStore + 'static, P: SnapshotStore> Coordinator<S, P> {
    /// Creates a coordinator for a freshly seeded organization.
    #[must_use]
    pub fn new(
        org: OrgId,
        docs: Vec<Document>,
        users: Vec<String>,
        store: Arc<S>,
        snapshots: P,
        config: CoordinatorConfig,
    ) -> (Self, CoordinatorHandle) {
        let registry = Arc::new(DocumentRegistry::new(docs, users));
        let org_state = OrgState::new(
            org,
            registry.users().clone(),
            registry.documents().to_vec(),
        );
        Self::build(org_state, registry, store, snapshots, config, Vec::new(), false)
    }

    /// Rebuilds a coordinator from a persisted snapshot.
    ///
    /// Outstanding grants are re-spawned with their remaining TTL when
    /// [`run`](Self::run) starts; the deterministic grant ids make the
    /// re-spawn a no-op for anything already tracked. Initial tuples
    /// are not re-seeded. A snapshot taken while `Draining` resumes
    /// directly into the drain phase, and a `Terminated` snapshot that
    /// still lists outstanding grants (a previous drain timed out)
    /// resumes draining too — the leaked revokes must be finished.
    #[must_use]
    pub fn resume(
        snapshot: StateSnapshot,
        store: Arc<S>,
        snapshots: P,
        config: CoordinatorConfig,
    ) -> (Self, CoordinatorHandle) {
        let registry = Arc::new(DocumentRegistry::new(
            snapshot.org.docs.clone(),
            snapshot.org.users.iter().cloned(),
        ));
        let state = match snapshot.state {
            CoordinatorState::Terminated if !snapshot.outstanding_grants.is_empty() => {
                info!(
                    org = %snapshot.org.org,
                    outstanding = snapshot.outstanding_grants.len(),
                    "terminated snapshot still lists grants, resuming drain"
                );
                CoordinatorState::Draining
            }
            state => state,
        };
        let mut this_and_handle = Self::build(
            snapshot.org,
            registry,
            store,
            snapshots,
            config,
            snapshot.outstanding_grants,
            true,
        );
        this_and_handle.0.state = state;
        this_and_handle
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        org: OrgState,
        registry: Arc<DocumentRegistry>,
        store: Arc<S>,
        snapshots: P,
        config: CoordinatorConfig,
        resume_grants: Vec<GrantSpec>,
        resumed: bool,
    ) -> (Self, CoordinatorHandle) {
        let (signal_tx, signal_rx) = mpsc::channel(config.signal_buffer);
        let (state_tx, state_rx) = watch::channel(CoordinatorState::Running);
        let (grants, grant_events) =
            TempGrantManager::new(Arc::clone(&store), config.retry, config.signal_buffer);
        let checker = AccessChecker::new(Arc::clone(&store), Arc::clone(&registry));

        let coordinator = Self {
            config,
            org,
            registry,
            store,
            checker,
            grants,
            grant_events,
            snapshots,
            signal_rx,
            state_tx,
            state: CoordinatorState::Running,
            resume_grants,
            resumed,
        };
        let handle = CoordinatorHandle {
            signals: signal_tx,
            state: state_rx,
        };
        (coordinator, handle)
    }

    /// Returns an access checker sharing this coordinator's store and
    /// registry.
    #[must_use]
    pub fn checker(&self) -> AccessChecker<S> {
        self.checker.clone()
    }

    /// Runs the actor to completion.
    ///
    /// Seeds (or resumes), dispatches signals until terminated, then
    /// drains.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::DrainTimeout`] when outstanding
    /// grant tasks outlive the bounded drain wait. The actor reaches
    /// `Terminated` either way.
    pub async fn run(mut self) -> Result<(), CoordinatorError> {
        if self.state == CoordinatorState::Terminated {
            info!(org = %self.org.org, "coordinator already terminated, nothing to run");
            self.state_tx.send_replace(self.state);
            return Ok(());
        }

        self.start().await;

        if self.state == CoordinatorState::Running {
            self.main_loop().await;
        }

        self.drain().await
    }

    async fn start(&mut self) {
        if self.resumed {
            let now = Utc::now();
            let specs = std::mem::take(&mut self.resume_grants);
            for spec in specs {
                let wait = spec.remaining(now);
                self.grants.spawn_with_wait(spec, wait);
            }
            info!(
                org = %self.org.org,
                state = %self.state,
                grants = self.grants.len(),
                "coordinator resumed from snapshot"
            );
        } else {
            let failed = self.registry.setup_initial_tuples(self.store.as_ref()).await;
            if failed > 0 {
                warn!(
                    org = %self.org.org,
                    failed,
                    "initial tuple seeding incomplete"
                );
            }
            info!(
                org = %self.org.org,
                docs = self.registry.documents().len(),
                users = self.registry.users().len(),
                "coordinator seeded"
            );
        }
        self.state_tx.send_replace(self.state);
        self.persist().await;
    }

    /// Dispatches signals until a terminate arrives (or every handle is
    /// dropped, after which no signal can ever arrive again).
    async fn main_loop(&mut self) {
        loop {
            tokio::select! {
                // Signals take priority over grant bookkeeping.
                biased;

                signal = self.signal_rx.recv() => match signal {
                    Some(Signal::Action(action)) => self.handle_action(action).await,
                    Some(Signal::Terminate { force }) => {
                        info!(org = %self.org.org, force, "terminate signal received");
                        self.transition(CoordinatorState::Draining).await;
                        return;
                    }
                    None => {
                        info!(org = %self.org.org, "all signal handles dropped, draining");
                        self.transition(CoordinatorState::Draining).await;
                        return;
                    }
                },

                event = self.grant_events.recv() => {
                    if let Some(event) = event {
                        self.handle_grant_event(event).await;
                    }
                }
            }
        }
    }

    /// Dispatches one action: every intent present is honored
    /// independently; absent intents are no-ops.
    async fn handle_action(&mut self, action: Action) {
        debug!(
            org = %self.org.org,
            user = %action.user,
            document = %action.document,
            check_approval = action.check_approval,
            temp_elevated = action.temp_elevated,
            add_permission = action.add_permission,
            remove_permission = action.remove_permission,
            "action signal received"
        );
        if action.is_empty() {
            debug!(org = %self.org.org, "action carries no intents");
            return;
        }

        if action.check_approval {
            self.report_approvals(&action);
        }

        if action.temp_elevated {
            self.spawn_temp_grant(&action).await;
        }

        if action.add_permission {
            self.write_permission(&action, true).await;
        }

        if action.remove_permission {
            self.write_permission(&action, false).await;
        }
    }

    fn report_approvals(&self, action: &Action) {
        let subject = ApprovalId::for_subject(&action.user, &action.document);
        info!(
            org = %self.org.org,
            user = %action.user,
            document = %action.document,
            pending = self.org.pending_approvals.contains(&subject),
            outstanding = self.org.pending_approvals.len(),
            "approval state"
        );
    }

    async fn spawn_temp_grant(&mut self, action: &Action) {
        let ttl = action.ttl.unwrap_or(self.config.grant_ttl);
        let spec = GrantSpec::issue(&action.user, &action.document, ttl);
        if !self.grants.spawn(spec) {
            return;
        }
        // Elevation on an owned document leaves an approval request
        // for the owner until the grant runs out.
        let owned = self
            .registry
            .get(&action.document)
            .is_some_and(|doc| doc.owner().is_some());
        if owned {
            self.org
                .pending_approvals
                .insert(ApprovalId::for_subject(&action.user, &action.document));
        }
        self.persist().await;
    }

    async fn write_permission(&mut self, action: &Action, add: bool) {
        let tuple = RelationTuple::viewer(&action.user, &action.document);
        let store = Arc::clone(&self.store);
        let retry = self.config.retry;
        let (operation, result) = if add {
            (
                "add_tuple",
                retry.run("add_tuple", || store.add_tuple(&tuple)).await,
            )
        } else {
            (
                "remove_tuple",
                retry.run("remove_tuple", || store.remove_tuple(&tuple)).await,
            )
        };
        match normalize_conflict(result) {
            Ok(()) => debug!(org = %self.org.org, %tuple, operation, "permission updated"),
            Err(err) => {
                // Abandoned after bounded retries; log enough context to
                // reconstruct the mutation for manual reconciliation.
                error!(
                    org = %self.org.org,
                    %tuple,
                    operation,
                    error = %err,
                    "permission update abandoned"
                );
            }
        }
    }

    async fn handle_grant_event(&mut self, event: GrantEvent) {
        let Some(spec) = self.grants.reap(event.id) else {
            debug!(grant = %event.id, "completion event for untracked grant");
            return;
        };
        match event.outcome {
            GrantOutcome::Revoked => {
                debug!(grant = %event.id, user = %spec.user, document = %spec.document, "grant completed")
            }
            GrantOutcome::GrantFailed => {
                warn!(grant = %event.id, user = %spec.user, document = %spec.document, "grant never took effect")
            }
            GrantOutcome::RevokeFailed => {
                // Already logged at error level inside the task.
                warn!(grant = %event.id, user = %spec.user, document = %spec.document, "grant ended with a leaked revoke")
            }
        }
        self.org
            .pending_approvals
            .remove(&ApprovalId::for_subject(&spec.user, &spec.document));
        self.persist().await;
    }

    /// Settle, flush queued work, then await outstanding grants under
    /// the bounded wait.
    async fn drain(&mut self) -> Result<(), CoordinatorError> {
        tokio::time::sleep(self.config.settle_delay).await;

        self.flush_queued_signals().await;
        self.flush_grant_events().await;

        let result = match self.grants.drain(self.config.drain_timeout).await {
            Ok(()) => Ok(()),
            Err(outstanding) => {
                error!(
                    org = %self.org.org,
                    outstanding = outstanding.len(),
                    timeout_ms = self.config.drain_timeout.as_millis() as u64,
                    "grant tasks outlived the drain window"
                );
                Err(CoordinatorError::DrainTimeout {
                    outstanding,
                    timeout: self.config.drain_timeout,
                })
            }
        };

        self.flush_grant_events().await;
        self.transition(CoordinatorState::Terminated).await;
        info!(org = %self.org.org, "coordinator terminated");
        result
    }

    /// Processes every signal already queued, in arrival order. Action
    /// signals are fully dispatched; additional terminates are ignored.
    async fn flush_queued_signals(&mut self) {
        loop {
            match self.signal_rx.try_recv() {
                Ok(Signal::Action(action)) => self.handle_action(action).await,
                Ok(Signal::Terminate { .. }) => {
                    debug!(org = %self.org.org, "duplicate terminate ignored while draining");
                }
                Err(_) => break,
            }
        }
    }

    async fn flush_grant_events(&mut self) {
        while let Ok(event) = self.grant_events.try_recv() {
            self.handle_grant_event(event).await;
        }
    }

    async fn transition(&mut self, next: CoordinatorState) {
        info!(org = %self.org.org, from = %self.state, to = %next, "state transition");
        self.state = next;
        self.state_tx.send_replace(next);
        self.persist().await;
    }

    /// Best-effort snapshot of `{state, org state, outstanding grants}`.
    async fn persist(&mut self) {
        let snapshot = StateSnapshot {
            state: self.state,
            org: self.org.clone(),
            outstanding_grants: self.grants.outstanding(),
        };
        if let Err(err) = self.snapshots.save(&snapshot).await {
            warn!(org = %self.org.org, error = %err, "state snapshot failed, continuing");
        }
    }
}
