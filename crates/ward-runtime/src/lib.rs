//! Ward runtime — the signal-driven access-control actor.
//!
//! One [`Coordinator`] instance per organization holds the documents
//! and users, answers "can user U view/edit document D" against the
//! relationship store, grants and automatically revokes time-boxed
//! elevated access, and processes asynchronous operator actions without
//! losing signals while shutting down cleanly.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ward-types    : GrantId, OrgId, Document, ErrorCode        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ward-relation : RelationTuple, RelationStore, RetryPolicy  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ward-runtime (THIS CRATE)                                  │
//! │                                                             │
//! │   signal ──► Coordinator ──┬──► TempGrantManager ──► store  │
//! │              (main loop)   ├──► AccessChecker ─────► store  │
//! │              owns OrgState └──► DocumentRegistry            │
//! │                    │                                        │
//! │                    └──► SnapshotStore (persist on change)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`signal`]: [`Action`] intents and the [`Signal`] envelope
//! - [`config`]: [`CoordinatorConfig`] with the contract defaults
//! - [`state`]: lifecycle state, org state, grant specs, snapshots
//! - [`registry`]: [`DocumentRegistry`] and initial tuple seeding
//! - [`checker`]: [`AccessChecker`] (default-deny reads)
//! - [`grant`]: [`TempGrantManager`] (grant → wait → revoke tasks)
//! - [`coordinator`]: the [`Coordinator`] state machine
//!
//! # Concurrency Model
//!
//! A single logical control flow (the coordinator's main loop) owns
//! [`OrgState`]; grant tasks run as independent tokio tasks that share
//! only the relation store, which is idempotent under retry by
//! contract. Suspension points — the signal wait, the settle delay, the
//! grant TTL, the bounded drain wait — are cancelled only by actor
//! termination, never by arbitrary external cancellation.

pub mod checker;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grant;
pub mod registry;
pub mod signal;
pub mod state;

pub use checker::{AccessChecker, AccessError};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use error::CoordinatorError;
pub use grant::{GrantEvent, GrantOutcome, TempGrantManager};
pub use registry::DocumentRegistry;
pub use signal::{Action, Signal};
pub use state::{
    CoordinatorState, GrantSpec, MemorySnapshotStore, OrgState, SnapshotError, SnapshotStore,
    StateSnapshot,
};
