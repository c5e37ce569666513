//! In-memory relation store.
//!
//! [`MemoryRelationStore`] is the local backend: a thread-safe tuple
//! table used for tests and single-process deployments. It honors the
//! same contracts a remote backend must — idempotent mutations and
//! editor-implies-viewer evaluation.

use crate::error::StoreError;
use crate::store::RelationStore;
use crate::tuple::{Relation, RelationTuple};
use std::collections::HashSet;
use std::sync::RwLock;

/// Thread-safe, in-memory tuple table.
///
/// # Evaluation Semantics
///
/// `check(user, Viewer, object)` answers `true` when either the viewer
/// or the editor tuple is present: the editor relation subsumes viewer.
/// This is how a document owner, seeded with a single editor tuple,
/// passes both `can_edit` and `can_view` with no explicit viewer grant.
///
/// # Thread Safety
///
/// All operations go through one `RwLock`; check-heavy workloads take
/// the read lock concurrently. A poisoned lock is reported as a
/// transient error rather than panicking the caller.
#[derive(Debug, Default)]
pub struct MemoryRelationStore {
    tuples: RwLock<HashSet<RelationTuple>>,
}

impl MemoryRelationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tuples.
    #[must_use]
    pub fn tuple_count(&self) -> usize {
        self.tuples.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns `true` if the exact tuple is stored.
    ///
    /// Unlike [`check`](RelationStore::check), this does not apply the
    /// editor-implies-viewer rule; it answers raw membership.
    #[must_use]
    pub fn contains(&self, tuple: &RelationTuple) -> bool {
        self.tuples.read().map(|t| t.contains(tuple)).unwrap_or(false)
    }

    fn read_or_transient(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashSet<RelationTuple>>, StoreError> {
        self.tuples.read().map_err(|_| {
            tracing::error!(operation, "tuple table lock poisoned");
            StoreError::transient(operation, "tuple table lock poisoned")
        })
    }

    fn write_or_transient(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashSet<RelationTuple>>, StoreError> {
        self.tuples.write().map_err(|_| {
            tracing::error!(operation, "tuple table lock poisoned");
            StoreError::transient(operation, "tuple table lock poisoned")
        })
    }
}

impl RelationStore for MemoryRelationStore {
    async fn add_tuple(&self, tuple: &RelationTuple) -> Result<(), StoreError> {
        let mut tuples = self.write_or_transient("add_tuple")?;
        if tuples.insert(tuple.clone()) {
            tracing::debug!(%tuple, "tuple added");
        } else {
            // Duplicate add is a no-op by contract.
            tracing::debug!(%tuple, "tuple already present");
        }
        Ok(())
    }

    async fn add_tuples(&self, batch: &[RelationTuple]) -> Result<(), StoreError> {
        let mut tuples = self.write_or_transient("add_tuples")?;
        let mut added = 0usize;
        for tuple in batch {
            if tuples.insert(tuple.clone()) {
                added += 1;
            }
        }
        tracing::debug!(batch = batch.len(), added, "tuple batch written");
        Ok(())
    }

    async fn remove_tuple(&self, tuple: &RelationTuple) -> Result<(), StoreError> {
        let mut tuples = self.write_or_transient("remove_tuple")?;
        if tuples.remove(tuple) {
            tracing::debug!(%tuple, "tuple removed");
        } else {
            // Missing delete is a no-op by contract.
            tracing::debug!(%tuple, "tuple already absent");
        }
        Ok(())
    }

    async fn check(
        &self,
        user: &str,
        relation: Relation,
        object: &str,
    ) -> Result<bool, StoreError> {
        let tuples = self.read_or_transient("check")?;
        let direct = tuples.contains(&RelationTuple::new(user, relation, object));
        let implied = relation == Relation::Viewer
            && tuples.contains(&RelationTuple::editor(user, object));
        Ok(direct || implied)
    }

    async fn list_objects(
        &self,
        user: &str,
        relation: Relation,
    ) -> Result<Vec<String>, StoreError> {
        let tuples = self.read_or_transient("list_objects")?;
        let mut objects: Vec<String> = tuples
            .iter()
            .filter(|t| {
                t.user == user
                    && (t.relation == relation
                        || (relation == Relation::Viewer && t.relation == Relation::Editor))
            })
            .map(|t| t.object.clone())
            .collect();
        objects.sort();
        objects.dedup();
        Ok(objects)
    }
}
