//! The relation-store client boundary.
//!
//! [`RelationStore`] is the only interface the runtime uses to reach
//! the authorization backend. Implementations may be backed by a local
//! in-memory tuple table ([`MemoryRelationStore`](crate::MemoryRelationStore))
//! or by a remote service client; both must honor the same idempotence
//! contract.

use crate::error::StoreError;
use crate::tuple::{Relation, RelationTuple};
use std::future::Future;

/// Typed operations against the relationship store.
///
/// Implementations must be thread-safe (`Send + Sync`) — grant tasks
/// call into the store concurrently with the coordinator's main loop.
///
/// # Idempotence Contract
///
/// Retries can occur after partial success, so every mutation must be
/// idempotent from the caller's perspective:
///
/// - [`add_tuple`](Self::add_tuple) must not error when the tuple
///   already exists
/// - [`remove_tuple`](Self::remove_tuple) must not error when the tuple
///   is absent
///
/// Backends that cannot avoid reporting these conditions return
/// [`StoreError::Conflict`], which callers fold into success with
/// [`normalize_conflict`].
///
/// # Example
///
/// ```
/// use ward_relation::{
///     MemoryRelationStore, Relation, RelationStore, RelationTuple, StoreError,
/// };
///
/// async fn grant_and_check(store: &MemoryRelationStore) -> Result<bool, StoreError> {
///     store
///         .add_tuple(&RelationTuple::viewer("mleow", "public/welcome.doc"))
///         .await?;
///     store
///         .check("mleow", Relation::Viewer, "public/welcome.doc")
///         .await
/// }
/// ```
pub trait RelationStore: Send + Sync {
    /// Adds one relationship tuple.
    ///
    /// Adding a tuple that already exists is success, not failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transient`] on backend failure.
    fn add_tuple(
        &self,
        tuple: &RelationTuple,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Adds a batch of tuples.
    ///
    /// The default implementation writes tuples one at a time and stops
    /// at the first failure; backends with a cheaper batch path should
    /// override it.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered.
    fn add_tuples(
        &self,
        tuples: &[RelationTuple],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            for tuple in tuples {
                normalize_conflict(self.add_tuple(tuple).await)?;
            }
            Ok(())
        }
    }

    /// Removes one relationship tuple.
    ///
    /// Removing a tuple that is absent is success, not failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transient`] on backend failure.
    fn remove_tuple(
        &self,
        tuple: &RelationTuple,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Evaluates whether `user` holds `relation` on `object`.
    ///
    /// Evaluation semantics belong to the store: the caller issues one
    /// check and trusts the result (editor implies viewer in every
    /// conforming backend).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transient`] on backend failure. Callers in
    /// the access path treat an error as "denied".
    fn check(
        &self,
        user: &str,
        relation: Relation,
        object: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Lists the objects on which `user` holds `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transient`] on backend failure.
    fn list_objects(
        &self,
        user: &str,
        relation: Relation,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Folds [`StoreError::Conflict`] into success.
///
/// Duplicate adds and missing deletes mean the store already holds the
/// desired state; per the idempotence contract they are not failures.
///
/// # Example
///
/// ```
/// use ward_relation::{normalize_conflict, RelationTuple, StoreError};
///
/// let conflicted: Result<(), _> =
///     Err(StoreError::conflict(RelationTuple::viewer("bob", "doc")));
/// assert!(normalize_conflict(conflicted).is_ok());
///
/// let transient: Result<(), _> = Err(StoreError::transient("add_tuple", "reset"));
/// assert!(normalize_conflict(transient).is_err());
/// ```
pub fn normalize_conflict(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::Conflict { tuple }) => {
            tracing::debug!(%tuple, "tuple already in desired state");
            Ok(())
        }
        other => other,
    }
}
