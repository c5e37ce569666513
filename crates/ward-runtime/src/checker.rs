//! Access checking over the relation store.
//!
//! The checker wraps the store with the two domain checks the system
//! needs — viewer and editor — plus content retrieval gated on the
//! viewer check. It issues exactly one relation check per question and
//! trusts the store's evaluation semantics (owner/editor implication
//! included).
//!
//! # Default Deny
//!
//! A store error is logged and answered as "denied". An errored check
//! is indistinguishable from a denied one to the caller; errors are
//! never escalated to "allowed".
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`AccessError::NotFound`] | `ACCESS_NOT_FOUND` | No |
//! | [`AccessError::Unauthorized`] | `ACCESS_UNAUTHORIZED` | No |

use crate::registry::DocumentRegistry;
use std::sync::Arc;
use thiserror::Error;
use ward_relation::{Relation, RelationStore};
use ward_types::ErrorCode;

/// Access decision error returned by content retrieval.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The document id is not in the registry.
    #[error("document not found: {document}")]
    NotFound {
        /// Document id looked up.
        document: String,
    },

    /// The viewer check denied (or errored, which reads the same).
    #[error("user {user} unauthorized viewer of {document}")]
    Unauthorized {
        /// Denied user.
        user: String,
        /// Target document id.
        document: String,
    },
}

impl ErrorCode for AccessError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ACCESS_NOT_FOUND",
            Self::Unauthorized { .. } => "ACCESS_UNAUTHORIZED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Domain-level access checks over a [`RelationStore`].
///
/// Cheap to clone; both fields are shared handles. The registry is
/// immutable after seeding, so sharing it off the coordinator is safe.
#[derive(Debug)]
pub struct AccessChecker<S> {
    store: Arc<S>,
    registry: Arc<DocumentRegistry>,
}

impl<S> Clone for AccessChecker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: RelationStore> AccessChecker<S> {
    /// Creates a checker over a store and a seeded registry.
    #[must_use]
    pub fn new(store: Arc<S>, registry: Arc<DocumentRegistry>) -> Self {
        Self { store, registry }
    }

    /// Returns `true` iff a viewer relationship exists between the user
    /// and the document.
    pub async fn can_view(&self, user: &str, document: &str) -> bool {
        self.allowed(user, Relation::Viewer, document).await
    }

    /// Returns `true` iff an editor relationship exists between the
    /// user and the document.
    pub async fn can_edit(&self, user: &str, document: &str) -> bool {
        self.allowed(user, Relation::Editor, document).await
    }

    /// Returns the document content, gated on the viewer check.
    ///
    /// # Errors
    ///
    /// - [`AccessError::NotFound`] when the id is not registered
    /// - [`AccessError::Unauthorized`] when the viewer check denies
    ///   (or errors — default deny)
    pub async fn document_content(
        &self,
        user: &str,
        document_id: &str,
    ) -> Result<String, AccessError> {
        let Some(doc) = self.registry.get(document_id) else {
            return Err(AccessError::NotFound {
                document: document_id.to_string(),
            });
        };
        if self.can_view(user, document_id).await {
            Ok(doc.content.clone())
        } else {
            Err(AccessError::Unauthorized {
                user: user.to_string(),
                document: document_id.to_string(),
            })
        }
    }

    /// Lists registered documents the user may view.
    ///
    /// Store errors answer an empty list (default deny), logged like
    /// any other errored check.
    pub async fn viewable_documents(&self, user: &str) -> Vec<String> {
        match self.store.list_objects(user, Relation::Viewer).await {
            Ok(objects) => objects
                .into_iter()
                .filter(|id| self.registry.get(id).is_some())
                .collect(),
            Err(err) => {
                tracing::warn!(
                    user,
                    relation = %Relation::Viewer,
                    operation = "list_objects",
                    error = %err,
                    "list failed, answering empty"
                );
                Vec::new()
            }
        }
    }

    async fn allowed(&self, user: &str, relation: Relation, document: &str) -> bool {
        match self.store.check(user, relation, document).await {
            Ok(true) => {
                tracing::debug!(user, %relation, document, "access allowed");
                true
            }
            Ok(false) => {
                tracing::debug!(user, %relation, document, "access denied");
                false
            }
            Err(err) => {
                // Default deny: an errored check reads as a denial.
                tracing::warn!(
                    user,
                    %relation,
                    document,
                    operation = "check",
                    error = %err,
                    "check failed, denying"
                );
                false
            }
        }
    }
}
