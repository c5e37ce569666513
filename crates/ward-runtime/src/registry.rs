//! Document registry for one organization.
//!
//! Seeded exactly once at actor start and immutable afterwards. The
//! registry also derives the initial relationship tuples: owners get an
//! editor tuple, public documents get a viewer tuple for every known
//! user.

use std::collections::BTreeSet;
use ward_relation::{normalize_conflict, RelationStore, RelationTuple};
use ward_types::Document;

/// In-memory snapshot of an organization's documents and users.
///
/// # Seeding
///
/// Documents are sorted by id; a duplicate id keeps the first
/// occurrence and logs the discarded one. Users are deduplicated by the
/// set.
///
/// # Example
///
/// ```
/// use ward_runtime::DocumentRegistry;
/// use ward_types::Document;
///
/// let registry = DocumentRegistry::new(
///     vec![
///         Document::new("public/welcome.doc", "All Open!"),
///         Document::owned("secret/secretz.doc", "bob", "Secretz"),
///     ],
///     ["bob".to_string(), "mleow".to_string()],
/// );
///
/// assert!(registry.get("public/welcome.doc").is_some());
/// assert!(registry.get("missing.doc").is_none());
/// // owner editor tuple + public viewer tuple per user
/// assert_eq!(registry.initial_tuples().len(), 3);
/// ```
#[derive(Debug)]
pub struct DocumentRegistry {
    docs: Vec<Document>,
    users: BTreeSet<String>,
}

impl DocumentRegistry {
    /// Seeds the registry from the initial document and user lists.
    #[must_use]
    pub fn new(docs: Vec<Document>, users: impl IntoIterator<Item = String>) -> Self {
        let mut docs = docs;
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        let before = docs.len();
        docs.dedup_by(|b, a| {
            let duplicate = a.id == b.id;
            if duplicate {
                tracing::warn!(document = %b.id, "duplicate document id discarded at seeding");
            }
            duplicate
        });
        if docs.len() < before {
            tracing::warn!(
                discarded = before - docs.len(),
                "registry seeded with duplicate document ids"
            );
        }
        Self {
            docs,
            users: users.into_iter().collect(),
        }
    }

    /// Looks up a document by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.docs
            .binary_search_by(|d| d.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.docs[i])
    }

    /// Returns all documents, sorted by id.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    /// Returns the known users.
    #[must_use]
    pub fn users(&self) -> &BTreeSet<String> {
        &self.users
    }

    /// Derives the tuples written once at startup.
    ///
    /// - every owned document: an `editor` tuple for the owner (viewer
    ///   rights follow from the store's editor-implies-viewer rule)
    /// - every public document: a `viewer` tuple for each known user
    #[must_use]
    pub fn initial_tuples(&self) -> Vec<RelationTuple> {
        let mut tuples = Vec::new();
        for doc in &self.docs {
            if let Some(owner) = doc.owner() {
                tuples.push(RelationTuple::editor(owner, &doc.id));
            }
            if doc.is_public() {
                for user in &self.users {
                    tuples.push(RelationTuple::viewer(user, &doc.id));
                }
            }
        }
        tuples
    }

    /// Writes the initial tuples to the store.
    ///
    /// Tries one batched write first; on failure falls back to
    /// per-tuple writes so one bad tuple cannot sink the rest. Failures
    /// are logged with full tuple context and counted, never retried
    /// indefinitely — this runs once at startup, and a stuck actor is
    /// worse than an incompletely seeded one.
    ///
    /// Returns the number of tuples that could not be written.
    pub async fn setup_initial_tuples<S: RelationStore>(&self, store: &S) -> usize {
        let tuples = self.initial_tuples();
        if tuples.is_empty() {
            return 0;
        }

        match normalize_conflict(store.add_tuples(&tuples).await) {
            Ok(()) => {
                tracing::info!(count = tuples.len(), "initial tuples seeded");
                0
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "batched tuple seeding failed, retrying per tuple"
                );
                let mut failed = 0usize;
                for tuple in &tuples {
                    if let Err(err) = normalize_conflict(store.add_tuple(tuple).await) {
                        tracing::error!(
                            %tuple,
                            operation = "add_tuple",
                            error = %err,
                            "initial tuple write abandoned"
                        );
                        failed += 1;
                    }
                }
                failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_relation::{MemoryRelationStore, Relation};

    fn demo_registry() -> DocumentRegistry {
        DocumentRegistry::new(
            vec![
                Document::new("public/welcome.doc", "All Open!"),
                Document::owned("secret/secretz.doc", "bob", "Secretz"),
            ],
            ["bob".to_string(), "mleow".to_string()],
        )
    }

    #[test]
    fn lookup_by_id() {
        let registry = demo_registry();
        assert_eq!(
            registry.get("secret/secretz.doc").map(|d| d.owner()),
            Some(Some("bob"))
        );
        assert!(registry.get("nope.doc").is_none());
    }

    #[test]
    fn documents_sorted_by_id() {
        let registry = DocumentRegistry::new(
            vec![
                Document::new("z.doc", "z"),
                Document::new("a.doc", "a"),
            ],
            Vec::new(),
        );
        let ids: Vec<&str> = registry.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.doc", "z.doc"]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let registry = DocumentRegistry::new(
            vec![
                Document::new("a.doc", "first"),
                Document::new("a.doc", "second"),
            ],
            Vec::new(),
        );
        assert_eq!(registry.documents().len(), 1);
        assert_eq!(registry.get("a.doc").map(|d| d.content.as_str()), Some("first"));
    }

    #[test]
    fn initial_tuples_owner_and_public() {
        let tuples = demo_registry().initial_tuples();
        assert!(tuples.contains(&RelationTuple::editor("bob", "secret/secretz.doc")));
        assert!(tuples.contains(&RelationTuple::viewer("bob", "public/welcome.doc")));
        assert!(tuples.contains(&RelationTuple::viewer("mleow", "public/welcome.doc")));
        assert_eq!(tuples.len(), 3);
    }

    #[test]
    fn no_tuples_for_unowned_private_doc() {
        let registry = DocumentRegistry::new(
            vec![Document::new("internal/notes.doc", "notes")],
            ["bob".to_string()],
        );
        assert!(registry.initial_tuples().is_empty());
    }

    #[tokio::test]
    async fn seeding_writes_tuples() {
        let registry = demo_registry();
        let store = MemoryRelationStore::new();

        let failed = registry.setup_initial_tuples(&store).await;
        assert_eq!(failed, 0);

        assert!(store
            .check("bob", Relation::Editor, "secret/secretz.doc")
            .await
            .expect("check"));
        assert!(store
            .check("mleow", Relation::Viewer, "public/welcome.doc")
            .await
            .expect("check"));
    }
}
