//! Relationship tuples.
//!
//! A tuple `(user, relation, object)` is the single authoritative
//! access-control fact in the system. Everything the access checker
//! answers reduces to the presence or absence of tuples.

use serde::{Deserialize, Serialize};

/// The relation a user holds on an object.
///
/// # Evaluation
///
/// `Editor` is the stronger relation: every store implementation must
/// answer viewer checks positively for users that hold the editor
/// relation (see [`MemoryRelationStore`](crate::MemoryRelationStore)).
///
/// # Example
///
/// ```
/// use ward_relation::Relation;
///
/// assert_eq!(Relation::Viewer.as_str(), "viewer");
/// assert_eq!(Relation::Editor.as_str(), "editor");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// May read the object's content.
    Viewer,
    /// May modify the object; implies viewer.
    Editor,
}

impl Relation {
    /// Returns the wire name of the relation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One relationship fact: `user` holds `relation` on `object`.
///
/// Uniqueness is the whole triple — adding an existing tuple or
/// removing an absent one leaves the store unchanged and is never an
/// error.
///
/// # Example
///
/// ```
/// use ward_relation::{Relation, RelationTuple};
///
/// let t = RelationTuple::viewer("mleow", "public/welcome.doc");
/// assert_eq!(t.relation, Relation::Viewer);
/// assert_eq!(t.user, "mleow");
/// assert_eq!(t.object, "public/welcome.doc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTuple {
    /// Acting user.
    pub user: String,
    /// Relation held.
    pub relation: Relation,
    /// Target object (document id).
    pub object: String,
}

impl RelationTuple {
    /// Creates a tuple with an explicit relation.
    #[must_use]
    pub fn new(user: impl Into<String>, relation: Relation, object: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            relation,
            object: object.into(),
        }
    }

    /// Creates a viewer tuple.
    #[must_use]
    pub fn viewer(user: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(user, Relation::Viewer, object)
    }

    /// Creates an editor tuple.
    #[must_use]
    pub fn editor(user: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(user, Relation::Editor, object)
    }
}

impl std::fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}#{}@document:{}", self.user, self.relation, self.object)
    }
}
