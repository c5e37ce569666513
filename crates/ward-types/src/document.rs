//! The document record held by an organization.

use serde::{Deserialize, Serialize};

/// Path prefix that marks a document as readable by every known user.
pub const PUBLIC_PREFIX: &str = "public/";

/// A document registered with one organization.
///
/// Documents are immutable after registry seeding; content is only
/// readable through the access checker, never directly off this struct
/// by external callers.
///
/// # Ownership
///
/// `owner` is `None` for unowned documents. An owner, when present,
/// implicitly holds editor and viewer rights — the registry seeds the
/// editor tuple once at startup and it is never revoked.
///
/// # Example
///
/// ```
/// use ward_types::Document;
///
/// let open = Document::new("public/welcome.doc", "All Open!");
/// assert!(open.is_public());
/// assert!(open.owner().is_none());
///
/// let secret = Document::owned("secret/secretz.doc", "bob", "Secretz");
/// assert!(!secret.is_public());
/// assert_eq!(secret.owner(), Some("bob"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path-like document id, e.g. `"secret/secretz.doc"`.
    pub id: String,
    /// Owning user, if any.
    pub owner: Option<String>,
    /// Document body.
    pub content: String,
}

impl Document {
    /// Creates an unowned document.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: None,
            content: content.into(),
        }
    }

    /// Creates a document with an owner.
    #[must_use]
    pub fn owned(
        id: impl Into<String>,
        owner: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: Some(owner.into()),
            content: content.into(),
        }
    }

    /// Creates a document from externally supplied parts.
    ///
    /// External inputs encode "no owner" as an empty string; that maps
    /// to `None` here.
    #[must_use]
    pub fn from_parts(
        id: impl Into<String>,
        owner: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        Self {
            id: id.into(),
            owner: (!owner.is_empty()).then_some(owner),
            content: content.into(),
        }
    }

    /// Returns the owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns `true` if the document id carries the public prefix.
    ///
    /// Public documents are seeded with a viewer tuple for every known
    /// user of the organization.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.id.starts_with(PUBLIC_PREFIX)
    }
}
