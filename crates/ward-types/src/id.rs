//! Identifier types for the ward workspace.
//!
//! Grant identifiers are UUID-based so they stay unique across process
//! restarts; organization and approval identifiers are opaque strings
//! chosen by the operator or derived from a grant.

use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

/// Ward namespace UUID for deterministic UUID v5 generation.
///
/// Used to derive idempotency keys for grant tasks: the same
/// (user, document, issued-at) always maps to the same [`GrantId`],
/// which is how a resumed actor recognizes a grant it already spawned.
const WARD_NAMESPACE: Uuid = uuid!("3f1c6f52-8a0e-49d7-9b41-c24a55e20d8f");

/// Identifier for one temporary-grant background task.
///
/// # UUID Strategy
///
/// - [`GrantId::new`] — random UUID v4, for grants created fresh from an
///   action signal.
/// - [`GrantId::idempotency`] — deterministic UUID v5 over
///   (user, document, issued-at). Two calls with the same inputs produce
///   the same id, so duplicate signal delivery and snapshot resumption
///   cannot double-spawn a task.
///
/// # Example
///
/// ```
/// use ward_types::GrantId;
///
/// let a = GrantId::idempotency("mleow", "secret/secretz.doc", 1_700_000_000_000);
/// let b = GrantId::idempotency("mleow", "secret/secretz.doc", 1_700_000_000_000);
/// assert_eq!(a, b);                 // same inputs, same id
///
/// let c = GrantId::new();
/// assert_ne!(a, c);                 // fresh ids are random
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantId(pub Uuid);

impl GrantId {
    /// Creates a new [`GrantId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives the deterministic idempotency key for a grant.
    ///
    /// `issued_at_ms` is the grant's issue time as Unix milliseconds.
    /// The triple (user, document, issued-at) identifies one logical
    /// grant across restarts and duplicate deliveries.
    #[must_use]
    pub fn idempotency(user: &str, document: &str, issued_at_ms: i64) -> Self {
        let material = format!("{user}\u{0}{document}\u{0}{issued_at_ms}");
        Self(Uuid::new_v5(&WARD_NAMESPACE, material.as_bytes()))
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grant:{}", self.0)
    }
}

/// Identifier for an organization.
///
/// One coordinator actor owns exactly one organization; org state is
/// never shared across organizations. The value is an opaque operator
/// key such as `"GopherLab"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(String);

// NOTE: OrgId intentionally does NOT implement Default. An empty org key
// would silently collide every actor on the same snapshot slot.
impl OrgId {
    /// Creates a new [`OrgId`] from an operator-chosen key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the org key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "org:{}", self.0)
    }
}

/// Opaque identifier for a pending approval request.
///
/// The coordinator records one of these whenever elevated access is
/// requested on a document that has an owner, and clears it when the
/// underlying grant task completes. Callers should treat the contents
/// as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApprovalId(String);

impl ApprovalId {
    /// Creates an [`ApprovalId`] from an externally supplied key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the approval id for an access request subject.
    ///
    /// The same (user, document) pair always yields the same id, so a
    /// later `check_approval` action can test for a pending request
    /// without carrying extra state.
    #[must_use]
    pub fn for_subject(user: &str, document: &str) -> Self {
        Self(format!("approval:{user}@{document}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_id_idempotency_is_deterministic() {
        let a = GrantId::idempotency("bob", "secret/secretz.doc", 42);
        let b = GrantId::idempotency("bob", "secret/secretz.doc", 42);
        assert_eq!(a, b);
    }

    #[test]
    fn grant_id_idempotency_varies_by_input() {
        let base = GrantId::idempotency("bob", "secret/secretz.doc", 42);
        assert_ne!(base, GrantId::idempotency("mleow", "secret/secretz.doc", 42));
        assert_ne!(base, GrantId::idempotency("bob", "public/welcome.doc", 42));
        assert_ne!(base, GrantId::idempotency("bob", "secret/secretz.doc", 43));
    }

    #[test]
    fn grant_id_new_is_random() {
        assert_ne!(GrantId::new(), GrantId::new());
    }

    #[test]
    fn grant_id_display_prefix() {
        let id = GrantId::new();
        assert!(id.to_string().starts_with("grant:"));
    }

    #[test]
    fn org_id_roundtrip() {
        let org = OrgId::new("GopherLab");
        assert_eq!(org.as_str(), "GopherLab");
        assert_eq!(org.to_string(), "org:GopherLab");
    }

    #[test]
    fn approval_id_for_subject_is_stable() {
        assert_eq!(
            ApprovalId::for_subject("mleow", "secret/secretz.doc"),
            ApprovalId::for_subject("mleow", "secret/secretz.doc")
        );
        assert_ne!(
            ApprovalId::for_subject("mleow", "secret/secretz.doc"),
            ApprovalId::for_subject("bob", "secret/secretz.doc")
        );
    }

    #[test]
    fn serde_roundtrip() {
        let id = GrantId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: GrantId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);
    }
}
