//! Relationship tuples and the relation-store client boundary.
//!
//! This crate defines the authoritative access-control fact — the
//! [`RelationTuple`] — and the [`RelationStore`] trait the runtime
//! talks through. The backing store is an external, independently
//! concurrent resource; everything here is written so that callers can
//! safely retry after partial success:
//!
//! - adding a tuple that already exists is a no-op, not an error
//! - removing a tuple that is absent is a no-op, not an error
//! - transient backend errors are retried with bounded exponential
//!   backoff via [`RetryPolicy`]
//!
//! # Crate Architecture
//!
//! ```text
//! RelationStore trait (THIS CRATE)    ← abstract client boundary
//!          │
//!          ├── MemoryRelationStore (THIS CRATE)  ← local/test backend
//!          └── remote service client             ← production backend
//! ```
//!
//! Both backends must honor the same idempotence contract; the runtime
//! cannot tell them apart.

pub mod error;
pub mod memory;
pub mod retry;
pub mod store;
pub mod tuple;

pub use error::StoreError;
pub use memory::MemoryRelationStore;
pub use retry::RetryPolicy;
pub use store::{normalize_conflict, RelationStore};
pub use tuple::{Relation, RelationTuple};
