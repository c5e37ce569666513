//! Core types for the ward access-control actor.
//!
//! This crate sits at the bottom of the workspace and carries the types
//! every other crate agrees on: identifiers, the [`Document`] record,
//! and the [`ErrorCode`] contract for error handling.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ward-types    : GrantId, OrgId, Document, ErrorCode  ◄─ HERE
//! ├─────────────────────────────────────────────────────────────┤
//! │  ward-relation : Relation, RelationTuple, RelationStore     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ward-runtime  : Coordinator, TempGrantManager,             │
//! │                  AccessChecker, DocumentRegistry            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dependencies point strictly downward; nothing in this crate knows
//! about stores, signals, or the coordinator.

pub mod document;
pub mod error;
pub mod id;

pub use document::Document;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ApprovalId, GrantId, OrgId};
