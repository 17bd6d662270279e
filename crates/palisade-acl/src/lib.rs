//! Palisade ACL - the access-control data model
//!
//! Access control state for a node is an ordered, typed, versioned
//! list of entries ([`AccessControlList`]). Each entry
//! ([`AccessControlEntry`]) grants or denies one permission to one
//! authority, optionally narrowed by an applicability context. The
//! entry ordering is what makes single-pass deny-wins evaluation in
//! the engine correct, so this crate owns the comparator and keeps
//! lists sorted through every mutation.

#![forbid(unsafe_code)]

/// Persisted type codes for ACLs and entries
pub mod types;

/// A single access-control entry and its total order
pub mod entry;

/// Optional applicability context narrowing an entry
pub mod context;

/// The access-control list, its properties, and per-node views
pub mod list;

pub use context::{AccessControlEntryContext, ClassExpression};
pub use entry::AccessControlEntry;
pub use list::{AccessControlList, AccessControlListProperties, NodePermissionEntry};
pub use types::{AceType, AclType};
